//! Domain records flowing through the assembly pipeline
//!
//! Every stream element is a `VersionedEntity<T>`: one revision of one
//! logical entity. Streams are ordered by `(entity id, version)` ascending.

mod attachment;
mod way;

pub use attachment::{DbWayNode, EntityTag};
pub use way::{Tag, Way, WayNode};

use serde::{Deserialize, Serialize};

/// Anything that belongs to (or is) an entity with a numeric identifier.
///
/// For a primary record this is its own id; for an attachment record it is
/// the id of the owning entity.
pub trait EntityKey {
    fn entity_id(&self) -> i64;
}

/// A single revision of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedEntity<T> {
    /// The entity (or attachment) payload
    pub entity: T,
    /// Monotonic revision number of the owning entity
    pub version: i32,
}

impl<T> VersionedEntity<T> {
    pub fn new(entity: T, version: i32) -> Self {
        Self { entity, version }
    }

    /// Returns the wrapped entity.
    pub fn entity(&self) -> &T {
        &self.entity
    }

    /// Returns the revision number.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Consumes the wrapper, yielding the entity.
    pub fn into_entity(self) -> T {
        self.entity
    }
}

impl<T: EntityKey> VersionedEntity<T> {
    /// The `(entity id, version)` merge key. Tuple ordering is the
    /// lexicographic stream order.
    #[inline]
    pub fn key(&self) -> (i64, i32) {
        (self.entity.entity_id(), self.version)
    }
}
