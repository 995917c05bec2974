//! Attachment records as read from the tag and way-node tables
//!
//! Both carry the id of the owning way so they can be merged against the
//! primary stream. Once attached they are stripped down to `Tag` and
//! `WayNode`.

use serde::{Deserialize, Serialize};

use super::way::{Tag, WayNode};
use super::EntityKey;

/// A tag row belonging to one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTag {
    pub entity_id: i64,
    pub key: String,
    pub value: String,
}

impl EntityTag {
    pub fn new(entity_id: i64, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            entity_id,
            key: key.into(),
            value: value.into(),
        }
    }
}

impl EntityKey for EntityTag {
    fn entity_id(&self) -> i64 {
        self.entity_id
    }
}

impl From<EntityTag> for Tag {
    fn from(tag: EntityTag) -> Self {
        Tag {
            key: tag.key,
            value: tag.value,
        }
    }
}

/// A way-node row: one node reference of one way, with its position.
///
/// The table is sorted by way id and version only, so `sequence_id` may
/// arrive out of order within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbWayNode {
    pub way_id: i64,
    pub node_id: i64,
    pub sequence_id: i32,
}

impl DbWayNode {
    pub fn new(way_id: i64, node_id: i64, sequence_id: i32) -> Self {
        Self {
            way_id,
            node_id,
            sequence_id,
        }
    }
}

impl EntityKey for DbWayNode {
    fn entity_id(&self) -> i64 {
        self.way_id
    }
}

impl From<DbWayNode> for WayNode {
    fn from(node: DbWayNode) -> Self {
        WayNode {
            node_id: node.node_id,
        }
    }
}
