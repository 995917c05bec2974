//! Row shapes of the way, way-tag and way-node tables

use serde::{Deserialize, Serialize};

use crate::model::{DbWayNode, EntityTag, VersionedEntity, Way};

/// One revision of a way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WayRow {
    pub id: i64,
    pub version: i32,
    /// Whether the contributing user made their edits public
    #[serde(default = "default_user_public")]
    pub user_public: bool,
}

fn default_user_public() -> bool {
    true
}

impl From<WayRow> for VersionedEntity<Way> {
    fn from(row: WayRow) -> Self {
        VersionedEntity::new(Way::new(row.id), row.version)
    }
}

/// One tag of one way revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WayTagRow {
    pub way_id: i64,
    pub version: i32,
    pub k: String,
    pub v: String,
}

impl From<WayTagRow> for VersionedEntity<EntityTag> {
    fn from(row: WayTagRow) -> Self {
        VersionedEntity::new(EntityTag::new(row.way_id, row.k, row.v), row.version)
    }
}

/// One node reference of one way revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WayNodeRow {
    pub way_id: i64,
    pub version: i32,
    pub node_id: i64,
    pub sequence_id: i32,
}

impl From<WayNodeRow> for VersionedEntity<DbWayNode> {
    fn from(row: WayNodeRow) -> Self {
        VersionedEntity::new(
            DbWayNode::new(row.way_id, row.node_id, row.sequence_id),
            row.version,
        )
    }
}
