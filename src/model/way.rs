//! The composite way record
//!
//! A way is built incrementally during assembly (tags and node references
//! attached in order) and handed to the consumer once complete.

use serde::{Deserialize, Serialize};

use super::EntityKey;

/// A key/value tag attached to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A reference from a way to one of its nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WayNode {
    pub node_id: i64,
}

impl WayNode {
    pub fn new(node_id: i64) -> Self {
        Self { node_id }
    }
}

/// An ordered list of node references plus a set of tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Way {
    id: i64,
    #[serde(default)]
    tags: Vec<Tag>,
    #[serde(default)]
    way_nodes: Vec<WayNode>,
}

impl Way {
    /// Creates a way with no tags and no node references.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            tags: Vec::new(),
            way_nodes: Vec::new(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Node references in attachment order.
    pub fn way_nodes(&self) -> &[WayNode] {
        &self.way_nodes
    }

    pub fn add_tag(&mut self, tag: impl Into<Tag>) {
        self.tags.push(tag.into());
    }

    /// Appends a node reference after all previously attached ones.
    pub fn add_way_node(&mut self, way_node: impl Into<WayNode>) {
        self.way_nodes.push(way_node.into());
    }

    /// Looks up a tag value by key.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }

    /// Node ids in attachment order.
    pub fn node_ids(&self) -> Vec<i64> {
        self.way_nodes.iter().map(|n| n.node_id).collect()
    }
}

impl EntityKey for Way {
    fn entity_id(&self) -> i64 {
        self.id
    }
}
