//! Counters kept while assembling ways

use serde::Serialize;

/// Running totals for one assembler instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyStats {
    /// Ways handed to the consumer
    pub ways_emitted: u64,
    /// Tags attached to an emitted way
    pub tags_attached: u64,
    /// Tags discarded because they trailed the current way version
    pub tags_skipped: u64,
    /// Node references attached to an emitted way
    pub way_nodes_attached: u64,
    /// Node references discarded because they trailed the current way version
    pub way_nodes_skipped: u64,
}

impl AssemblyStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attachment rows read from either attachment stream.
    pub fn attachments_read(&self) -> u64 {
        self.tags_attached + self.tags_skipped + self.way_nodes_attached + self.way_nodes_skipped
    }
}
