//! Spill storage for forward-only streams
//!
//! Attachment tables can be far larger than memory. Wrapping a source in a
//! `PersistentStream` moves its elements into a temporary file of
//! checksummed frames and serves them back in order.
//!
//! # Guarantees
//!
//! - Elements come back in exactly the order the source produced them
//! - The source is traversed once and released as soon as it is drained
//! - Every frame is checksum-verified on read; mismatch is fatal
//! - Spill files are gzip-compressed unless `compress` is turned off
//! - `release()` deletes the spill file whether or not iteration finished

mod checksum;
mod codec;
mod file;
mod frame;
mod persistent;

pub use checksum::compute_checksum;
pub use codec::{EntityTagCodec, JsonCodec, SpillCodec, WayCodec, WayNodeCodec};
pub use file::SpillFile;
pub use persistent::PersistentStream;

use std::path::PathBuf;

/// Where and how a spill file is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpillOptions {
    /// Directory for the spill file; the OS temp dir when `None`
    pub directory: Option<PathBuf>,
    /// File name prefix, e.g. `waytag`
    pub prefix: String,
    /// Upper bound on uncompressed frame bytes
    pub max_bytes: Option<u64>,
    /// Gzip the frame sequence on disk
    pub compress: bool,
}

impl SpillOptions {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            directory: None,
            prefix: prefix.into(),
            max_bytes: None,
            compress: true,
        }
    }

    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}
