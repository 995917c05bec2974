//! Way assembly
//!
//! Combines the way, way-tag and way-node streams into complete ways.
//!
//! # Preconditions
//!
//! All three streams are sorted ascending by `(way id, version)`. Nothing
//! here sorts the primary stream or checks that node references resolve.
//!
//! # Guarantees
//!
//! - One output way per primary record, in primary order
//! - Each way carries exactly the tags and node references with its own
//!   `(id, version)`
//! - Node references are ordered by sequence number
//! - Attachment rows for a version that never appears in the primary
//!   stream are discarded unattached

mod assembler;
mod ordering;
mod stats;

pub use assembler::WayAssembler;
pub use ordering::member_order;
pub use stats::AssemblyStats;
