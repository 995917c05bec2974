//! waymerge - assembles versioned ways from sorted way, tag and node tables
//!
//! The three tables are read as independent streams sorted by
//! `(way id, version)` and merge-joined into fully populated ways.

pub mod assemble;
pub mod cli;
pub mod config;
pub mod model;
pub mod observability;
pub mod source;
pub mod spill;
pub mod stream;
