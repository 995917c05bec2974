//! CLI module for waymerge
//!
//! Provides command-line interface for:
//! - assemble: Stream assembled ways as JSON lines
//! - check-config: Validate a configuration file

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{assemble, check_config, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{way_to_json, write_response, write_way};
