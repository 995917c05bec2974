//! CLI argument definitions using clap
//!
//! Commands:
//! - waymerge assemble --config <path> [--output <path>]
//! - waymerge check-config --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// waymerge - assemble versioned ways from sorted way, tag and node tables
#[derive(Parser, Debug)]
#[command(name = "waymerge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Assemble ways and write them as JSON lines
    Assemble {
        /// Path to configuration file
        #[arg(long, default_value = "./waymerge.json")]
        config: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate a configuration file and exit
    CheckConfig {
        /// Path to configuration file
        #[arg(long, default_value = "./waymerge.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
