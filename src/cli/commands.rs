//! CLI command implementations
//!
//! `assemble` loads the configuration, builds the reading pipeline and
//! streams every assembled way to the output. The pipeline is released on
//! every path, including after a failed read or write.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde_json::json;

use crate::assemble::AssemblyStats;
use crate::config::Config;
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::source::{open_way_reader, WayReader};
use crate::stream::ReleasableStream;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{write_response, write_summary, write_way};

/// Parse the command line and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run a parsed command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Assemble { config, output } => {
            let stats = assemble(&config, output.as_deref())?;
            write_summary(&stats)
        }
        Command::CheckConfig { config } => check_config(&config),
    }
}

/// Load and validate the configuration, applying its log level.
fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.log_severity()?);

    let path = config_path.display().to_string();
    let spill = config.spill.enabled.to_string();
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("path", path.as_str()), ("spill", spill.as_str())],
    );
    Ok(config)
}

/// Assemble every way described by the configuration at `config_path`.
///
/// Ways are written as JSON lines to `output`, or to stdout when `None`.
pub fn assemble(config_path: &Path, output: Option<&Path>) -> CliResult<AssemblyStats> {
    let config = load_config(config_path)?;

    let mut writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                CliError::io_error(format!("Failed to create {}: {}", path.display(), e))
            })?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let mut reader = open_way_reader(&config.input, &config.spill)?;
    let streamed = stream_ways(&mut reader, writer.as_mut());
    let released = reader.release();
    let stats = reader.stats();

    // A streaming failure is reported ahead of a release failure.
    streamed?;
    released?;
    writer.flush()?;

    Ok(stats)
}

fn stream_ways(reader: &mut WayReader, writer: &mut dyn Write) -> CliResult<()> {
    while reader.has_next()? {
        let way = reader.next()?;
        write_way(writer, &way)?;
    }
    Ok(())
}

/// Validate a configuration file without reading any input.
pub fn check_config(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;

    write_response(json!({
        "ways": config.input.ways.display().to_string(),
        "way_tags": config.input.way_tags.display().to_string(),
        "way_nodes": config.input.way_nodes.display().to_string(),
        "read_all_users": config.input.read_all_users,
        "spill_enabled": config.spill.enabled,
        "spill_compress": config.spill.compress,
        "log_level": config.log_level,
    }))
}
