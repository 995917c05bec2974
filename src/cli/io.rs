//! JSON output handling for CLI
//!
//! - One assembled way per line
//! - Summary and errors as single JSON objects
//! - UTF-8 only

use std::io::{self, Write};

use serde_json::{json, Value};

use super::errors::CliResult;
use crate::assemble::AssemblyStats;
use crate::model::{VersionedEntity, Way};

/// JSON form of an assembled way.
pub fn way_to_json(way: &VersionedEntity<Way>) -> Value {
    let entity = way.entity();
    let tags: Vec<Value> = entity
        .tags()
        .iter()
        .map(|t| json!({ "k": t.key, "v": t.value }))
        .collect();

    json!({
        "id": entity.id(),
        "version": way.version(),
        "tags": tags,
        "nodes": entity.node_ids(),
    })
}

/// Write one way as a JSON line
pub fn write_way<W: Write + ?Sized>(writer: &mut W, way: &VersionedEntity<Way>) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, &way_to_json(way))?;
    writeln!(writer)?;
    Ok(())
}

/// Write the assembly summary to stderr
pub fn write_summary(stats: &AssemblyStats) -> CliResult<()> {
    let response = json!({
        "status": "ok",
        "data": stats,
    });

    let mut stderr = io::stderr();
    serde_json::to_writer(&mut stderr, &response)?;
    writeln!(stderr)?;
    stderr.flush()?;

    Ok(())
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = json!({
        "status": "ok",
        "data": data
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
