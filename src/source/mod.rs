//! Input sources and the full way reading pipeline
//!
//! Each backing table is read as a JSON-lines file sorted by
//! `(way id, version)`. `open_way_reader` wires the three tables into a
//! `WayAssembler`, routing each through a spill file first unless spilling
//! is disabled.

mod json_lines;
mod rows;

pub use json_lines::JsonLinesSource;
pub use rows::{WayNodeRow, WayRow, WayTagRow};

use std::path::Path;

use crate::assemble::WayAssembler;
use crate::config::{InputConfig, SpillConfig};
use crate::model::{DbWayNode, EntityTag, VersionedEntity, Way};
use crate::spill::{EntityTagCodec, PersistentStream, WayCodec, WayNodeCodec};
use crate::stream::{ReleasableStream, StreamResult};

/// Spill file prefix of the way stream.
pub const WAY_PREFIX: &str = "way";
/// Spill file prefix of the way tag stream.
pub const WAY_TAG_PREFIX: &str = "waytag";
/// Spill file prefix of the way node stream.
pub const WAY_NODE_PREFIX: &str = "wayseg";

pub type WaySource = JsonLinesSource<WayRow, VersionedEntity<Way>>;
pub type WayTagSource = JsonLinesSource<WayTagRow, VersionedEntity<EntityTag>>;
pub type WayNodeSource = JsonLinesSource<WayNodeRow, VersionedEntity<DbWayNode>>;

pub type BoxedStream<T> = Box<dyn ReleasableStream<Item = T>>;

/// The assembler produced by `open_way_reader`.
pub type WayReader = WayAssembler<
    BoxedStream<VersionedEntity<Way>>,
    BoxedStream<VersionedEntity<EntityTag>>,
    BoxedStream<VersionedEntity<DbWayNode>>,
>;

/// Opens the way table.
///
/// Unless `read_all_users` is set, ways whose contributor has not made
/// their edits public are left out.
pub fn way_table_source(path: &Path, read_all_users: bool) -> StreamResult<WaySource> {
    let source = WaySource::open(path)?;
    if read_all_users {
        Ok(source)
    } else {
        Ok(source.with_filter(|row: &WayRow| row.user_public))
    }
}

pub fn way_tag_source(path: &Path) -> StreamResult<WayTagSource> {
    WayTagSource::open(path)
}

pub fn way_node_source(path: &Path) -> StreamResult<WayNodeSource> {
    WayNodeSource::open(path)
}

/// Builds the complete reading pipeline for the configured tables.
pub fn open_way_reader(input: &InputConfig, spill: &SpillConfig) -> StreamResult<WayReader> {
    let ways = way_table_source(&input.ways, input.read_all_users)?;
    let tags = way_tag_source(&input.way_tags)?;
    let way_nodes = way_node_source(&input.way_nodes)?;

    if !spill.enabled {
        let ways: BoxedStream<VersionedEntity<Way>> = Box::new(ways);
        let tags: BoxedStream<VersionedEntity<EntityTag>> = Box::new(tags);
        let way_nodes: BoxedStream<VersionedEntity<DbWayNode>> = Box::new(way_nodes);
        return Ok(WayAssembler::new(ways, tags, way_nodes));
    }

    let ways: BoxedStream<VersionedEntity<Way>> = Box::new(PersistentStream::new(
        ways,
        WayCodec,
        spill.options(WAY_PREFIX),
    ));
    let tags: BoxedStream<VersionedEntity<EntityTag>> = Box::new(PersistentStream::new(
        tags,
        EntityTagCodec,
        spill.options(WAY_TAG_PREFIX),
    ));
    let way_nodes: BoxedStream<VersionedEntity<DbWayNode>> = Box::new(PersistentStream::new(
        way_nodes,
        WayNodeCodec,
        spill.options(WAY_NODE_PREFIX),
    ));
    Ok(WayAssembler::new(ways, tags, way_nodes))
}
