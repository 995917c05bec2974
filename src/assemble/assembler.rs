//! Three-way merge join producing fully populated ways
//!
//! The primary way stream and both attachment streams are sorted by
//! `(way id, version)`. For each primary record the attachment streams are
//! first advanced past every row that sorts before the record's key, then
//! every row with exactly that key is attached. Rows with a later key stay
//! in the lookahead for a later primary record.
//!
//! Way-node rows are sorted by way only, so each group is re-sorted by
//! sequence number before attaching.

use super::ordering::member_order;
use super::stats::AssemblyStats;
use crate::model::{DbWayNode, EntityKey, EntityTag, VersionedEntity, Way};
use crate::observability::{log_event, log_event_with_fields, Event, Logger, Severity};
use crate::stream::{PeekableStream, ReleasableStream, StreamError, StreamResult};

/// Discards every row whose key sorts strictly before `key`.
///
/// Returns the number of rows discarded.
fn skip_stale<S, E>(stream: &mut PeekableStream<S>, key: (i64, i32)) -> StreamResult<u64>
where
    S: ReleasableStream<Item = VersionedEntity<E>>,
    E: EntityKey,
{
    let mut skipped = 0;
    while stream.next_if(|row| row.key() < key)?.is_some() {
        skipped += 1;
    }
    Ok(skipped)
}

/// Joins ways with their tags and node references.
///
/// Output order is exactly the primary stream's order. The assembler owns
/// all three streams and releases them together.
pub struct WayAssembler<W, T, N>
where
    W: ReleasableStream<Item = VersionedEntity<Way>>,
    T: ReleasableStream<Item = VersionedEntity<EntityTag>>,
    N: ReleasableStream<Item = VersionedEntity<DbWayNode>>,
{
    ways: W,
    tags: PeekableStream<T>,
    way_nodes: PeekableStream<N>,
    /// Assembled record awaiting delivery
    primed: Option<VersionedEntity<Way>>,
    /// Reused per-group buffer for re-sorting node references
    scratch: Vec<DbWayNode>,
    stats: AssemblyStats,
    released: bool,
}

impl<W, T, N> WayAssembler<W, T, N>
where
    W: ReleasableStream<Item = VersionedEntity<Way>>,
    T: ReleasableStream<Item = VersionedEntity<EntityTag>>,
    N: ReleasableStream<Item = VersionedEntity<DbWayNode>>,
{
    /// Creates an assembler over the three sorted streams.
    ///
    /// The attachment streams are wrapped for lookahead here.
    pub fn new(ways: W, tags: T, way_nodes: N) -> Self {
        log_event(Event::AssemblyBegin);
        Self {
            ways,
            tags: PeekableStream::new(tags),
            way_nodes: PeekableStream::new(way_nodes),
            primed: None,
            scratch: Vec::new(),
            stats: AssemblyStats::new(),
            released: false,
        }
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> AssemblyStats {
        self.stats
    }

    /// Assembles the next way if none is primed.
    fn advance(&mut self) -> StreamResult<()> {
        if self.primed.is_some() || self.released || !self.ways.has_next()? {
            return Ok(());
        }

        let mut way_history = self.ways.next()?;
        let key = way_history.key();

        self.stats.tags_skipped += skip_stale(&mut self.tags, key)?;
        while let Some(tag) = self.tags.next_if(|row| row.key() == key)? {
            way_history.entity.add_tag(tag.into_entity());
            self.stats.tags_attached += 1;
        }

        self.stats.way_nodes_skipped += skip_stale(&mut self.way_nodes, key)?;
        self.scratch.clear();
        while let Some(node) = self.way_nodes.next_if(|row| row.key() == key)? {
            self.scratch.push(node.into_entity());
        }
        // The way-node table is not sorted by sequence number.
        self.scratch.sort_by(member_order);
        self.stats.way_nodes_attached += self.scratch.len() as u64;
        for node in self.scratch.drain(..) {
            way_history.entity.add_way_node(node);
        }

        self.primed = Some(way_history);
        Ok(())
    }
}

impl<W, T, N> ReleasableStream for WayAssembler<W, T, N>
where
    W: ReleasableStream<Item = VersionedEntity<Way>>,
    T: ReleasableStream<Item = VersionedEntity<EntityTag>>,
    N: ReleasableStream<Item = VersionedEntity<DbWayNode>>,
{
    type Item = VersionedEntity<Way>;

    fn has_next(&mut self) -> StreamResult<bool> {
        self.advance()?;
        Ok(self.primed.is_some())
    }

    fn next(&mut self) -> StreamResult<VersionedEntity<Way>> {
        if !self.has_next()? {
            return Err(StreamError::exhausted("No more ways to assemble"));
        }
        let way = self
            .primed
            .take()
            .ok_or_else(|| StreamError::exhausted("No more ways to assemble"))?;
        self.stats.ways_emitted += 1;

        if Logger::enabled(Severity::Trace) {
            let id = way.entity().id().to_string();
            let version = way.version().to_string();
            let tags = way.entity().tags().len().to_string();
            let nodes = way.entity().way_nodes().len().to_string();
            Logger::trace(
                Event::WayAssembled.as_str(),
                &[
                    ("id", id.as_str()),
                    ("version", version.as_str()),
                    ("tags", tags.as_str()),
                    ("way_nodes", nodes.as_str()),
                ],
            );
        }
        Ok(way)
    }

    /// Releases the way stream, then the tag stream, then the way-node
    /// stream. Every release is attempted even if an earlier one fails.
    fn release(&mut self) -> StreamResult<()> {
        self.primed = None;
        let mut failures = Vec::new();

        let results = [
            ("ways", self.ways.release()),
            ("way_tags", self.tags.release()),
            ("way_nodes", self.way_nodes.release()),
        ];
        for (stream, result) in results {
            if let Err(e) = result {
                Logger::error(
                    Event::StreamReleaseFailed.as_str(),
                    &[("stream", stream), ("error", e.to_string().as_str())],
                );
                failures.push(e);
            }
        }

        if !self.released {
            self.released = true;
            let emitted = self.stats.ways_emitted.to_string();
            let stale = (self.stats.tags_skipped + self.stats.way_nodes_skipped).to_string();
            log_event_with_fields(
                Event::AssemblyComplete,
                &[("ways", emitted.as_str()), ("stale_attachments", stale.as_str())],
            );
        }

        match StreamError::aggregate_release("Failed to release way assembler streams", failures) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
