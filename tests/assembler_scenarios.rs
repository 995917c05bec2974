//! Way Assembly Tests
//!
//! Exercises the merge join over in-memory streams:
//! - attachment of exactly matching tags and node references
//! - node reference ordering by sequence number
//! - stale attachment skipping and future attachment retention
//! - exhaustion and repeated release

use std::collections::BTreeSet;
use std::io;

use proptest::prelude::*;
use waymerge::assemble::WayAssembler;
use waymerge::model::{DbWayNode, EntityTag, VersionedEntity, Way};
use waymerge::stream::{
    collect_all, MemoryStream, ReleasableStream, StreamError, StreamErrorCode, StreamResult,
};

// =============================================================================
// Test Utilities
// =============================================================================

fn way(id: i64, version: i32) -> VersionedEntity<Way> {
    VersionedEntity::new(Way::new(id), version)
}

fn tag(id: i64, version: i32, k: &str, v: &str) -> VersionedEntity<EntityTag> {
    VersionedEntity::new(EntityTag::new(id, k, v), version)
}

fn node(id: i64, version: i32, node_id: i64, seq: i32) -> VersionedEntity<DbWayNode> {
    VersionedEntity::new(DbWayNode::new(id, node_id, seq), version)
}

fn tag_pairs(way: &VersionedEntity<Way>) -> Vec<(String, String)> {
    way.entity()
        .tags()
        .iter()
        .map(|t| (t.key.clone(), t.value.clone()))
        .collect()
}

fn memory_assembler(
    ways: Vec<VersionedEntity<Way>>,
    tags: Vec<VersionedEntity<EntityTag>>,
    way_nodes: Vec<VersionedEntity<DbWayNode>>,
) -> WayAssembler<
    MemoryStream<VersionedEntity<Way>>,
    MemoryStream<VersionedEntity<EntityTag>>,
    MemoryStream<VersionedEntity<DbWayNode>>,
> {
    WayAssembler::new(
        MemoryStream::new(ways),
        MemoryStream::new(tags),
        MemoryStream::new(way_nodes),
    )
}

/// Stream whose release always fails.
struct FailingRelease<T> {
    inner: MemoryStream<T>,
    label: &'static str,
}

impl<T> ReleasableStream for FailingRelease<T> {
    type Item = T;

    fn has_next(&mut self) -> StreamResult<bool> {
        self.inner.has_next()
    }

    fn next(&mut self) -> StreamResult<T> {
        self.inner.next()
    }

    fn release(&mut self) -> StreamResult<()> {
        self.inner.release()?;
        Err(StreamError::release_failed(
            format!("Failed to close {}", self.label),
            io::Error::new(io::ErrorKind::Other, "device busy"),
        ))
    }
}

// =============================================================================
// Basic Assembly
// =============================================================================

#[test]
fn test_single_way_gets_tag_and_sorted_nodes() {
    let mut assembler = memory_assembler(
        vec![way(1, 1)],
        vec![tag(1, 1, "k", "v")],
        vec![node(1, 1, 5, 2), node(1, 1, 9, 1)],
    );

    let assembled = assembler.next().unwrap();
    assert_eq!(assembled.entity().id(), 1);
    assert_eq!(assembled.version(), 1);
    assert_eq!(tag_pairs(&assembled), vec![("k".into(), "v".into())]);
    assert_eq!(assembled.entity().node_ids(), vec![9, 5]);

    assert!(!assembler.has_next().unwrap());
    assembler.release().unwrap();
}

#[test]
fn test_each_version_gets_only_its_own_tags() {
    let mut assembler = memory_assembler(
        vec![way(1, 1), way(1, 2)],
        vec![tag(1, 1, "a", "x"), tag(1, 2, "b", "y")],
        Vec::new(),
    );

    let v1 = assembler.next().unwrap();
    let v2 = assembler.next().unwrap();

    assert_eq!(tag_pairs(&v1), vec![("a".into(), "x".into())]);
    assert_eq!(tag_pairs(&v2), vec![("b".into(), "y".into())]);
    assembler.release().unwrap();
}

#[test]
fn test_lower_id_tags_are_skipped() {
    let mut assembler = memory_assembler(
        vec![way(2, 1)],
        vec![tag(1, 1, "a", "x"), tag(1, 3, "b", "y")],
        Vec::new(),
    );

    let assembled = assembler.next().unwrap();
    assert!(assembled.entity().tags().is_empty());

    let stats = assembler.stats();
    assert_eq!(stats.tags_skipped, 2);
    assert_eq!(stats.tags_attached, 0);
}

#[test]
fn test_future_version_nodes_are_not_attached() {
    let mut assembler = memory_assembler(vec![way(1, 1)], Vec::new(), vec![node(1, 2, 3, 1)]);

    let assembled = assembler.next().unwrap();
    assert!(assembled.entity().way_nodes().is_empty());
    assert!(!assembler.has_next().unwrap());

    let stats = assembler.stats();
    assert_eq!(stats.way_nodes_attached, 0);
    assert_eq!(stats.way_nodes_skipped, 0);
    assembler.release().unwrap();
}

#[test]
fn test_future_version_nodes_wait_for_their_way() {
    let mut assembler = memory_assembler(
        vec![way(1, 1), way(1, 2)],
        Vec::new(),
        vec![node(1, 2, 3, 1)],
    );

    assert!(assembler.next().unwrap().entity().way_nodes().is_empty());
    assert_eq!(assembler.next().unwrap().entity().node_ids(), vec![3]);
}

#[test]
fn test_empty_primary_stream() {
    let mut assembler = memory_assembler(
        Vec::new(),
        vec![tag(1, 1, "k", "v")],
        vec![node(1, 1, 1, 1)],
    );

    assert!(!assembler.has_next().unwrap());
    let err = assembler.next().unwrap_err();
    assert_eq!(err.code(), StreamErrorCode::IterationExhausted);
    assembler.release().unwrap();
}

// =============================================================================
// Output Order and Completeness
// =============================================================================

#[test]
fn test_output_follows_primary_order() {
    let ways = vec![way(1, 1), way(1, 3), way(4, 1), way(7, 2), way(7, 5)];
    let expected: Vec<(i64, i32)> = ways.iter().map(|w| w.key()).collect();

    let assembled = collect_all(memory_assembler(ways, Vec::new(), Vec::new())).unwrap();
    let keys: Vec<(i64, i32)> = assembled.iter().map(|w| w.key()).collect();

    assert_eq!(keys, expected);
}

#[test]
fn test_nodes_sorted_regardless_of_arrival_order() {
    let mut assembler = memory_assembler(
        vec![way(3, 1)],
        Vec::new(),
        vec![
            node(3, 1, 30, 4),
            node(3, 1, 10, 0),
            node(3, 1, 40, 3),
            node(3, 1, 20, 1),
        ],
    );

    assert_eq!(assembler.next().unwrap().entity().node_ids(), vec![10, 20, 40, 30]);
}

#[test]
fn test_attachments_for_missing_ways_never_leak() {
    // Way 2 is absent from the primary stream, so its rows go nowhere.
    let assembled = collect_all(memory_assembler(
        vec![way(1, 1), way(3, 1)],
        vec![tag(1, 1, "a", "1"), tag(2, 1, "b", "2"), tag(3, 1, "c", "3")],
        vec![node(2, 1, 200, 0), node(3, 1, 300, 0)],
    ))
    .unwrap();

    assert_eq!(tag_pairs(&assembled[0]), vec![("a".into(), "1".into())]);
    assert!(assembled[0].entity().way_nodes().is_empty());
    assert_eq!(tag_pairs(&assembled[1]), vec![("c".into(), "3".into())]);
    assert_eq!(assembled[1].entity().node_ids(), vec![300]);
}

// =============================================================================
// Exhaustion and Release
// =============================================================================

#[test]
fn test_next_after_exhaustion_keeps_failing() {
    let mut assembler = memory_assembler(vec![way(1, 1)], Vec::new(), Vec::new());
    assembler.next().unwrap();

    assert!(!assembler.has_next().unwrap());
    assert!(assembler.next().unwrap_err().is_exhausted());
    assert!(assembler.next().unwrap_err().is_exhausted());
}

#[test]
fn test_repeated_release_reaches_every_stream() {
    let ways = MemoryStream::new(vec![way(1, 1)]);
    let tags = MemoryStream::new(vec![tag(1, 1, "k", "v")]);
    let way_nodes = MemoryStream::new(vec![node(1, 1, 1, 0)]);
    let counters = [
        ways.release_count_handle(),
        tags.release_count_handle(),
        way_nodes.release_count_handle(),
    ];

    let mut assembler = WayAssembler::new(ways, tags, way_nodes);
    assembler.release().unwrap();
    assembler.release().unwrap();

    for counter in &counters {
        assert_eq!(counter.get(), 2);
    }
}

#[test]
fn test_release_failures_are_aggregated() {
    let ways = MemoryStream::new(vec![way(1, 1)]);
    let way_counter = ways.release_count_handle();
    let tags = FailingRelease {
        inner: MemoryStream::new(Vec::<VersionedEntity<EntityTag>>::new()),
        label: "way tags",
    };
    let way_nodes = FailingRelease {
        inner: MemoryStream::new(Vec::<VersionedEntity<DbWayNode>>::new()),
        label: "way nodes",
    };

    let mut assembler = WayAssembler::new(ways, tags, way_nodes);
    let err = assembler.release().unwrap_err();

    assert_eq!(err.code(), StreamErrorCode::ResourceReleaseFailure);
    assert_eq!(err.failures().len(), 2);
    assert!(err.failures()[0].message().contains("way tags"));
    assert!(err.failures()[1].message().contains("way nodes"));
    assert_eq!(way_counter.get(), 1);

    // A second release still attempts every stream.
    let err = assembler.release().unwrap_err();
    assert_eq!(err.failures().len(), 2);
    assert_eq!(way_counter.get(), 2);
}

#[test]
fn test_single_release_failure_is_reported() {
    let ways = FailingRelease {
        inner: MemoryStream::new(vec![way(1, 1)]),
        label: "ways",
    };
    let mut assembler = WayAssembler::new(
        ways,
        MemoryStream::new(Vec::<VersionedEntity<EntityTag>>::new()),
        MemoryStream::new(Vec::<VersionedEntity<DbWayNode>>::new()),
    );

    assert_eq!(assembler.next().unwrap().entity().id(), 1);
    let err = assembler.release().unwrap_err();
    assert_eq!(err.code(), StreamErrorCode::ResourceReleaseFailure);
    assert_eq!(err.failures().len(), 1);
}

// =============================================================================
// Comparison Against A Naive Join
// =============================================================================

type TagRow = (i64, i32, u8);
type NodeRow = (i64, i32, i64, i32);

struct Expected {
    key: (i64, i32),
    tags: Vec<(String, String)>,
    node_ids: Vec<i64>,
}

/// Joins by scanning every attachment row for every way.
fn naive_join(ways: &BTreeSet<(i64, i32)>, tags: &[TagRow], nodes: &[NodeRow]) -> Vec<Expected> {
    ways.iter()
        .map(|&(id, version)| {
            let tags = tags
                .iter()
                .filter(|t| (t.0, t.1) == (id, version))
                .map(|t| (format!("k{}", t.2), format!("v{}", t.2)))
                .collect();
            let mut group: Vec<&NodeRow> = nodes
                .iter()
                .filter(|n| (n.0, n.1) == (id, version))
                .collect();
            group.sort_by_key(|n| n.3);
            Expected {
                key: (id, version),
                tags,
                node_ids: group.iter().map(|n| n.2).collect(),
            }
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_assembly_matches_naive_join(
        ways in proptest::collection::btree_set((0i64..8, 1i32..4), 0..12),
        mut tags in proptest::collection::vec((0i64..8, 1i32..4, 0u8..10), 0..40),
        mut nodes in proptest::collection::vec((0i64..8, 1i32..4, 0i64..1000, 0i32..20), 0..40),
    ) {
        // Both attachment tables are sorted by owner key only.
        tags.sort_by_key(|t| (t.0, t.1));
        nodes.sort_by_key(|n| (n.0, n.1));

        let expected = naive_join(&ways, &tags, &nodes);

        let assembled = collect_all(memory_assembler(
            ways.iter().map(|&(id, v)| way(id, v)).collect(),
            tags.iter()
                .map(|t| tag(t.0, t.1, &format!("k{}", t.2), &format!("v{}", t.2)))
                .collect(),
            nodes.iter().map(|n| node(n.0, n.1, n.2, n.3)).collect(),
        ))
        .unwrap();

        prop_assert_eq!(assembled.len(), expected.len());
        for (actual, want) in assembled.iter().zip(&expected) {
            prop_assert_eq!(actual.key(), want.key);
            prop_assert_eq!(&tag_pairs(actual), &want.tags);
            prop_assert_eq!(&actual.entity().node_ids(), &want.node_ids);
        }
    }
}
