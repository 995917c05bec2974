//! Spill Lifecycle Tests
//!
//! Tests for the disk-backed stream decorator:
//! - every element is served back in source order through each codec
//! - the source is released once it has been spilled
//! - spill files never outlive release, however far the stream was read
//! - compressed and plain spill files behave the same
//! - on-disk corruption is detected, never silently skipped

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use waymerge::model::{DbWayNode, EntityTag, Tag, VersionedEntity, Way};
use waymerge::spill::{
    EntityTagCodec, JsonCodec, PersistentStream, SpillOptions, WayCodec, WayNodeCodec,
};
use waymerge::stream::{collect_all, MemoryStream, ReleasableStream, StreamErrorCode};

// =============================================================================
// Test Utilities
// =============================================================================

fn spill_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

fn options(dir: &Path, prefix: &str) -> SpillOptions {
    SpillOptions::new(prefix).directory(dir)
}

fn spill_files(dir: &Path) -> Vec<std::path::PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

fn sample_ways() -> Vec<VersionedEntity<Way>> {
    (1..=5)
        .map(|id| {
            let mut way = Way::new(id);
            way.add_tag(Tag::new("highway", format!("road-{}", id)));
            for n in 0..id {
                way.add_way_node(DbWayNode::new(id, id * 100 + n, n as i32));
            }
            VersionedEntity::new(way, (id % 3) as i32 + 1)
        })
        .collect()
}

// =============================================================================
// Round Trip Through Disk
// =============================================================================

#[test]
fn test_ways_served_in_source_order() {
    for compress in [true, false] {
        let dir = spill_dir();
        let ways = sample_ways();
        let stream = PersistentStream::new(
            MemoryStream::new(ways.clone()),
            WayCodec,
            options(dir.path(), "way").compress(compress),
        );

        assert_eq!(collect_all(stream).unwrap(), ways, "compress = {}", compress);
        assert!(spill_files(dir.path()).is_empty());
    }
}

#[test]
fn test_tags_and_way_nodes_served_in_source_order() {
    let tags = vec![
        VersionedEntity::new(EntityTag::new(1, "name", "Main Street"), 1),
        VersionedEntity::new(EntityTag::new(1, "", ""), 2),
        VersionedEntity::new(EntityTag::new(-4, "note", "ünïcødé"), 1),
    ];
    let way_nodes = vec![
        VersionedEntity::new(DbWayNode::new(1, 10, 2), 1),
        VersionedEntity::new(DbWayNode::new(1, 11, 0), 1),
        VersionedEntity::new(DbWayNode::new(2, i64::MAX, i32::MAX), 7),
    ];

    for compress in [true, false] {
        let dir = spill_dir();
        let tag_stream = PersistentStream::new(
            MemoryStream::new(tags.clone()),
            EntityTagCodec,
            options(dir.path(), "waytag").compress(compress),
        );
        let node_stream = PersistentStream::new(
            MemoryStream::new(way_nodes.clone()),
            WayNodeCodec,
            options(dir.path(), "wayseg").compress(compress),
        );

        assert_eq!(collect_all(tag_stream).unwrap(), tags, "compress = {}", compress);
        assert_eq!(collect_all(node_stream).unwrap(), way_nodes, "compress = {}", compress);
        assert!(spill_files(dir.path()).is_empty());
    }
}

#[test]
fn test_compressed_file_is_smaller_on_disk() {
    // Many identical tags compress well.
    let tags: Vec<_> = (0..500)
        .map(|i| VersionedEntity::new(EntityTag::new(i, "highway", "residential"), 1))
        .collect();

    let mut sizes = Vec::new();
    for compress in [true, false] {
        let dir = spill_dir();
        let mut stream = PersistentStream::new(
            MemoryStream::new(tags.clone()),
            EntityTagCodec,
            options(dir.path(), "waytag").compress(compress),
        );
        assert!(stream.has_next().unwrap());

        let path = spill_files(dir.path()).remove(0);
        sizes.push(fs::metadata(&path).unwrap().len());
        stream.release().unwrap();
    }

    assert!(sizes[0] < sizes[1], "compressed {} vs plain {}", sizes[0], sizes[1]);
}

#[test]
fn test_json_codec_serves_arbitrary_items() {
    let items = vec!["alpha".to_string(), String::new(), "gamma".to_string()];
    for compress in [true, false] {
        let dir = spill_dir();
        let stream = PersistentStream::new(
            MemoryStream::new(items.clone()),
            JsonCodec::<String>::new(),
            options(dir.path(), "json").compress(compress),
        );

        assert_eq!(collect_all(stream).unwrap(), items, "compress = {}", compress);
    }
}

// =============================================================================
// Source and File Lifecycle
// =============================================================================

#[test]
fn test_source_released_once_spilled() {
    let dir = spill_dir();
    let source = MemoryStream::new(sample_ways());
    let releases = source.release_count_handle();
    let mut stream = PersistentStream::new(source, WayCodec, options(dir.path(), "way"));

    assert!(stream.holds_source());
    assert_eq!(spill_files(dir.path()).len(), 0);

    assert!(stream.has_next().unwrap());
    assert!(!stream.holds_source());
    assert_eq!(releases.get(), 1);
    assert_eq!(stream.spilled_count(), 5);
    assert_eq!(spill_files(dir.path()).len(), 1);

    stream.release().unwrap();
    assert_eq!(releases.get(), 1);
}

#[test]
fn test_spill_file_name_uses_prefix() {
    let dir = spill_dir();
    let mut stream = PersistentStream::new(
        MemoryStream::new(sample_ways()),
        WayCodec,
        options(dir.path(), "wayseg"),
    );
    stream.has_next().unwrap();

    let files = spill_files(dir.path());
    let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("wayseg"));
    assert!(name.ends_with(".spill"));
    stream.release().unwrap();
}

#[test]
fn test_partial_consumption_still_deletes_file() {
    let dir = spill_dir();
    let mut stream = PersistentStream::new(
        MemoryStream::new(sample_ways()),
        WayCodec,
        options(dir.path(), "way"),
    );

    assert_eq!(stream.next().unwrap().entity().id(), 1);
    assert_eq!(stream.next().unwrap().entity().id(), 2);
    assert_eq!(spill_files(dir.path()).len(), 1);

    stream.release().unwrap();
    assert!(spill_files(dir.path()).is_empty());

    assert!(!stream.has_next().unwrap());
    assert!(stream.next().unwrap_err().is_exhausted());
    stream.release().unwrap();
}

#[test]
fn test_release_before_access_releases_source() {
    let dir = spill_dir();
    let source = MemoryStream::new(sample_ways());
    let releases = source.release_count_handle();
    let mut stream = PersistentStream::new(source, WayCodec, options(dir.path(), "way"));

    stream.release().unwrap();

    assert_eq!(releases.get(), 1);
    assert!(spill_files(dir.path()).is_empty());
    assert!(!stream.has_next().unwrap());
}

#[test]
fn test_empty_source_yields_nothing() {
    let dir = spill_dir();
    let mut stream = PersistentStream::new(
        MemoryStream::new(Vec::<VersionedEntity<Way>>::new()),
        WayCodec,
        options(dir.path(), "way"),
    );

    assert!(!stream.has_next().unwrap());
    assert!(stream.next().unwrap_err().is_exhausted());
    stream.release().unwrap();
    assert!(spill_files(dir.path()).is_empty());
}

// =============================================================================
// Failure Handling
// =============================================================================

#[test]
fn test_capacity_limit_fails_and_leaves_no_file() {
    let dir = spill_dir();
    let mut stream = PersistentStream::new(
        MemoryStream::new(sample_ways()),
        WayCodec,
        options(dir.path(), "way").max_bytes(64),
    );

    let err = stream.has_next().unwrap_err();
    assert_eq!(err.code(), StreamErrorCode::SpillCapacityExceeded);
    assert!(spill_files(dir.path()).is_empty());

    // The stream does not resume and keeps reporting the same failure.
    let again = stream.has_next().unwrap_err();
    assert_eq!(again.code(), StreamErrorCode::SpillCapacityExceeded);
    let again = stream.next().unwrap_err();
    assert_eq!(again.code(), StreamErrorCode::SpillCapacityExceeded);
    stream.release().unwrap();
}

/// Spills `ways`, applies `corrupt` to the file, then reads until failure.
fn read_after_corruption(compress: bool, corrupt: impl FnOnce(&mut Vec<u8>)) {
    let dir = spill_dir();
    let ways: Vec<_> = (0..20).flat_map(|_| sample_ways()).collect();
    let mut stream = PersistentStream::new(
        MemoryStream::new(ways),
        WayCodec,
        options(dir.path(), "way").compress(compress),
    );
    assert!(stream.has_next().unwrap());

    let path = spill_files(dir.path()).remove(0);
    let mut contents = fs::read(&path).unwrap();
    corrupt(&mut contents);
    fs::write(&path, contents).unwrap();

    let mut result = Ok(());
    while stream.has_next().unwrap() {
        if let Err(e) = stream.next() {
            result = Err(e);
            break;
        }
    }

    let err = result.unwrap_err();
    assert_eq!(err.code(), StreamErrorCode::SpillCorruption);
    assert!(err.is_fatal());

    stream.release().unwrap();
    assert!(spill_files(dir.path()).is_empty());
}

#[test]
fn test_corrupted_spill_file_is_detected() {
    // Flip the trailing checksum byte of the last frame.
    read_after_corruption(false, |contents| {
        let last = contents.len() - 1;
        contents[last] ^= 0xFF;
    });
}

#[test]
fn test_corrupted_compressed_spill_file_is_detected() {
    read_after_corruption(true, |contents| {
        let mid = contents.len() / 2;
        contents[mid] ^= 0xFF;
    });
}
