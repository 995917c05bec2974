//! Element encodings for spill frames
//!
//! A `SpillCodec<T>` turns one stream element into a frame body and back.
//! The binary codecs use a fixed little-endian layout with length-prefixed
//! strings; `JsonCodec` works for any serde type.

use std::io::{self, Cursor, Read};
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::model::{DbWayNode, EntityTag, Tag, VersionedEntity, Way, WayNode};
use crate::stream::{StreamError, StreamResult};

/// Binary encode/decode pair for one element type.
pub trait SpillCodec<T> {
    /// Appends the encoding of `value` to `buf`.
    fn encode(&self, value: &T, buf: &mut Vec<u8>) -> StreamResult<()>;

    /// Decodes one element from a complete frame body.
    fn decode(&self, body: &[u8]) -> StreamResult<T>;
}

/// Codec backed by `serde_json`.
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serialize + DeserializeOwned> SpillCodec<T> for JsonCodec<T> {
    fn encode(&self, value: &T, buf: &mut Vec<u8>) -> StreamResult<()> {
        serde_json::to_writer(buf, value)
            .map_err(|e| StreamError::codec_with_source("JSON encode failed", e))
    }

    fn decode(&self, body: &[u8]) -> StreamResult<T> {
        serde_json::from_slice(body)
            .map_err(|e| StreamError::codec_with_source("JSON decode failed", e))
    }
}

fn put_string(buf: &mut Vec<u8>, s: &str) -> StreamResult<()> {
    let len = u32::try_from(s.len())
        .map_err(|_| StreamError::codec(format!("String too long: {} bytes", s.len())))?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

fn put_count(buf: &mut Vec<u8>, count: usize) -> StreamResult<()> {
    let count = u32::try_from(count)
        .map_err(|_| StreamError::codec(format!("Collection too large: {}", count)))?;
    buf.extend_from_slice(&count.to_le_bytes());
    Ok(())
}

fn truncated(e: io::Error) -> StreamError {
    StreamError::codec_with_source("Truncated element body", e)
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> StreamResult<u32> {
    let mut b = [0u8; 4];
    cursor.read_exact(&mut b).map_err(truncated)?;
    Ok(u32::from_le_bytes(b))
}

fn read_i32(cursor: &mut Cursor<&[u8]>) -> StreamResult<i32> {
    let mut b = [0u8; 4];
    cursor.read_exact(&mut b).map_err(truncated)?;
    Ok(i32::from_le_bytes(b))
}

fn read_i64(cursor: &mut Cursor<&[u8]>) -> StreamResult<i64> {
    let mut b = [0u8; 8];
    cursor.read_exact(&mut b).map_err(truncated)?;
    Ok(i64::from_le_bytes(b))
}

fn read_string(cursor: &mut Cursor<&[u8]>) -> StreamResult<String> {
    let len = read_u32(cursor)? as usize;
    let remaining = cursor.get_ref().len() - cursor.position() as usize;
    if len > remaining {
        return Err(StreamError::codec(format!(
            "String length {} exceeds remaining body {}",
            len, remaining
        )));
    }
    let mut buf = vec![0u8; len];
    cursor.read_exact(&mut buf).map_err(truncated)?;
    String::from_utf8(buf).map_err(|e| StreamError::codec_with_source("Invalid UTF-8", e))
}

fn finish(cursor: &Cursor<&[u8]>) -> StreamResult<()> {
    let trailing = cursor.get_ref().len() - cursor.position() as usize;
    if trailing != 0 {
        return Err(StreamError::codec(format!(
            "{} trailing bytes after element",
            trailing
        )));
    }
    Ok(())
}

/// Binary codec for primary way records.
///
/// Layout: id (i64), version (i32), tag count (u32) + key/value strings,
/// node count (u32) + node ids (i64).
#[derive(Debug, Default, Clone, Copy)]
pub struct WayCodec;

impl SpillCodec<VersionedEntity<Way>> for WayCodec {
    fn encode(&self, value: &VersionedEntity<Way>, buf: &mut Vec<u8>) -> StreamResult<()> {
        let way = value.entity();
        buf.extend_from_slice(&way.id().to_le_bytes());
        buf.extend_from_slice(&value.version().to_le_bytes());

        put_count(buf, way.tags().len())?;
        for tag in way.tags() {
            put_string(buf, &tag.key)?;
            put_string(buf, &tag.value)?;
        }

        put_count(buf, way.way_nodes().len())?;
        for node in way.way_nodes() {
            buf.extend_from_slice(&node.node_id.to_le_bytes());
        }
        Ok(())
    }

    fn decode(&self, body: &[u8]) -> StreamResult<VersionedEntity<Way>> {
        let mut cursor = Cursor::new(body);
        let id = read_i64(&mut cursor)?;
        let version = read_i32(&mut cursor)?;

        let mut way = Way::new(id);
        for _ in 0..read_u32(&mut cursor)? {
            let key = read_string(&mut cursor)?;
            let value = read_string(&mut cursor)?;
            way.add_tag(Tag::new(key, value));
        }
        for _ in 0..read_u32(&mut cursor)? {
            way.add_way_node(WayNode::new(read_i64(&mut cursor)?));
        }

        finish(&cursor)?;
        Ok(VersionedEntity::new(way, version))
    }
}

/// Binary codec for tag rows.
///
/// Layout: entity id (i64), version (i32), key, value.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntityTagCodec;

impl SpillCodec<VersionedEntity<EntityTag>> for EntityTagCodec {
    fn encode(&self, value: &VersionedEntity<EntityTag>, buf: &mut Vec<u8>) -> StreamResult<()> {
        let tag = value.entity();
        buf.extend_from_slice(&tag.entity_id.to_le_bytes());
        buf.extend_from_slice(&value.version().to_le_bytes());
        put_string(buf, &tag.key)?;
        put_string(buf, &tag.value)
    }

    fn decode(&self, body: &[u8]) -> StreamResult<VersionedEntity<EntityTag>> {
        let mut cursor = Cursor::new(body);
        let entity_id = read_i64(&mut cursor)?;
        let version = read_i32(&mut cursor)?;
        let key = read_string(&mut cursor)?;
        let value = read_string(&mut cursor)?;
        finish(&cursor)?;
        Ok(VersionedEntity::new(
            EntityTag::new(entity_id, key, value),
            version,
        ))
    }
}

/// Binary codec for way-node rows.
///
/// Layout: way id (i64), version (i32), node id (i64), sequence id (i32).
#[derive(Debug, Default, Clone, Copy)]
pub struct WayNodeCodec;

impl SpillCodec<VersionedEntity<DbWayNode>> for WayNodeCodec {
    fn encode(&self, value: &VersionedEntity<DbWayNode>, buf: &mut Vec<u8>) -> StreamResult<()> {
        let node = value.entity();
        buf.extend_from_slice(&node.way_id.to_le_bytes());
        buf.extend_from_slice(&value.version().to_le_bytes());
        buf.extend_from_slice(&node.node_id.to_le_bytes());
        buf.extend_from_slice(&node.sequence_id.to_le_bytes());
        Ok(())
    }

    fn decode(&self, body: &[u8]) -> StreamResult<VersionedEntity<DbWayNode>> {
        let mut cursor = Cursor::new(body);
        let way_id = read_i64(&mut cursor)?;
        let version = read_i32(&mut cursor)?;
        let node_id = read_i64(&mut cursor)?;
        let sequence_id = read_i32(&mut cursor)?;
        finish(&cursor)?;
        Ok(VersionedEntity::new(
            DbWayNode::new(way_id, node_id, sequence_id),
            version,
        ))
    }
}
