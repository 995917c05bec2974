//! Temporary spill file
//!
//! A spill file has two phases. While writing, frames are appended through
//! a buffered writer and counted. Once sealed, frames are read back in
//! append order with every checksum verified. Closing deletes the file.
//!
//! With compression enabled the whole frame sequence is written as one gzip
//! stream. Frame offsets, checksums and the byte limit all refer to the
//! uncompressed frame bytes.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempPath;

use super::frame::{decode_frame, encode_frame, parse_length};
use super::SpillOptions;
use crate::stream::{StreamError, StreamResult};

enum SpillWriter {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl SpillWriter {
    /// Writes out everything buffered, including the gzip trailer.
    fn finish(self) -> io::Result<File> {
        let buffered = match self {
            SpillWriter::Plain(writer) => writer,
            SpillWriter::Gzip(encoder) => encoder.finish()?,
        };
        buffered.into_inner().map_err(|e| e.into_error())
    }
}

impl Write for SpillWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            SpillWriter::Plain(writer) => writer.write(buf),
            SpillWriter::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            SpillWriter::Plain(writer) => writer.flush(),
            SpillWriter::Gzip(encoder) => encoder.flush(),
        }
    }
}

enum SpillReader {
    Plain(BufReader<File>),
    Gzip(GzDecoder<BufReader<File>>),
}

impl Read for SpillReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            SpillReader::Plain(reader) => reader.read(buf),
            SpillReader::Gzip(decoder) => decoder.read(buf),
        }
    }
}

enum Phase {
    Writing(SpillWriter),
    Reading(SpillReader),
    Closed,
}

/// An append-then-read temporary file of checksummed frames.
pub struct SpillFile {
    path: Option<TempPath>,
    phase: Phase,
    compressed: bool,
    max_bytes: Option<u64>,
    /// Total uncompressed frame bytes appended
    bytes_written: u64,
    /// Frames appended
    frame_count: u64,
    /// Frames read back
    frames_read: u64,
    /// Uncompressed offset of the next frame to read
    read_offset: u64,
    /// Reused encoding buffer
    scratch: Vec<u8>,
}

impl SpillFile {
    /// Creates an empty spill file according to `options`.
    pub fn create(options: &SpillOptions) -> StreamResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&options.prefix).suffix(".spill");

        let named = match options.directory {
            Some(ref dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| StreamError::spill_io("Failed to create spill file", e))?;

        let (file, path) = named.into_parts();
        let buffered = BufWriter::new(file);
        let writer = if options.compress {
            SpillWriter::Gzip(GzEncoder::new(buffered, Compression::fast()))
        } else {
            SpillWriter::Plain(buffered)
        };

        Ok(Self {
            path: Some(path),
            phase: Phase::Writing(writer),
            compressed: options.compress,
            max_bytes: options.max_bytes,
            bytes_written: 0,
            frame_count: 0,
            frames_read: 0,
            read_offset: 0,
            scratch: Vec::new(),
        })
    }

    /// Path of the backing file, `None` once closed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Uncompressed frame bytes appended so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Reports whether unread frames remain after sealing.
    pub fn has_more(&self) -> bool {
        matches!(self.phase, Phase::Reading(_)) && self.frames_read < self.frame_count
    }

    /// Appends one frame carrying `body`.
    ///
    /// Fails with `SPILL_CAPACITY_EXCEEDED` if the uncompressed frame bytes
    /// would pass `max_bytes`.
    pub fn append(&mut self, body: &[u8]) -> StreamResult<()> {
        let writer = match self.phase {
            Phase::Writing(ref mut writer) => writer,
            _ => {
                return Err(StreamError::spill_io(
                    "Spill file is not writable",
                    io::Error::new(io::ErrorKind::Other, "sealed or closed"),
                ))
            }
        };

        self.scratch.clear();
        let frame_length = encode_frame(body, &mut self.scratch)? as u64;
        let required = self.bytes_written + frame_length;
        if let Some(limit) = self.max_bytes {
            if required > limit {
                return Err(StreamError::capacity_exceeded(limit, required));
            }
        }

        writer
            .write_all(&self.scratch)
            .map_err(|e| StreamError::spill_io("Failed to append spill frame", e))?;

        self.bytes_written = required;
        self.frame_count += 1;
        Ok(())
    }

    /// Ends the writing phase and rewinds for sequential reads.
    pub fn seal(&mut self) -> StreamResult<()> {
        let phase = std::mem::replace(&mut self.phase, Phase::Closed);
        let writer = match phase {
            Phase::Writing(writer) => writer,
            other => {
                self.phase = other;
                return Ok(());
            }
        };

        let mut file = writer
            .finish()
            .map_err(|e| StreamError::spill_io("Failed to flush spill file", e))?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| StreamError::spill_io("Failed to rewind spill file", e))?;

        let buffered = BufReader::new(file);
        self.phase = Phase::Reading(if self.compressed {
            SpillReader::Gzip(GzDecoder::new(buffered))
        } else {
            SpillReader::Plain(buffered)
        });
        Ok(())
    }

    /// Reads the next frame body.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(body))` if a frame was read
    /// - `Ok(None)` once every appended frame has been read
    /// - `Err(SPILL_CORRUPTION)` if the frame fails validation (FATAL)
    pub fn read_next(&mut self) -> StreamResult<Option<&[u8]>> {
        let reader = match self.phase {
            Phase::Reading(ref mut reader) => reader,
            _ => return Ok(None),
        };
        if self.frames_read >= self.frame_count {
            return Ok(None);
        }

        let offset = self.read_offset;
        let remaining = self.bytes_written - offset;

        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf).map_err(|e| {
            StreamError::corruption_at_offset(offset, format!("Failed to read frame length: {}", e))
        })?;
        let frame_length = parse_length(offset, len_buf, remaining)?;

        self.scratch.clear();
        self.scratch.resize(frame_length, 0);
        self.scratch[0..4].copy_from_slice(&len_buf);
        reader.read_exact(&mut self.scratch[4..]).map_err(|e| {
            StreamError::corruption_at_offset(offset, format!("Failed to read frame body: {}", e))
        })?;

        self.read_offset += frame_length as u64;
        self.frames_read += 1;

        decode_frame(offset, &self.scratch).map(Some)
    }

    /// Deletes the backing file. Safe to call more than once.
    pub fn close(&mut self) -> StreamResult<()> {
        self.phase = Phase::Closed;
        match self.path.take() {
            Some(path) => path
                .close()
                .map_err(|e| StreamError::release_failed("Failed to delete spill file", e)),
            None => Ok(()),
        }
    }
}
