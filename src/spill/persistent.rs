//! Disk-backed stream decorator
//!
//! On first access the wrapped source is drained completely into a spill
//! file and released. From then on elements are served from the file only,
//! so the source is traversed exactly once and memory use does not depend
//! on stream length.

use super::codec::SpillCodec;
use super::file::SpillFile;
use super::SpillOptions;
use crate::observability::{log_event_with_fields, Event, Logger, ObservationScope};
use crate::stream::{ReleasableStream, StreamError, StreamErrorCode, StreamResult};

enum State {
    /// Source not yet read
    Pending,
    /// Source fully spilled, reading from the file
    Spilled(SpillFile),
    /// Spilling failed with this code; the stream cannot be resumed
    Poisoned(StreamErrorCode),
    Released,
}

/// Wraps a stream so it is consumed through a temporary spill file.
pub struct PersistentStream<S, C> {
    source: Option<S>,
    codec: C,
    options: SpillOptions,
    state: State,
    scratch: Vec<u8>,
}

impl<S, C> PersistentStream<S, C>
where
    S: ReleasableStream,
    C: SpillCodec<S::Item>,
{
    pub fn new(source: S, codec: C, options: SpillOptions) -> Self {
        Self {
            source: Some(source),
            codec,
            options,
            state: State::Pending,
            scratch: Vec::new(),
        }
    }

    /// Number of elements written to the spill file, zero before first access.
    pub fn spilled_count(&self) -> u64 {
        match self.state {
            State::Spilled(ref spill) => spill.frame_count(),
            _ => 0,
        }
    }

    /// Whether the wrapped source is still held (not yet released).
    pub fn holds_source(&self) -> bool {
        self.source.is_some()
    }

    fn ensure_spilled(&mut self) -> StreamResult<()> {
        match self.state {
            State::Pending => {}
            State::Spilled(_) | State::Released => return Ok(()),
            State::Poisoned(code) => {
                return Err(StreamError::poisoned(
                    code,
                    format!("Spill of '{}' failed earlier", self.options.prefix),
                ))
            }
        }

        let source = match self.source.as_mut() {
            Some(source) => source,
            None => return Ok(()),
        };

        let scope =
            ObservationScope::with_fields("SPILL", &[("prefix", self.options.prefix.as_str())]);
        let spill = Self::drain(source, &self.codec, &self.options, &mut self.scratch);
        let spill = match spill {
            Ok(spill) => spill,
            Err(e) => {
                self.state = State::Poisoned(e.code());
                return Err(e);
            }
        };

        let frames = spill.frame_count().to_string();
        let bytes = spill.bytes_written().to_string();
        let compressed = spill.is_compressed().to_string();
        scope.complete_with_fields(&[
            ("frames", frames.as_str()),
            ("bytes", bytes.as_str()),
            ("compressed", compressed.as_str()),
        ]);
        self.state = State::Spilled(spill);

        // Everything needed is on disk now.
        if let Some(mut source) = self.source.take() {
            source.release()?;
        }
        Ok(())
    }

    fn drain(
        source: &mut S,
        codec: &C,
        options: &SpillOptions,
        scratch: &mut Vec<u8>,
    ) -> StreamResult<SpillFile> {
        let mut spill = SpillFile::create(options)?;
        while source.has_next()? {
            let item = source.next()?;
            scratch.clear();
            codec.encode(&item, scratch)?;
            spill.append(scratch)?;
        }
        spill.seal()?;
        Ok(spill)
    }
}

impl<S, C> ReleasableStream for PersistentStream<S, C>
where
    S: ReleasableStream,
    C: SpillCodec<S::Item>,
{
    type Item = S::Item;

    fn has_next(&mut self) -> StreamResult<bool> {
        self.ensure_spilled()?;
        Ok(match self.state {
            State::Spilled(ref spill) => spill.has_more(),
            _ => false,
        })
    }

    fn next(&mut self) -> StreamResult<S::Item> {
        self.ensure_spilled()?;
        let spill = match self.state {
            State::Spilled(ref mut spill) => spill,
            _ => return Err(StreamError::exhausted("Persistent stream is released")),
        };
        match spill.read_next() {
            Ok(Some(body)) => self.codec.decode(body),
            Ok(None) => Err(StreamError::exhausted(format!(
                "Persistent stream '{}' has no more elements",
                self.options.prefix
            ))),
            Err(e) => {
                if e.is_fatal() {
                    Logger::fatal(
                        Event::SpillCorrupted.as_str(),
                        &[
                            ("prefix", self.options.prefix.as_str()),
                            ("error", e.to_string().as_str()),
                        ],
                    );
                }
                Err(e)
            }
        }
    }

    fn release(&mut self) -> StreamResult<()> {
        let mut failures = Vec::new();

        if let State::Spilled(mut spill) = std::mem::replace(&mut self.state, State::Released) {
            let frames = spill.frame_count().to_string();
            match spill.close() {
                Ok(()) => log_event_with_fields(
                    Event::SpillPurged,
                    &[("prefix", self.options.prefix.as_str()), ("frames", frames.as_str())],
                ),
                Err(e) => failures.push(e),
            }
        }

        if let Some(mut source) = self.source.take() {
            if let Err(e) = source.release() {
                failures.push(e);
            }
        }

        match StreamError::aggregate_release(
            format!("Failed to release persistent stream '{}'", self.options.prefix),
            failures,
        ) {
            Some(err) => {
                Logger::error(
                    Event::StreamReleaseFailed.as_str(),
                    &[
                        ("prefix", self.options.prefix.as_str()),
                        ("error", err.to_string().as_str()),
                    ],
                );
                Err(err)
            }
            None => Ok(()),
        }
    }
}
