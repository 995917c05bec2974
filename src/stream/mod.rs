//! Forward-only, releasable streams
//!
//! Every stage of the pipeline (row sources, spill files, lookahead
//! wrappers and the assembler itself) speaks the same small protocol:
//!
//! - `has_next()` may perform I/O and reports whether `next()` will succeed
//! - `next()` yields the next element or fails with ITERATION_EXHAUSTED
//! - `release()` frees held resources and may be called any number of times
//!
//! Streams are single-pass. There is no removal or rewind.

mod errors;
mod memory;
mod peekable;

pub use errors::{Severity, StreamError, StreamErrorCode, StreamResult};
pub use memory::MemoryStream;
pub use peekable::PeekableStream;

/// A forward-only sequence holding resources that must be released.
pub trait ReleasableStream {
    type Item;

    /// Reports whether another element is available.
    fn has_next(&mut self) -> StreamResult<bool>;

    /// Returns the next element.
    ///
    /// Fails with `IterationExhausted` if `has_next()` would return false.
    fn next(&mut self) -> StreamResult<Self::Item>;

    /// Releases all held resources. Safe to call repeatedly and at any
    /// point of iteration.
    fn release(&mut self) -> StreamResult<()>;
}

impl<S: ReleasableStream + ?Sized> ReleasableStream for Box<S> {
    type Item = S::Item;

    fn has_next(&mut self) -> StreamResult<bool> {
        (**self).has_next()
    }

    fn next(&mut self) -> StreamResult<Self::Item> {
        (**self).next()
    }

    fn release(&mut self) -> StreamResult<()> {
        (**self).release()
    }
}

/// Borrowing adapter exposing a stream as a std iterator.
///
/// Iteration stops after the first error. Releasing remains the caller's
/// responsibility.
pub struct StreamIter<'a, S: ?Sized> {
    stream: &'a mut S,
    failed: bool,
}

impl<'a, S: ReleasableStream + ?Sized> StreamIter<'a, S> {
    pub fn new(stream: &'a mut S) -> Self {
        Self {
            stream,
            failed: false,
        }
    }
}

impl<'a, S: ReleasableStream + ?Sized> Iterator for StreamIter<'a, S> {
    type Item = StreamResult<S::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let step = match self.stream.has_next() {
            Ok(true) => self.stream.next(),
            Ok(false) => return None,
            Err(e) => Err(e),
        };
        if step.is_err() {
            self.failed = true;
        }
        Some(step)
    }
}

/// Drains a stream into a vector, then releases it.
///
/// The stream is released even when draining fails; the drain error takes
/// precedence over a release error.
pub fn collect_all<S: ReleasableStream>(mut stream: S) -> StreamResult<Vec<S::Item>> {
    let drained: StreamResult<Vec<S::Item>> = StreamIter::new(&mut stream).collect();
    let released = stream.release();
    let items = drained?;
    released?;
    Ok(items)
}
