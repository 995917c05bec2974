//! Single-element lookahead over a forward-only stream

use super::errors::{StreamError, StreamResult};
use super::ReleasableStream;

/// Decorates a stream so the next element can be inspected without
/// consuming it.
///
/// At most one element is buffered.
pub struct PeekableStream<S: ReleasableStream> {
    inner: S,
    lookahead: Option<S::Item>,
}

impl<S: ReleasableStream> PeekableStream<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            lookahead: None,
        }
    }

    /// Fills the lookahead slot if empty. Returns whether it is occupied.
    fn fill(&mut self) -> StreamResult<bool> {
        if self.lookahead.is_none() && self.inner.has_next()? {
            self.lookahead = Some(self.inner.next()?);
        }
        Ok(self.lookahead.is_some())
    }

    /// Returns the next element without advancing.
    pub fn peek(&mut self) -> StreamResult<&S::Item> {
        self.fill()?;
        self.lookahead
            .as_ref()
            .ok_or_else(|| StreamError::exhausted("Nothing to peek: stream is exhausted"))
    }

    /// Consumes the lookahead element only if `pred` accepts it.
    pub fn next_if(
        &mut self,
        pred: impl FnOnce(&S::Item) -> bool,
    ) -> StreamResult<Option<S::Item>> {
        if !self.fill()? {
            return Ok(None);
        }
        let item = match self.lookahead.take() {
            Some(item) => item,
            None => return Ok(None),
        };
        if pred(&item) {
            Ok(Some(item))
        } else {
            self.lookahead = Some(item);
            Ok(None)
        }
    }

    /// Returns the wrapped stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

impl<S: ReleasableStream> ReleasableStream for PeekableStream<S> {
    type Item = S::Item;

    fn has_next(&mut self) -> StreamResult<bool> {
        self.fill()
    }

    fn next(&mut self) -> StreamResult<S::Item> {
        self.fill()?;
        self.lookahead
            .take()
            .ok_or_else(|| StreamError::exhausted("Peekable stream has no more elements"))
    }

    fn release(&mut self) -> StreamResult<()> {
        self.lookahead = None;
        self.inner.release()
    }
}
