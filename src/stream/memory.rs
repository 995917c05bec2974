//! In-memory stream over rows the caller already holds

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::errors::{StreamError, StreamResult};
use super::ReleasableStream;

/// A stream yielding the elements of a vector in order.
///
/// Releasing drops any elements not yet consumed. The number of release
/// calls is observable through [`MemoryStream::release_count_handle`].
#[derive(Debug)]
pub struct MemoryStream<T> {
    items: VecDeque<T>,
    releases: Rc<Cell<usize>>,
}

impl<T> MemoryStream<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into(),
            releases: Rc::new(Cell::new(0)),
        }
    }

    /// Number of elements not yet consumed.
    pub fn remaining(&self) -> usize {
        self.items.len()
    }

    /// Shared counter incremented on every `release()` call.
    pub fn release_count_handle(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.releases)
    }
}

impl<T> ReleasableStream for MemoryStream<T> {
    type Item = T;

    fn has_next(&mut self) -> StreamResult<bool> {
        Ok(!self.items.is_empty())
    }

    fn next(&mut self) -> StreamResult<T> {
        self.items
            .pop_front()
            .ok_or_else(|| StreamError::exhausted("Memory stream has no more elements"))
    }

    fn release(&mut self) -> StreamResult<()> {
        self.items.clear();
        self.releases.set(self.releases.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_on_empty_is_exhausted() {
        let mut stream: MemoryStream<i32> = MemoryStream::new(Vec::new());
        assert!(!stream.has_next().unwrap());
        assert!(stream.next().unwrap_err().is_exhausted());
    }

    #[test]
    fn test_release_drops_remaining() {
        let mut stream = MemoryStream::new(vec![1, 2, 3]);
        stream.next().unwrap();
        stream.release().unwrap();

        assert_eq!(stream.remaining(), 0);
        assert!(!stream.has_next().unwrap());
    }
}
