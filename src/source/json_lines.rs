//! Row source reading one JSON object per line

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::stream::{ReleasableStream, StreamError, StreamResult};

type RowFilter<R> = Box<dyn Fn(&R) -> bool>;

/// Forward-only source over a JSON-lines file.
///
/// Each non-blank line is parsed as `R` and converted into `T`. Rows
/// rejected by the optional filter are skipped. Rows are yielded in file
/// order; the file must already be sorted.
pub struct JsonLinesSource<R, T> {
    path: PathBuf,
    /// `None` once released
    reader: Option<BufReader<File>>,
    line: String,
    line_number: u64,
    filter: Option<RowFilter<R>>,
    lookahead: Option<T>,
    _marker: PhantomData<fn(R) -> T>,
}

impl<R, T> JsonLinesSource<R, T>
where
    R: DeserializeOwned + Into<T>,
{
    /// Opens the file for reading.
    pub fn open(path: &Path) -> StreamResult<Self> {
        let file = File::open(path).map_err(|e| {
            StreamError::source_read(format!("Failed to open {}", path.display()), e)
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            reader: Some(BufReader::new(file)),
            line: String::new(),
            line_number: 0,
            filter: None,
            lookahead: None,
            _marker: PhantomData,
        })
    }

    /// Only rows for which `filter` returns true are yielded.
    pub fn with_filter(mut self, filter: impl Fn(&R) -> bool + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of lines read so far.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    fn fill(&mut self) -> StreamResult<()> {
        if self.lookahead.is_some() {
            return Ok(());
        }
        let reader = match self.reader.as_mut() {
            Some(reader) => reader,
            None => return Ok(()),
        };

        loop {
            self.line.clear();
            let read = reader.read_line(&mut self.line).map_err(|e| {
                StreamError::source_read_at_line(
                    self.line_number + 1,
                    format!("Failed to read {}", self.path.display()),
                    e,
                )
            })?;
            if read == 0 {
                return Ok(());
            }
            self.line_number += 1;

            let text = self.line.trim();
            if text.is_empty() {
                continue;
            }

            let row: R = serde_json::from_str(text).map_err(|e| {
                StreamError::source_read_at_line(
                    self.line_number,
                    format!("Malformed row in {}", self.path.display()),
                    e,
                )
            })?;

            if let Some(ref filter) = self.filter {
                if !filter(&row) {
                    continue;
                }
            }

            self.lookahead = Some(row.into());
            return Ok(());
        }
    }
}

impl<R, T> ReleasableStream for JsonLinesSource<R, T>
where
    R: DeserializeOwned + Into<T>,
{
    type Item = T;

    fn has_next(&mut self) -> StreamResult<bool> {
        self.fill()?;
        Ok(self.lookahead.is_some())
    }

    fn next(&mut self) -> StreamResult<T> {
        self.fill()?;
        self.lookahead.take().ok_or_else(|| {
            StreamError::exhausted(format!("No more rows in {}", self.path.display()))
        })
    }

    fn release(&mut self) -> StreamResult<()> {
        self.reader = None;
        self.lookahead = None;
        Ok(())
    }
}
