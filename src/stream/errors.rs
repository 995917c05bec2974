//! Stream error types
//!
//! Error codes:
//! - WAYMERGE_ITERATION_EXHAUSTED (ERROR severity)
//! - WAYMERGE_RESOURCE_RELEASE_FAILURE (ERROR severity)
//! - WAYMERGE_SOURCE_READ_FAILED (ERROR severity)
//! - WAYMERGE_SPILL_IO_ERROR (ERROR severity)
//! - WAYMERGE_SPILL_CORRUPTION (FATAL severity)
//! - WAYMERGE_SPILL_CAPACITY_EXCEEDED (ERROR severity)
//! - WAYMERGE_CODEC_FAILED (ERROR severity)

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Severity levels for stream errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The current pass fails; the caller may release and retry
    Error,
    /// Temporary storage can no longer be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Stream error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamErrorCode {
    /// `next()` or `peek()` called with no element available
    IterationExhausted,
    /// One or more wrapped resources could not be released
    ResourceReleaseFailure,
    /// A row source failed to produce its next element
    SourceReadFailed,
    /// Spill file could not be created, written or read
    SpillIoError,
    /// Spill frame failed length or checksum validation
    SpillCorruption,
    /// Spill file would grow past its configured capacity
    SpillCapacityExceeded,
    /// An element could not be encoded or decoded
    CodecFailed,
}

impl StreamErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            StreamErrorCode::IterationExhausted => "WAYMERGE_ITERATION_EXHAUSTED",
            StreamErrorCode::ResourceReleaseFailure => "WAYMERGE_RESOURCE_RELEASE_FAILURE",
            StreamErrorCode::SourceReadFailed => "WAYMERGE_SOURCE_READ_FAILED",
            StreamErrorCode::SpillIoError => "WAYMERGE_SPILL_IO_ERROR",
            StreamErrorCode::SpillCorruption => "WAYMERGE_SPILL_CORRUPTION",
            StreamErrorCode::SpillCapacityExceeded => "WAYMERGE_SPILL_CAPACITY_EXCEEDED",
            StreamErrorCode::CodecFailed => "WAYMERGE_CODEC_FAILED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StreamErrorCode::SpillCorruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for StreamErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Stream error with code, context and optional cause.
#[derive(Debug)]
pub struct StreamError {
    code: StreamErrorCode,
    message: String,
    details: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
    /// Individual failures folded into a release failure
    failures: Vec<StreamError>,
}

impl StreamError {
    fn new(code: StreamErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
            failures: Vec::new(),
        }
    }

    /// Create an iteration exhausted error
    pub fn exhausted(message: impl Into<String>) -> Self {
        Self::new(StreamErrorCode::IterationExhausted, message)
    }

    /// Create a release failure for a single resource
    pub fn release_failed(message: impl Into<String>, source: io::Error) -> Self {
        let mut err = Self::new(StreamErrorCode::ResourceReleaseFailure, message);
        err.source = Some(Box::new(source));
        err
    }

    /// Fold several failures raised while releasing a chain into one error.
    ///
    /// Returns `None` when `failures` is empty.
    pub fn aggregate_release(
        message: impl Into<String>,
        failures: Vec<StreamError>,
    ) -> Option<Self> {
        if failures.is_empty() {
            return None;
        }
        let mut err = Self::new(StreamErrorCode::ResourceReleaseFailure, message);
        err.details = Some(format!("failures: {}", failures.len()));
        err.failures = failures;
        Some(err)
    }

    /// Create a source read failure
    pub fn source_read(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        let mut err = Self::new(StreamErrorCode::SourceReadFailed, message);
        err.source = Some(source.into());
        err
    }

    /// Create a source read failure located at a line of its input
    pub fn source_read_at_line(
        line: u64,
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        let mut err = Self::source_read(message, source);
        err.details = Some(format!("line: {}", line));
        err
    }

    /// Create a spill I/O error
    pub fn spill_io(message: impl Into<String>, source: io::Error) -> Self {
        let mut err = Self::new(StreamErrorCode::SpillIoError, message);
        err.source = Some(Box::new(source));
        err
    }

    /// Create a spill corruption error with byte offset context (FATAL)
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        let mut err = Self::new(StreamErrorCode::SpillCorruption, reason);
        err.details = Some(format!("byte_offset: {}", offset));
        err
    }

    /// Create a capacity exceeded error
    pub fn capacity_exceeded(limit: u64, required: u64) -> Self {
        let mut err = Self::new(
            StreamErrorCode::SpillCapacityExceeded,
            "Spill file capacity exceeded",
        );
        err.details = Some(format!("limit: {}, required: {}", limit, required));
        err
    }

    /// Create a codec error
    pub fn codec(message: impl Into<String>) -> Self {
        Self::new(StreamErrorCode::CodecFailed, message)
    }

    /// Create a codec error wrapping a serializer failure
    pub fn codec_with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        let mut err = Self::codec(message);
        err.source = Some(source.into());
        err
    }

    /// Create an error for a stream that stopped after an earlier failure.
    ///
    /// Carries the earlier failure's code so repeated calls report it again.
    pub fn poisoned(code: StreamErrorCode, message: impl Into<String>) -> Self {
        let mut err = Self::new(code, message);
        err.details = Some("stream stopped by an earlier failure".to_string());
        err
    }

    /// Returns the error code
    pub fn code(&self) -> StreamErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Failures folded into an aggregated release failure
    pub fn failures(&self) -> &[StreamError] {
        &self.failures
    }

    /// Returns whether this error is fatal
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// Returns whether this is an iteration exhausted error
    pub fn is_exhausted(&self) -> bool {
        self.code == StreamErrorCode::IterationExhausted
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        if let Some(ref source) = self.source {
            write!(f, ": {}", source)?;
        }
        for failure in &self.failures {
            write!(f, "; {}", failure)?;
        }
        Ok(())
    }
}

impl StdError for StreamError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

/// Result type for stream operations
pub type StreamResult<T> = Result<T, StreamError>;
