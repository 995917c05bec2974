//! Observable events
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events in the assembly pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded and validated
    ConfigLoaded,

    // Assembly
    /// Way assembly started
    AssemblyBegin,
    /// Way assembly finished, all streams released
    AssemblyComplete,
    /// One way emitted
    WayAssembled,

    // Spill
    /// Spill file deleted
    SpillPurged,
    /// A spill frame failed validation
    SpillCorrupted,

    // Release
    /// A stream could not be released
    StreamReleaseFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::AssemblyBegin => "ASSEMBLY_BEGIN",
            Event::AssemblyComplete => "ASSEMBLY_COMPLETE",
            Event::WayAssembled => "WAY_ASSEMBLED",
            Event::SpillPurged => "SPILL_PURGED",
            Event::SpillCorrupted => "SPILL_CORRUPTED",
            Event::StreamReleaseFailed => "STREAM_RELEASE_FAILED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
