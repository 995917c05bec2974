//! Begin/complete logging around a unit of work
//!
//! A scope logs `{NAME}_BEGIN` when opened. Finishing it logs
//! `{NAME}_COMPLETE` with `elapsed_ms`. A scope dropped unfinished, for
//! example on an early `?` return, logs `{NAME}_INCOMPLETE` at WARN.

use std::time::Instant;

use super::logger::Logger;

/// Timed scope whose opening fields are repeated on every line it logs.
///
/// ```ignore
/// let scope = ObservationScope::with_fields("SPILL", &[("prefix", "waytag")]);
/// let frames = spill_everything()?;
/// scope.complete_with_fields(&[("frames", frames.as_str())]);
/// ```
pub struct ObservationScope<'a> {
    name: &'a str,
    fields: Vec<(&'a str, String)>,
    started: Instant,
    finished: bool,
}

impl<'a> ObservationScope<'a> {
    pub fn new(name: &'a str) -> Self {
        Self::with_fields(name, &[])
    }

    pub fn with_fields(name: &'a str, fields: &[(&'a str, &str)]) -> Self {
        Logger::info(&format!("{}_BEGIN", name), fields);
        Self {
            name,
            fields: fields.iter().map(|&(k, v)| (k, v.to_owned())).collect(),
            started: Instant::now(),
            finished: false,
        }
    }

    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    /// Logs completion with `extra` appended to the opening fields.
    pub fn complete_with_fields(mut self, extra: &[(&str, &str)]) {
        self.finished = true;
        let elapsed_ms = self.started.elapsed().as_millis().to_string();

        let mut fields = self.borrowed_fields();
        fields.extend_from_slice(extra);
        fields.push(("elapsed_ms", elapsed_ms.as_str()));
        Logger::info(&format!("{}_COMPLETE", self.name), &fields);
    }

    fn borrowed_fields(&self) -> Vec<(&str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect()
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut fields = self.borrowed_fields();
        fields.push(("reason", "dropped before completion"));
        Logger::warn(&format!("{}_INCOMPLETE", self.name), &fields);
    }
}
