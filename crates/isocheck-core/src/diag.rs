//! Diagnostic side channel.
//!
//! Failures that are not returned to the caller (allocation degradation, skipped or crashed
//! tests, incomplete transfers) are described by a [`Diagnostic`] and handed to the suite's
//! [`DiagnosticSink`].

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ErrorKind;

/// One harness-level failure report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Suite operation that observed the failure (`record_check`, `run_tests`, ...).
    pub operation: &'static str,
    pub kind: ErrorKind,
    /// Ordinal of the test involved, when there is one.
    pub ordinal: Option<u32>,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(operation: &'static str, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            ordinal: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_ordinal(mut self, ordinal: u32) -> Self {
        self.ordinal = Some(ordinal);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.operation, self.message)
    }
}

/// Receives diagnostics emitted by a suite.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: &Diagnostic);
}

/// Writes `"<operation>: <message>"` lines to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        eprintln!("{diagnostic}");
    }
}

/// Discards every diagnostic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _diagnostic: &Diagnostic) {}
}

/// Collects diagnostics in memory. Clones share the same buffer, so a caller can keep one
/// handle and install another on a suite.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    #[must_use]
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    /// Number of collected diagnostics of `kind`.
    #[must_use]
    pub fn count(&self, kind: ErrorKind) -> usize {
        self.entries.lock().iter().filter(|d| d.kind == kind).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.entries.lock().push(diagnostic.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display_matches_stderr_format() {
        let diag = Diagnostic::new("run_tests", ErrorKind::ChannelCreationFailure, "no pipe");
        assert_eq!(diag.to_string(), "run_tests: no pipe");
        assert_eq!(diag.ordinal, None);
        assert_eq!(diag.with_ordinal(3).ordinal, Some(3));
    }

    #[test]
    fn memory_sink_clones_share_entries() {
        let observer = MemorySink::new();
        let mut installed = observer.clone();
        installed.report(&Diagnostic::new(
            "record_check",
            ErrorKind::AllocationFailure,
            "failure to check",
        ));
        assert_eq!(observer.entries().len(), 1);
        assert_eq!(observer.count(ErrorKind::AllocationFailure), 1);
        assert_eq!(observer.count(ErrorKind::IncompleteTransfer), 0);
    }
}
