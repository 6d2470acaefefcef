//! Diagnostic sink that writes suite diagnostics into the structured run log.

use std::cell::RefCell;
use std::rc::Rc;

use isocheck_core::{Diagnostic, DiagnosticSink, ErrorKind};

use crate::structured_log::{LogEmitter, LogEntry, LogLevel};

/// Emitter shared between a suite's sink and the code driving the run.
pub type SharedEmitter = Rc<RefCell<LogEmitter>>;

/// Forwards every diagnostic to a [`LogEmitter`] as a `diagnostic` event.
pub struct JsonlSink {
    emitter: SharedEmitter,
    suite: String,
    echo_stderr: bool,
}

impl JsonlSink {
    #[must_use]
    pub fn new(emitter: SharedEmitter, suite: impl Into<String>) -> Self {
        Self {
            emitter,
            suite: suite.into(),
            echo_stderr: false,
        }
    }

    /// Also print each diagnostic on stderr, as the default sink would.
    #[must_use]
    pub fn with_stderr_echo(mut self) -> Self {
        self.echo_stderr = true;
        self
    }
}

/// Log level a diagnostic of `kind` is recorded at.
#[must_use]
pub fn level_for(kind: ErrorKind) -> LogLevel {
    match kind {
        ErrorKind::AllocationFailure | ErrorKind::IncompleteTransfer => LogLevel::Warn,
        ErrorKind::ChannelCreationFailure
        | ErrorKind::IsolationSpawnFailure
        | ErrorKind::AbnormalTermination => LogLevel::Error,
    }
}

impl DiagnosticSink for JsonlSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        if self.echo_stderr {
            eprintln!("{diagnostic}");
        }
        let mut entry = LogEntry::new("", level_for(diagnostic.kind), "diagnostic")
            .with_suite(self.suite.clone())
            .with_error_kind(diagnostic.kind)
            .with_details(serde_json::json!({
                "operation": diagnostic.operation,
                "message": diagnostic.message,
            }));
        if let Some(ordinal) = diagnostic.ordinal {
            entry = entry.with_ordinal(ordinal);
        }
        let Ok(mut emitter) = self.emitter.try_borrow_mut() else {
            eprintln!("jsonl sink busy, dropped: {diagnostic}");
            return;
        };
        if let Err(err) = emitter.emit_entry(entry) {
            eprintln!("jsonl sink: {err}");
        }
    }
}
