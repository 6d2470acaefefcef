//! Isolated test execution.
//!
//! Every registered test runs in a forked copy of the suite. The child runs the body, streams
//! the checks it recorded back over a pipe, and exits; the parent decodes the stream while the
//! child is alive, reaps it, and merges the checks only if the child exited normally and the
//! stream arrived whole.

use std::fmt;
use std::io::{self, BufReader, BufWriter, Write};

use thiserror::Error;

use crate::channel::{self, DecodeError, DecodedCheck, DecodedComment};
use crate::diag::Diagnostic;
use crate::error::ErrorKind;
use crate::process::{self, Termination};
use crate::suite::{DANGLING, Suite};

/// Why a single test attempt produced no merged result.
#[derive(Debug, Error)]
pub enum RunFailure {
    #[error("cannot create pipe, not running test ({0})")]
    Channel(#[source] io::Error),
    #[error("cannot create process ({0})")]
    Spawn(#[source] io::Error),
    #[error("cannot reap test process ({0})")]
    Wait(#[source] io::Error),
    #[error("test failed to run: killed by signal {0}")]
    Signaled(i32),
    #[error("test failed to run: wait status {0:#x}")]
    Unrecognized(i32),
    #[error("test failed to run: {0}")]
    Transfer(#[source] DecodeError),
}

impl RunFailure {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Channel(_) => ErrorKind::ChannelCreationFailure,
            Self::Spawn(_) => ErrorKind::IsolationSpawnFailure,
            Self::Wait(_) | Self::Signaled(_) | Self::Unrecognized(_) => {
                ErrorKind::AbnormalTermination
            }
            Self::Transfer(_) => ErrorKind::IncompleteTransfer,
        }
    }

    #[must_use]
    pub const fn outcome(&self) -> RunOutcome {
        match self {
            Self::Channel(_) => RunOutcome::Skipped(ErrorKind::ChannelCreationFailure),
            Self::Spawn(_) => RunOutcome::Skipped(ErrorKind::IsolationSpawnFailure),
            Self::Signaled(signal) => RunOutcome::Crashed {
                signal: Some(*signal),
            },
            Self::Wait(_) | Self::Unrecognized(_) => RunOutcome::Crashed { signal: None },
            Self::Transfer(_) => RunOutcome::Incomplete,
        }
    }
}

/// What happened to one test during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The child exited normally and `checks` records were merged.
    Merged { checks: u32 },
    /// The test never ran.
    Skipped(ErrorKind),
    /// The child died abnormally (`signal` is `None` when it could not be determined).
    Crashed { signal: Option<i32> },
    /// The child exited but its stream was cut short; nothing from this attempt was merged.
    Incomplete,
}

impl RunOutcome {
    #[must_use]
    pub const fn is_merged(self) -> bool {
        matches!(self, Self::Merged { .. })
    }

    /// Diagnostic class of a non-merged outcome.
    #[must_use]
    pub const fn error_kind(self) -> Option<ErrorKind> {
        match self {
            Self::Merged { .. } => None,
            Self::Skipped(kind) => Some(kind),
            Self::Crashed { .. } => Some(ErrorKind::AbnormalTermination),
            Self::Incomplete => Some(ErrorKind::IncompleteTransfer),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Merged { .. } => "merged",
            Self::Skipped(_) => "skipped",
            Self::Crashed { .. } => "crashed",
            Self::Incomplete => "incomplete",
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merged { checks } => write!(f, "merged {checks} checks"),
            Self::Skipped(kind) => write!(f, "skipped ({kind})"),
            Self::Crashed { signal: Some(signal) } => write!(f, "crashed (signal {signal})"),
            Self::Crashed { signal: None } => f.write_str("crashed"),
            Self::Incomplete => f.write_str("incomplete"),
        }
    }
}

/// Outcome of one registered test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestRun {
    pub ordinal: u32,
    pub outcome: RunOutcome,
}

/// Outcomes of a `run_tests` call, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    runs: Vec<TestRun>,
}

impl RunSummary {
    #[must_use]
    pub fn runs(&self) -> &[TestRun] {
        &self.runs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Outcome of the test with `ordinal`, if it was part of this run.
    #[must_use]
    pub fn outcome(&self, ordinal: u32) -> Option<RunOutcome> {
        self.runs
            .iter()
            .find(|run| run.ordinal == ordinal)
            .map(|run| run.outcome)
    }

    /// True when every test ran and its results were merged.
    #[must_use]
    pub fn all_merged(&self) -> bool {
        self.runs.iter().all(|run| run.outcome.is_merged())
    }

    /// Tests whose results were not merged.
    pub fn problems(&self) -> impl Iterator<Item = &TestRun> {
        self.runs.iter().filter(|run| !run.outcome.is_merged())
    }
}

impl Suite {
    /// Run every registered test, each in its own child process, in registration order.
    ///
    /// Checks already stored on a record are kept; each attempt adds the checks it recorded.
    /// Failures are reported through the diagnostic sink and never stop the run. Afterwards
    /// checks go to the dangling record again.
    pub fn run_tests(&mut self) -> RunSummary {
        let mut runs = Vec::new();
        for index in DANGLING + 1..self.tests.len() {
            let ordinal = self.tests[index].ordinal;
            let outcome = match self.run_one(index) {
                Ok(checks) => RunOutcome::Merged { checks },
                Err(failure) => {
                    self.diagnose(
                        Diagnostic::new("run_tests", failure.kind(), failure.to_string())
                            .with_ordinal(ordinal),
                    );
                    failure.outcome()
                }
            };
            if runs.try_reserve(1).is_ok() {
                runs.push(TestRun { ordinal, outcome });
            }
        }
        self.active = DANGLING;
        RunSummary { runs }
    }

    fn run_one(&mut self, index: usize) -> Result<u32, RunFailure> {
        let pipe = process::pipe().map_err(RunFailure::Channel)?;

        self.active = index;
        let body = self.tests[index].body.clone();
        let already_stored = self.tests[index].checks.len();

        let (child, reader) = process::fork_with_pipe(pipe, |writer| {
            if let Some(body) = body {
                body(self);
            }
            let sent = self.tests[index]
                .checks
                .get(already_stored..)
                .unwrap_or_default();
            let mut writer = BufWriter::new(writer);
            if channel::encode_checks(&mut writer, sent)
                .and_then(|()| writer.flush())
                .is_err()
            {
                process::abort_child();
            }
            0
        })
        .map_err(RunFailure::Spawn)?;

        // Decode before reaping so a child writing more than the pipe buffers never blocks
        // forever; the read end is closed before waiting.
        let decoded = channel::decode_to_eof(&mut BufReader::new(reader));
        let termination = child.wait().map_err(RunFailure::Wait)?;

        match termination {
            Termination::Signaled(signal) => Err(RunFailure::Signaled(signal)),
            Termination::Other(status) => Err(RunFailure::Unrecognized(status)),
            Termination::Exited(_) => match decoded {
                Ok(checks) => Ok(self.merge_checks(checks)),
                Err(err) => Err(RunFailure::Transfer(err)),
            },
        }
    }

    fn merge_checks(&mut self, decoded: Vec<DecodedCheck>) -> u32 {
        let mut merged = 0;
        for DecodedCheck { result, comment } in decoded {
            let comment = match comment {
                DecodedComment::Dropped { len } => {
                    let ordinal = self.tests[self.active].ordinal;
                    self.diagnose(
                        Diagnostic::new(
                            "run_tests",
                            ErrorKind::AllocationFailure,
                            format!("cannot save a comment of {len} bytes"),
                        )
                        .with_ordinal(ordinal),
                    );
                    None
                }
                other => other.into_option(),
            };
            self.record_owned_check(result, comment);
            merged += 1;
        }
        merged
    }
}
