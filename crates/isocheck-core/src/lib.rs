//! # isocheck-core
//!
//! A small unit-test harness whose tests each run in their own forked child process.
//!
//! Callers register checks and tests on a [`Suite`], call [`Suite::run_tests`], and render the
//! aggregated state with [`report`]. Checks recorded inside a child travel back to the parent
//! over a one-way pipe using the [`channel`] protocol; nothing else crosses the process
//! boundary.
//!
//! # Architecture
//!
//! ```text
//! caller -> Suite (register) -> runner: fork per test -> child body -> channel -> parent merge
//!                                                                               -> report
//! ```
//!
//! Everything here is safe Rust except [`process`], which wraps `pipe`/`fork`/`waitpid`.

#![deny(unsafe_code)]

pub mod channel;
pub mod check;
pub mod config;
pub mod diag;
pub mod error;
pub mod hook;
#[allow(unsafe_code)]
pub mod process;
pub mod record;
pub mod report;
pub mod runner;
pub mod suite;

pub use check::Check;
pub use diag::{Diagnostic, DiagnosticSink, MemorySink, NullSink, StderrSink};
pub use error::{ErrorKind, HookError, SuiteError};
pub use hook::HookKind;
pub use record::{TestBody, TestRecord};
pub use report::ReportLevel;
pub use runner::{RunFailure, RunOutcome, RunSummary, TestRun};
pub use suite::{Suite, SuiteOptions};
