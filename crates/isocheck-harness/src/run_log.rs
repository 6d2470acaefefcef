//! Run summaries as structured log events.

use std::io;
use std::time::Duration;

use isocheck_core::report::DEFAULT_SUITE_NAME;
use isocheck_core::{RunOutcome, RunSummary, Suite};

use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};

/// Display name of a suite in log events.
#[must_use]
pub fn suite_label(suite: &Suite) -> String {
    suite.name().unwrap_or(DEFAULT_SUITE_NAME).to_string()
}

/// Emit one `test_result` event per test attempt, then a `suite_result` event.
pub fn log_run(
    emitter: &mut LogEmitter,
    suite: &Suite,
    summary: &RunSummary,
    elapsed: Duration,
) -> io::Result<()> {
    let label = suite_label(suite);
    for run in summary.runs() {
        let Some(record) = suite.tests().get(run.ordinal as usize) else {
            continue;
        };
        let name = record
            .name()
            .map_or_else(|| format!("Test #{}", run.ordinal), str::to_string);
        let outcome = Outcome::from_run(run.outcome, record.passed());
        let level = match outcome {
            Outcome::Pass => LogLevel::Info,
            Outcome::Fail | Outcome::Skip | Outcome::Incomplete => LogLevel::Warn,
            Outcome::Crash => LogLevel::Error,
        };
        let mut entry = LogEntry::new("", level, "test_result")
            .with_suite(label.clone())
            .with_test(name, run.ordinal)
            .with_outcome(outcome)
            .with_counts(record.success_count(), record.check_count());
        if let Some(kind) = run.outcome.error_kind() {
            entry = entry.with_error_kind(kind);
        }
        if let RunOutcome::Crashed {
            signal: Some(signal),
        } = run.outcome
        {
            entry = entry.with_signal(signal);
        }
        emitter.emit_entry(entry)?;
    }

    let passed = suite.all_passed();
    let entry = LogEntry::new(
        "",
        if passed { LogLevel::Info } else { LogLevel::Warn },
        "suite_result",
    )
    .with_suite(label)
    .with_outcome(if passed { Outcome::Pass } else { Outcome::Fail })
    .with_counts(suite.success_count(), suite.check_count())
    .with_duration_ms(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
    .with_details(serde_json::json!({
        "tests": summary.len(),
        "not_merged": summary.problems().count(),
    }));
    emitter.emit_entry(entry)?;
    Ok(())
}
