//! The harness testing itself: every property runs as an isolated test of an outer suite, and
//! most of them build and run inner suites inside that child.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use isocheck_core::channel::{self, DecodedComment};
use isocheck_core::{
    DiagnosticSink, ErrorKind, HookKind, MemorySink, NullSink, RunOutcome, RunSummary, Suite,
    SuiteError, SuiteOptions,
};

use crate::error::HarnessError;
use crate::fixtures::ReportFixtureSet;

pub const SELFTEST_SUITE_NAME: &str = "isocheck selftest";

/// A finished self-test run.
#[derive(Debug)]
pub struct SelftestRun {
    pub suite: Suite,
    pub summary: RunSummary,
    pub elapsed: Duration,
}

impl SelftestRun {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.suite.all_passed() && self.summary.all_merged()
    }
}

fn inner_suite() -> Result<Suite, SuiteError> {
    Suite::with_sink(SuiteOptions::NONE, None, None, Box::new(NullSink))
}

/// Register every self-test on a fresh suite reporting to `sink`, one test per report fixture
/// plus the harness properties.
pub fn build_suite(
    sink: Box<dyn DiagnosticSink>,
    fixtures: ReportFixtureSet,
) -> Result<Suite, HarnessError> {
    let mut suite = Suite::with_sink(
        SuiteOptions::NONE,
        Some(SELFTEST_SUITE_NAME),
        Some("Harness properties checked with the harness itself."),
        sink,
    )?;

    for fixture in fixtures.cases {
        let name = format!("report fixture {}", fixture.id);
        suite.add_test(&name, move |suite| match fixture.verify() {
            Ok(verdict) => suite.record_check(verdict.matched, Some(&verdict.id)),
            Err(err) => suite.record_check(false, Some(&err.to_string())),
        });
    }

    suite.add_test("dangling checks", dangling_checks);
    suite.add_test("channel round trip", channel_round_trip);
    suite.add_test("crash containment", crash_containment);
    suite.add_test("process isolation", process_isolation);
    suite.add_test("all tests passed", all_tests_passed);
    suite.add_test("hooks unsupported", hooks_unsupported);
    suite.add_test("diagnostics", diagnostics);
    Ok(suite)
}

/// Build and run the self-test suite.
pub fn run(
    sink: Box<dyn DiagnosticSink>,
    fixtures: ReportFixtureSet,
) -> Result<SelftestRun, HarnessError> {
    let mut suite = build_suite(sink, fixtures)?;
    let started = Instant::now();
    let summary = suite.run_tests();
    Ok(SelftestRun {
        suite,
        summary,
        elapsed: started.elapsed(),
    })
}

fn dangling_checks(outer: &mut Suite) {
    let Ok(mut suite) = inner_suite() else {
        outer.record_check(false, Some("cannot create inner suite"));
        return;
    };
    let calls = [true, false, true, true, false, false, true];
    for cond in calls {
        suite.record_check(cond, None);
    }
    let expected_true = calls.iter().filter(|c| **c).count() as u32;
    outer.record_check(
        suite.check_count() == calls.len() as u32,
        Some("suite check count equals number of calls"),
    );
    outer.record_check(
        suite.success_count() == expected_true,
        Some("suite success count equals number of true conditions"),
    );
    outer.record_check(
        suite.dangling().check_count() == suite.check_count(),
        Some("every check landed on the dangling record"),
    );
}

fn channel_round_trip(outer: &mut Suite) {
    let records = [
        (true, Some("plain")),
        (false, None),
        (true, Some("")),
        (false, Some("embedded\0nul")),
    ];
    let mut bytes = Vec::new();
    if channel::encode(&mut bytes, records.iter().copied()).is_err() {
        outer.record_check(false, Some("encoding into memory failed"));
        return;
    }
    match channel::decode(&mut bytes.as_slice()) {
        Ok(decoded) => {
            let same = decoded.len() == records.len()
                && decoded
                    .iter()
                    .zip(records)
                    .all(|(d, (result, comment))| d.result == result && d.comment.as_deref() == comment);
            outer.record_check(same, Some("decoded records equal the encoded ones"));
            outer.record_check(
                decoded.get(1).map(|d| &d.comment) == Some(&DecodedComment::Absent),
                Some("absent comment stays absent"),
            );
        }
        Err(err) => outer.record_check(false, Some(&err.to_string())),
    }
    outer.record_check(
        channel::decode(&mut &bytes[..bytes.len() - 1]).is_err(),
        Some("stream without end marker is rejected"),
    );
}

fn crash_containment(outer: &mut Suite) {
    let Ok(mut suite) = inner_suite() else {
        outer.record_check(false, Some("cannot create inner suite"));
        return;
    };
    suite.add_test("good", |s| s.record_check(true, None));
    suite.add_test("aborts", |s| {
        s.record_check(true, None);
        std::process::abort();
    });
    suite.add_test("exits", |s| {
        s.record_check(true, None);
        std::process::exit(3);
    });
    suite.add_test("also good", |s| s.record_check(false, None));
    let summary = suite.run_tests();

    outer.record_check(
        matches!(summary.outcome(2), Some(RunOutcome::Crashed { .. })),
        Some("aborting test is reported as crashed"),
    );
    outer.record_check(
        summary.outcome(3) == Some(RunOutcome::Incomplete),
        Some("early exit is reported as incomplete"),
    );
    let tests = suite.registered_tests();
    outer.record_check(
        tests[1].check_count() == 0 && tests[2].check_count() == 0,
        Some("failed attempts leave 0/0"),
    );
    outer.record_check(
        tests[0].check_count() == 1 && tests[3].check_count() == 1,
        Some("neighbours keep their checks"),
    );
    outer.record_check(
        suite.check_count() == 2 && suite.success_count() == 1,
        Some("suite counters only include merged checks"),
    );
}

static ISOLATION_MARKER: AtomicU32 = AtomicU32::new(0);

fn process_isolation(outer: &mut Suite) {
    let Ok(mut suite) = inner_suite() else {
        outer.record_check(false, Some("cannot create inner suite"));
        return;
    };
    ISOLATION_MARKER.store(1, Ordering::SeqCst);
    suite.add_test("mutates", |s| {
        let before = ISOLATION_MARKER.swap(99, Ordering::SeqCst);
        s.record_check(before == 1, None);
    });
    suite.add_test("observes", |s| {
        s.record_check(ISOLATION_MARKER.load(Ordering::SeqCst) == 1, None);
    });
    suite.run_tests();

    outer.record_check(suite.all_passed(), Some("siblings never see each other's writes"));
    outer.record_check(
        ISOLATION_MARKER.load(Ordering::SeqCst) == 1,
        Some("parent state is untouched by its children"),
    );
}

fn all_tests_passed(outer: &mut Suite) {
    let Ok(mut suite) = inner_suite() else {
        outer.record_check(false, Some("cannot create inner suite"));
        return;
    };
    suite.add_test("empty", |_| {});
    suite.run_tests();
    outer.record_check(suite.all_passed(), Some("an empty test passes"));

    suite.add_test("one failure", |s| {
        s.record_check(true, None);
        s.record_check(false, None);
    });
    suite.run_tests();
    outer.record_check(!suite.all_passed(), Some("one failing check fails the suite"));
}

fn hooks_unsupported(outer: &mut Suite) {
    let Ok(mut suite) = inner_suite() else {
        outer.record_check(false, Some("cannot create inner suite"));
        return;
    };
    outer.record_check(
        suite.add_hook(HookKind::BeforeEach, || {}).is_err(),
        Some("before-each hooks are rejected"),
    );
}

fn diagnostics(outer: &mut Suite) {
    let sink = MemorySink::new();
    let Ok(mut suite) = Suite::with_sink(SuiteOptions::NONE, None, None, Box::new(sink.clone()))
    else {
        outer.record_check(false, Some("cannot create inner suite"));
        return;
    };
    suite.add_test("aborts", |_| std::process::abort());
    suite.run_tests();
    outer.record_check(
        sink.count(ErrorKind::AbnormalTermination) == 1,
        Some("a crash emits one abnormal termination diagnostic"),
    );
    outer.record_check(
        sink.entries().first().and_then(|d| d.ordinal) == Some(1),
        Some("the diagnostic names the crashed test"),
    );
}
