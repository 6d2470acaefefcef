//! Example suites shown by `harness demo`.

use isocheck_core::{DiagnosticSink, RunSummary, Suite, SuiteError, SuiteOptions};

/// One demo suite after its run.
#[derive(Debug)]
pub struct DemoRun {
    pub suite: Suite,
    pub summary: RunSummary,
}

/// Build and run every demo suite. `make_sink` supplies the diagnostic sink of each suite.
pub fn run_demos<F>(make_sink: F) -> Result<Vec<DemoRun>, SuiteError>
where
    F: Fn() -> Box<dyn DiagnosticSink>,
{
    let builders: [fn(Box<dyn DiagnosticSink>) -> Result<Suite, SuiteError>; 4] = [
        dangling_and_test,
        one_failing_test,
        empty_test,
        crashes,
    ];
    let mut runs = Vec::with_capacity(builders.len());
    for build in builders {
        let mut suite = build(make_sink())?;
        let summary = suite.run_tests();
        runs.push(DemoRun { suite, summary });
    }
    Ok(runs)
}

fn dangling_and_test(sink: Box<dyn DiagnosticSink>) -> Result<Suite, SuiteError> {
    let mut suite = Suite::with_sink(
        SuiteOptions::NONE,
        Some("Dangling and test checks"),
        Some("One check outside any test, two failing checks inside T."),
        sink,
    )?;
    suite.record_check(true, Some("ok"));
    suite.add_test("T", |suite| {
        suite.record_check(false, Some("bad"));
        suite.record_check(false, Some("bad"));
    });
    Ok(suite)
}

fn one_failing_test(sink: Box<dyn DiagnosticSink>) -> Result<Suite, SuiteError> {
    let mut suite = Suite::with_sink(SuiteOptions::NONE, Some("One failing test"), None, sink)?;
    suite.add_test("all pass", |suite| {
        suite.record_check(1 + 1 == 2, Some("addition"));
        suite.record_check("abc".len() == 3, Some("length"));
        suite.record_check(u8::MAX == 255, Some("bounds"));
    });
    suite.add_test("one fails", |suite| {
        suite.record_check(true, None);
        suite.record_check("abc".starts_with('b'), Some("\"abc\" starts with 'b'"));
        suite.record_check(true, None);
    });
    Ok(suite)
}

fn empty_test(sink: Box<dyn DiagnosticSink>) -> Result<Suite, SuiteError> {
    let mut suite = Suite::with_sink(SuiteOptions::NONE, None, None, sink)?;
    suite.add_test("records nothing", |_suite| {});
    suite.register_test(None, None, Some("Registered without a body."));
    Ok(suite)
}

fn crashes(sink: Box<dyn DiagnosticSink>) -> Result<Suite, SuiteError> {
    let mut suite = Suite::with_sink(
        SuiteOptions::NONE,
        Some("Crash containment"),
        Some("Crashing tests lose their checks; their neighbours are unaffected."),
        sink,
    )?;
    suite.add_test("before", |suite| suite.record_check(true, Some("runs first")));
    suite.add_test("aborts", |suite| {
        suite.record_check(true, Some("never reported"));
        std::process::abort();
    });
    suite.add_test("panics", |suite| {
        suite.record_check(false, Some("never reported"));
        panic!("demo body panicked");
    });
    suite.add_test("after", |suite| suite.record_check(true, Some("runs last")));
    Ok(suite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use isocheck_core::{NullSink, RunOutcome};

    #[test]
    fn demos_produce_the_documented_counts() {
        let runs = run_demos(|| Box::new(NullSink)).unwrap();
        assert_eq!(runs.len(), 4);

        let a = &runs[0].suite;
        assert_eq!((a.success_count(), a.check_count()), (1, 3));
        assert_eq!(a.dangling().check_count(), 1);

        let b = &runs[1].suite;
        assert!(!b.all_passed());
        assert_eq!(b.registered_tests()[1].failures().count(), 1);

        let c = &runs[2].suite;
        assert!(c.all_passed());
        assert_eq!(c.check_count(), 0);

        let d = &runs[3];
        assert_eq!(d.summary.problems().count(), 2);
        assert!(matches!(
            d.summary.outcome(2),
            Some(RunOutcome::Crashed { .. })
        ));
        assert_eq!((d.suite.success_count(), d.suite.check_count()), (2, 2));
    }
}
