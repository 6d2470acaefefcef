//! Suite registry: owns every test record and the suite-wide counters.

use std::collections::TryReserveError;
use std::fmt;
use std::rc::Rc;

use crate::check::Check;
use crate::config;
use crate::diag::{Diagnostic, DiagnosticSink};
use crate::error::{ErrorKind, HookError, SuiteError};
use crate::hook::{self, HookKind};
use crate::record::{TestBody, TestRecord};

/// Index of the implicit record that absorbs checks made outside any test.
pub(crate) const DANGLING: usize = 0;

/// Option bit flags supplied at suite creation.
///
/// Options are stored and exposed but no flag currently changes harness behavior.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SuiteOptions(u8);

impl SuiteOptions {
    /// No options set.
    pub const NONE: Self = Self(0);

    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Top-level aggregate of tests and checks.
///
/// A fresh suite already holds one record: the dangling record (ordinal 0, no name, no body).
/// Checks recorded while no test is executing land there.
pub struct Suite {
    name: Option<String>,
    comment: Option<String>,
    options: SuiteOptions,
    success_count: u32,
    check_count: u32,
    test_count: u32,
    pub(crate) tests: Vec<TestRecord>,
    pub(crate) active: usize,
    sink: Box<dyn DiagnosticSink>,
}

impl Suite {
    /// Create a suite whose diagnostics go to the configured default sink.
    pub fn new(
        options: SuiteOptions,
        name: Option<&str>,
        comment: Option<&str>,
    ) -> Result<Self, SuiteError> {
        Self::with_sink(options, name, comment, config::default_sink())
    }

    /// Create a suite reporting diagnostics to `sink`.
    pub fn with_sink(
        options: SuiteOptions,
        name: Option<&str>,
        comment: Option<&str>,
        sink: Box<dyn DiagnosticSink>,
    ) -> Result<Self, SuiteError> {
        let name =
            copy_text(name).map_err(|_| SuiteError::AllocationFailure { what: "suite name" })?;
        let comment = copy_text(comment)
            .map_err(|_| SuiteError::AllocationFailure { what: "suite comment" })?;

        let mut tests = Vec::new();
        tests
            .try_reserve(1)
            .map_err(|_| SuiteError::AllocationFailure { what: "test list" })?;
        tests.push(TestRecord::new(None, None, None, 0));

        Ok(Self {
            name,
            comment,
            options,
            success_count: 0,
            check_count: 0,
            test_count: 1,
            tests,
            active: DANGLING,
            sink,
        })
    }

    /// Record one check against the active test.
    ///
    /// Counters are updated before anything is allocated. If the check itself cannot be
    /// stored it stays counted and a diagnostic is emitted; if only the comment cannot be
    /// copied the check is stored without it.
    pub fn record_check(&mut self, condition: bool, comment: Option<&str>) {
        let sequence_number = self.count_check(condition);
        if !self.reserve_check_slot(comment) {
            return;
        }

        let comment = match copy_text(comment) {
            Ok(copy) => copy,
            Err(_) => {
                self.diagnose(Diagnostic::new(
                    "record_check",
                    ErrorKind::AllocationFailure,
                    format!(
                        "failure to save comment: {}",
                        comment.unwrap_or("no comment provided.")
                    ),
                ));
                None
            }
        };
        self.tests[self.active]
            .checks
            .push(Check::new(condition, comment, sequence_number));
    }

    /// Record a check whose comment is already owned (used when merging child results).
    pub(crate) fn record_owned_check(&mut self, condition: bool, comment: Option<String>) {
        let sequence_number = self.count_check(condition);
        if !self.reserve_check_slot(comment.as_deref()) {
            return;
        }
        self.tests[self.active]
            .checks
            .push(Check::new(condition, comment, sequence_number));
    }

    /// Register a test to be executed by [`run_tests`](Self::run_tests).
    ///
    /// On allocation failure the test is not registered and a diagnostic is emitted.
    pub fn register_test(
        &mut self,
        body: Option<TestBody>,
        name: Option<&str>,
        comment: Option<&str>,
    ) {
        if self.tests.try_reserve(1).is_err() {
            self.diagnose(Diagnostic::new(
                "register_test",
                ErrorKind::AllocationFailure,
                format!(
                    "failure to add test: {}",
                    name.unwrap_or("no name provided.")
                ),
            ));
            return;
        }

        let name_copy = match copy_text(name) {
            Ok(copy) => copy,
            Err(_) => {
                self.diagnose(Diagnostic::new(
                    "register_test",
                    ErrorKind::AllocationFailure,
                    format!("failure to save name: {}", name.unwrap_or_default()),
                ));
                None
            }
        };
        let comment_copy = match copy_text(comment) {
            Ok(copy) => copy,
            Err(_) => {
                self.diagnose(Diagnostic::new(
                    "register_test",
                    ErrorKind::AllocationFailure,
                    format!("failure to save comment: {}", comment.unwrap_or_default()),
                ));
                None
            }
        };

        let ordinal = self.test_count;
        self.tests
            .push(TestRecord::new(body, name_copy, comment_copy, ordinal));
        self.test_count += 1;
    }

    /// Register a named test with a body.
    pub fn add_test<F>(&mut self, name: &str, body: F)
    where
        F: Fn(&mut Suite) + 'static,
    {
        let body: TestBody = Rc::new(body);
        self.register_test(Some(body), Some(name), None);
    }

    /// Declare a hook. No hook kind is schedulable, so this always fails.
    pub fn add_hook<F>(&mut self, kind: HookKind, _hook: F) -> Result<(), HookError>
    where
        F: Fn() + 'static,
    {
        if hook::hooks_supported(kind) {
            return Ok(());
        }
        Err(HookError::Unsupported(kind))
    }

    /// True iff every record, the dangling one included, has no failed check.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.tests.iter().all(TestRecord::passed)
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    #[must_use]
    pub fn options(&self) -> SuiteOptions {
        self.options
    }

    #[must_use]
    pub fn success_count(&self) -> u32 {
        self.success_count
    }

    #[must_use]
    pub fn check_count(&self) -> u32 {
        self.check_count
    }

    /// Number of registered records, the dangling record included.
    #[must_use]
    pub fn test_count(&self) -> u32 {
        self.test_count
    }

    /// Every record in registration order; index 0 is the dangling record.
    #[must_use]
    pub fn tests(&self) -> &[TestRecord] {
        &self.tests
    }

    /// Records registered by the caller, in registration order.
    #[must_use]
    pub fn registered_tests(&self) -> &[TestRecord] {
        &self.tests[DANGLING + 1..]
    }

    /// The record that absorbs checks made outside any test.
    #[must_use]
    pub fn dangling(&self) -> &TestRecord {
        &self.tests[DANGLING]
    }

    /// The record currently receiving checks.
    #[must_use]
    pub fn active_test(&self) -> &TestRecord {
        &self.tests[self.active]
    }

    pub(crate) fn diagnose(&mut self, diagnostic: Diagnostic) {
        self.sink.report(&diagnostic);
    }

    fn count_check(&mut self, condition: bool) -> u32 {
        let active = &mut self.tests[self.active];
        active.check_count += 1;
        self.check_count += 1;
        if condition {
            active.success_count += 1;
            self.success_count += 1;
        }
        active.check_count
    }

    fn reserve_check_slot(&mut self, comment: Option<&str>) -> bool {
        if self.tests[self.active].checks.try_reserve(1).is_ok() {
            return true;
        }
        let ordinal = self.tests[self.active].ordinal;
        self.diagnose(
            Diagnostic::new(
                "record_check",
                ErrorKind::AllocationFailure,
                format!(
                    "failure to check: {}",
                    comment.unwrap_or("no comment provided.")
                ),
            )
            .with_ordinal(ordinal),
        );
        false
    }
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field("comment", &self.comment)
            .field("options", &self.options)
            .field("success_count", &self.success_count)
            .field("check_count", &self.check_count)
            .field("test_count", &self.test_count)
            .field("tests", &self.tests)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

fn copy_text(text: Option<&str>) -> Result<Option<String>, TryReserveError> {
    text.map(|text| {
        let mut copy = String::new();
        copy.try_reserve_exact(text.len())?;
        copy.push_str(text);
        Ok(copy)
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::{MemorySink, NullSink};

    fn quiet_suite(name: Option<&str>) -> Suite {
        Suite::with_sink(SuiteOptions::NONE, name, None, Box::new(NullSink)).unwrap()
    }

    #[test]
    fn new_suite_has_only_the_dangling_record() {
        let suite = quiet_suite(None);
        assert_eq!(suite.test_count(), 1);
        assert_eq!(suite.tests().len(), 1);
        assert!(suite.registered_tests().is_empty());
        assert_eq!(suite.dangling().ordinal(), 0);
        assert!(suite.dangling().name().is_none());
        assert!(!suite.dangling().has_body());
        assert_eq!(suite.active_test().ordinal(), 0);
        assert!(suite.name().is_none());
        assert!(suite.all_passed());
    }

    #[test]
    fn name_and_comment_are_copied_verbatim() {
        let suite = Suite::with_sink(
            SuiteOptions::from_bits(0b101),
            Some("Main"),
            Some("Test suite."),
            Box::new(NullSink),
        )
        .unwrap();
        assert_eq!(suite.name(), Some("Main"));
        assert_eq!(suite.comment(), Some("Test suite."));
        assert_eq!(suite.options().bits(), 0b101);
        assert!(suite.options().contains(SuiteOptions::from_bits(0b100)));
        assert!(suite.options().contains(SuiteOptions::NONE));
    }

    #[test]
    fn dangling_checks_accumulate_on_dangling_record() {
        let mut suite = quiet_suite(None);
        let calls = [true, false, true, true, false];
        for (i, cond) in calls.iter().enumerate() {
            suite.record_check(*cond, Some(&format!("check {i}")));
        }
        assert_eq!(suite.check_count(), 5);
        assert_eq!(suite.success_count(), 3);
        assert_eq!(suite.dangling().check_count(), 5);
        assert_eq!(suite.dangling().success_count(), 3);
        assert_eq!(suite.dangling().checks().len(), 5);
        assert!(!suite.all_passed());
    }

    #[test]
    fn sequence_numbers_are_one_based_and_in_recording_order() {
        let mut suite = quiet_suite(None);
        suite.record_check(true, None);
        suite.record_check(false, Some(""));
        suite.record_check(true, Some("third"));

        let checks = suite.dangling().checks();
        let numbers: Vec<u32> = checks.iter().map(Check::sequence_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(checks[0].comment(), None);
        assert_eq!(checks[1].comment(), Some(""));
        assert_eq!(checks[2].comment(), Some("third"));
        assert!(!checks[1].result());
        assert_eq!(suite.dangling().failures().count(), 1);
    }

    #[test]
    fn registered_tests_get_sequential_ordinals() {
        let mut suite = quiet_suite(None);
        suite.register_test(None, Some("first"), Some("the first one"));
        suite.add_test("second", |_suite| {});
        suite.register_test(None, None, None);

        assert_eq!(suite.test_count(), 4);
        let ordinals: Vec<u32> = suite.registered_tests().iter().map(|t| t.ordinal()).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
        assert_eq!(suite.registered_tests()[0].comment(), Some("the first one"));
        assert!(suite.registered_tests()[1].has_body());
        assert!(!suite.registered_tests()[2].has_body());
        assert!(suite.registered_tests()[2].name().is_none());
    }

    #[test]
    fn registering_tests_does_not_move_the_active_cursor() {
        let mut suite = quiet_suite(None);
        suite.add_test("t", |suite| suite.record_check(false, None));
        suite.record_check(true, Some("outside"));
        assert_eq!(suite.dangling().check_count(), 1);
        assert_eq!(suite.registered_tests()[0].check_count(), 0);
    }

    #[test]
    fn all_passed_tracks_every_record() {
        let mut suite = quiet_suite(None);
        suite.add_test("empty", |_suite| {});
        assert!(suite.all_passed());

        suite.active = 1;
        suite.record_check(false, Some("bad"));
        suite.active = DANGLING;
        assert!(!suite.all_passed());
        assert!(suite.dangling().passed());
    }

    #[test]
    fn hooks_are_declared_but_unsupported() {
        let sink = MemorySink::new();
        let mut suite =
            Suite::with_sink(SuiteOptions::NONE, None, None, Box::new(sink.clone())).unwrap();
        let err = suite.add_hook(HookKind::BeforeEach, || {}).unwrap_err();
        assert_eq!(err, HookError::Unsupported(HookKind::BeforeEach));
        assert!(sink.is_empty());
    }
}
