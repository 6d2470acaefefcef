//! Test records: a named group of checks produced by one body.

use std::fmt;
use std::rc::Rc;

use crate::check::Check;
use crate::suite::Suite;

/// Callable run inside the isolated child. It records checks through the suite it receives.
pub type TestBody = Rc<dyn Fn(&mut Suite)>;

/// A registered test and the checks attributed to it.
pub struct TestRecord {
    pub(crate) name: Option<String>,
    pub(crate) comment: Option<String>,
    pub(crate) body: Option<TestBody>,
    pub(crate) ordinal: u32,
    pub(crate) success_count: u32,
    pub(crate) check_count: u32,
    pub(crate) checks: Vec<Check>,
}

impl TestRecord {
    pub(crate) fn new(
        body: Option<TestBody>,
        name: Option<String>,
        comment: Option<String>,
        ordinal: u32,
    ) -> Self {
        Self {
            name,
            comment,
            body,
            ordinal,
            success_count: 0,
            check_count: 0,
            checks: Vec::new(),
        }
    }

    /// Test name, if one was given at registration.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Test description, if one was given at registration.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Number of tests registered before this one (the dangling record is 0).
    #[must_use]
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    #[must_use]
    pub fn success_count(&self) -> u32 {
        self.success_count
    }

    #[must_use]
    pub fn check_count(&self) -> u32 {
        self.check_count
    }

    /// Stored checks in recording order.
    #[must_use]
    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Stored checks that failed, in recording order.
    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|check| !check.result())
    }

    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// True when every counted check succeeded (vacuously true for 0/0).
    #[must_use]
    pub fn passed(&self) -> bool {
        self.success_count == self.check_count
    }
}

impl fmt::Debug for TestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestRecord")
            .field("name", &self.name)
            .field("comment", &self.comment)
            .field("has_body", &self.body.is_some())
            .field("ordinal", &self.ordinal)
            .field("success_count", &self.success_count)
            .field("check_count", &self.check_count)
            .field("checks", &self.checks)
            .finish()
    }
}
