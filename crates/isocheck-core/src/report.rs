//! Plain-text reports.
//!
//! Layout (indent unit is four spaces):
//!
//! ```text
//! <suite name or "Main">
//! <suite comment>                      (only if present)
//! Total successful checks: x/y.
//!     Successful checks: a/b.          (the active record, the dangling one after a run)
//!     Check failed: ...                (standard level: dangling failures)
//!
//!     <test name or "Test #n">
//!     <test comment>                   (only if present)
//!         Successful checks: a/b.
//!         Check failed: ...            (standard level)
//! ```

use std::io::{self, Write};

use crate::record::TestRecord;
use crate::suite::Suite;

/// Suite heading used when the suite has no name.
pub const DEFAULT_SUITE_NAME: &str = "Main";

const INDENTATION: &str = "    ";

/// How much detail a report carries.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportLevel {
    /// Identities and success fractions.
    #[default]
    Basic,
    /// Basic content plus one line per failed check.
    Standard,
}

impl ReportLevel {
    /// Parse from string (case-insensitive). Unknown values fall back to `Basic`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "full" | "failures" => Self::Standard,
            _ => Self::Basic,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Standard => "standard",
        }
    }
}

/// Render the report into a string.
#[must_use]
pub fn render(suite: &Suite, level: ReportLevel) -> String {
    let mut out = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_report(&mut out, suite, level);
    String::from_utf8_lossy(&out).into_owned()
}

/// Write the report to `out`.
pub fn write_report<W: Write>(out: &mut W, suite: &Suite, level: ReportLevel) -> io::Result<()> {
    writeln!(out, "{}", suite.name().unwrap_or(DEFAULT_SUITE_NAME))?;
    if let Some(comment) = suite.comment() {
        writeln!(out, "{comment}")?;
    }
    writeln!(
        out,
        "Total successful checks: {}/{}.",
        suite.success_count(),
        suite.check_count()
    )?;
    let active = suite.active_test();
    write_fraction(out, active, 1)?;
    if level == ReportLevel::Standard {
        write_failures(out, active, 1)?;
    }

    for test in suite.registered_tests() {
        write_test(out, test, 1)?;
        if level == ReportLevel::Standard {
            write_failures(out, test, 2)?;
        }
    }
    Ok(())
}

/// Print the report on stdout.
pub fn print_report(suite: &Suite, level: ReportLevel) -> io::Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write_report(&mut lock, suite, level)?;
    lock.flush()
}

fn indent<W: Write>(out: &mut W, level: usize) -> io::Result<()> {
    for _ in 0..level {
        out.write_all(INDENTATION.as_bytes())?;
    }
    Ok(())
}

fn write_fraction<W: Write>(out: &mut W, test: &TestRecord, level: usize) -> io::Result<()> {
    indent(out, level)?;
    writeln!(
        out,
        "Successful checks: {}/{}.",
        test.success_count(),
        test.check_count()
    )
}

fn write_test<W: Write>(out: &mut W, test: &TestRecord, level: usize) -> io::Result<()> {
    writeln!(out)?;
    indent(out, level)?;
    match test.name() {
        Some(name) => writeln!(out, "{name}")?,
        None => writeln!(out, "Test #{}", test.ordinal())?,
    }
    if let Some(comment) = test.comment() {
        indent(out, level)?;
        writeln!(out, "{comment}")?;
    }
    write_fraction(out, test, level + 1)
}

fn write_failures<W: Write>(out: &mut W, test: &TestRecord, level: usize) -> io::Result<()> {
    for check in test.failures() {
        indent(out, level)?;
        match check.comment() {
            Some(comment) => writeln!(out, "Check failed: {comment}")?,
            None => writeln!(out, "Check failed: Check #{}.", check.sequence_number())?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::NullSink;
    use crate::suite::{DANGLING, SuiteOptions};

    fn quiet_suite(name: Option<&str>, comment: Option<&str>) -> Suite {
        Suite::with_sink(SuiteOptions::NONE, name, comment, Box::new(NullSink)).unwrap()
    }

    #[test]
    fn parse_report_levels() {
        assert_eq!(ReportLevel::from_str_loose("basic"), ReportLevel::Basic);
        assert_eq!(ReportLevel::from_str_loose("STANDARD"), ReportLevel::Standard);
        assert_eq!(ReportLevel::from_str_loose("whatever"), ReportLevel::Basic);
        assert_eq!(ReportLevel::Standard.as_str(), "standard");
    }

    #[test]
    fn empty_unnamed_suite() {
        let suite = quiet_suite(None, None);
        assert_eq!(
            render(&suite, ReportLevel::Basic),
            "Main\nTotal successful checks: 0/0.\n    Successful checks: 0/0.\n"
        );
        assert_eq!(
            render(&suite, ReportLevel::Basic),
            render(&suite, ReportLevel::Standard)
        );
    }

    #[test]
    fn dangling_checks_in_header() {
        let mut suite = quiet_suite(Some("Suite 1"), Some("Suite 1's comment."));
        suite.record_check(true, Some("fine"));
        suite.record_check(false, None);
        assert_eq!(
            render(&suite, ReportLevel::Basic),
            "Suite 1\nSuite 1's comment.\nTotal successful checks: 1/2.\n    Successful checks: 1/2.\n"
        );
        assert_eq!(
            render(&suite, ReportLevel::Standard),
            "Suite 1\nSuite 1's comment.\nTotal successful checks: 1/2.\n    Successful checks: 1/2.\n    Check failed: Check #2.\n"
        );
    }

    #[test]
    fn tests_are_listed_in_registration_order_with_failures() {
        let mut suite = quiet_suite(None, None);
        suite.record_check(false, Some("outside"));
        suite.register_test(None, Some("first"), Some("First test."));
        suite.register_test(None, None, None);

        suite.active = 1;
        suite.record_check(true, None);
        suite.record_check(false, Some("first broke"));
        suite.active = 2;
        suite.record_check(false, None);
        suite.record_check(false, Some(""));
        suite.active = DANGLING;

        let expected = concat!(
            "Main\n",
            "Total successful checks: 1/5.\n",
            "    Successful checks: 0/1.\n",
            "    Check failed: outside\n",
            "\n",
            "    first\n",
            "    First test.\n",
            "        Successful checks: 1/2.\n",
            "        Check failed: first broke\n",
            "\n",
            "    Test #2\n",
            "        Successful checks: 0/2.\n",
            "        Check failed: Check #1.\n",
            "        Check failed: \n",
        );
        assert_eq!(render(&suite, ReportLevel::Standard), expected);

        let basic = render(&suite, ReportLevel::Basic);
        assert!(!basic.contains("Check failed"));
        assert!(basic.contains("\n    Test #2\n        Successful checks: 0/2.\n"));
    }

    #[test]
    fn write_report_matches_render() {
        let mut suite = quiet_suite(Some("S"), None);
        suite.record_check(true, None);
        let mut out = Vec::new();
        write_report(&mut out, &suite, ReportLevel::Standard).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            render(&suite, ReportLevel::Standard)
        );
    }
}
