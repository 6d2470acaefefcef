//! Report fixtures: declarative suites paired with the exact report text they must produce.

use std::path::Path;
use std::rc::Rc;

use isocheck_core::report::{self, ReportLevel};
use isocheck_core::{NullSink, Suite, SuiteError, SuiteOptions, TestBody};
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

const BUILTIN_FIXTURES: &str = include_str!("../fixtures/report_fixtures.json");

/// Report level as spelled in fixture files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureLevel {
    Basic,
    Standard,
}

impl From<FixtureLevel> for ReportLevel {
    fn from(level: FixtureLevel) -> Self {
        match level {
            FixtureLevel::Basic => Self::Basic,
            FixtureLevel::Standard => Self::Standard,
        }
    }
}

/// Suite identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// One check to record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSpec {
    pub result: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// How a fixture test body finishes after recording its checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ending {
    #[default]
    Normal,
    Abort,
    Panic,
    /// `exit(0)` before the results are sent.
    Exit,
}

/// A registered test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// `false` registers the test without a body.
    #[serde(default = "default_true")]
    pub body: bool,
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
    #[serde(default)]
    pub ending: Ending,
}

fn default_true() -> bool {
    true
}

impl TestSpec {
    fn to_body(&self) -> TestBody {
        let checks = self.checks.clone();
        let ending = self.ending;
        Rc::new(move |suite: &mut Suite| {
            for check in &checks {
                suite.record_check(check.result, check.comment.as_deref());
            }
            match ending {
                Ending::Normal => {}
                Ending::Abort => std::process::abort(),
                Ending::Panic => panic!("fixture body panicked"),
                Ending::Exit => std::process::exit(0),
            }
        })
    }
}

/// A suite description and the report it must render to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFixture {
    pub id: String,
    pub level: FixtureLevel,
    #[serde(default)]
    pub suite: SuiteSpec,
    /// Checks recorded outside any test, before the run.
    #[serde(default)]
    pub dangling: Vec<CheckSpec>,
    /// Tests registered and run in order.
    #[serde(default)]
    pub tests: Vec<TestSpec>,
    pub expected_lines: Vec<String>,
}

/// Result of rendering a fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureVerdict {
    pub id: String,
    pub matched: bool,
    pub expected: String,
    pub actual: String,
}

impl ReportFixture {
    /// Expected report text, newline-terminated.
    #[must_use]
    pub fn expected(&self) -> String {
        let mut text = self.expected_lines.join("\n");
        text.push('\n');
        text
    }

    /// Build the described suite, running its tests when there are any.
    pub fn build(&self) -> Result<Suite, SuiteError> {
        let mut suite = Suite::with_sink(
            SuiteOptions::NONE,
            self.suite.name.as_deref(),
            self.suite.comment.as_deref(),
            Box::new(NullSink),
        )?;
        for check in &self.dangling {
            suite.record_check(check.result, check.comment.as_deref());
        }
        for test in &self.tests {
            let body = test.body.then(|| test.to_body());
            suite.register_test(body, test.name.as_deref(), test.comment.as_deref());
        }
        if !self.tests.is_empty() {
            suite.run_tests();
        }
        Ok(suite)
    }

    pub fn render(&self) -> Result<String, SuiteError> {
        Ok(report::render(&self.build()?, self.level.into()))
    }

    pub fn verify(&self) -> Result<FixtureVerdict, SuiteError> {
        let actual = self.render()?;
        let expected = self.expected();
        Ok(FixtureVerdict {
            id: self.id.clone(),
            matched: actual == expected,
            expected,
            actual,
        })
    }
}

/// A collection of report fixtures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFixtureSet {
    /// Schema version.
    pub version: String,
    pub family: String,
    pub cases: Vec<ReportFixture>,
}

impl ReportFixtureSet {
    /// Load fixture set from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load fixture set from a file path.
    pub fn from_file(path: &Path) -> Result<Self, HarnessError> {
        let content = std::fs::read_to_string(path)?;
        let set = Self::from_json(&content)?;
        Ok(set)
    }

    /// The fixtures shipped with this crate.
    pub fn builtin() -> Result<Self, serde_json::Error> {
        Self::from_json(BUILTIN_FIXTURES)
    }

    /// Look up a case by id.
    #[must_use]
    pub fn case(&self, id: &str) -> Option<&ReportFixture> {
        self.cases.iter().find(|case| case.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_fixtures_parse() {
        let set = ReportFixtureSet::builtin().unwrap();
        assert_eq!(set.family, "report");
        assert!(set.cases.len() >= 6);
        let mut ids: Vec<&str> = set.cases.iter().map(|c| c.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), set.cases.len(), "fixture ids must be unique");
    }

    #[test]
    fn defaults_apply_to_sparse_cases() {
        let json = r#"{"version":"1","family":"report","cases":[
            {"id":"x","level":"basic","tests":[{"checks":[{"result":true}]}],"expected_lines":["Main"]}
        ]}"#;
        let set = ReportFixtureSet::from_json(json).unwrap();
        let case = set.case("x").unwrap();
        assert!(case.suite.name.is_none());
        assert!(case.dangling.is_empty());
        assert!(case.tests[0].body);
        assert_eq!(case.tests[0].ending, Ending::Normal);
        assert_eq!(case.expected(), "Main\n");
    }

    #[test]
    fn dangling_only_case_renders_without_running() {
        let set = ReportFixtureSet::builtin().unwrap();
        let verdict = set.case("standard_c").unwrap().verify().unwrap();
        assert!(verdict.matched, "{}", verdict.actual);
    }

    #[test]
    fn fixture_file_loads_like_the_builtin_set() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/report_fixtures.json");
        let from_disk = ReportFixtureSet::from_file(&path).unwrap();
        let builtin = ReportFixtureSet::builtin().unwrap();
        assert_eq!(from_disk.cases.len(), builtin.cases.len());
        assert_eq!(from_disk.cases[0].expected(), builtin.cases[0].expected());
    }

    #[test]
    fn missing_fixture_file_is_an_io_error() {
        let err = ReportFixtureSet::from_file(Path::new("/nonexistent/fixtures.json")).unwrap_err();
        assert!(matches!(err, HarnessError::Io(_)));
    }
}
