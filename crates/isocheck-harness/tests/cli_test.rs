//! Integration test: `harness` command line
//!
//! Validates that:
//! 1. `selftest --log --artifact-index` writes a valid log and a matching artifact index.
//! 2. `validate-log` accepts that log and rejects a malformed one.
//! 3. `validate-log --artifact-index` notices a log edited after indexing.
//! 4. `check-fixtures` verifies the built-in set, a fixture file, or one named case.
//! 5. `demo` prints the report of every demo suite, crashes included.
//!
//! Run: cargo test -p isocheck-harness --test cli_test

use std::path::PathBuf;
use std::process::Command;

use isocheck_harness::ReportFixtureSet;
use isocheck_harness::structured_log::{ArtifactIndex, validate_log_file};

fn harness() -> Command {
    Command::new(env!("CARGO_BIN_EXE_harness"))
}

fn temp_dir(prefix: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{prefix}-{}-{nanos}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn selftest_writes_log_and_index() {
    let dir = temp_dir("isocheck-cli-selftest");
    let log = dir.join("selftest.jsonl");
    let index = dir.join("artifacts.json");

    let output = harness()
        .args(["selftest", "--report", "standard", "--log"])
        .arg(&log)
        .arg("--artifact-index")
        .arg(&index)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("isocheck selftest\n"), "{stdout}");
    assert!(!stdout.contains("Check failed"), "{stdout}");

    let (lines, errors) = validate_log_file(&log).unwrap();
    assert!(errors.is_empty(), "{errors:?}");
    assert!(lines > 2);
    let content = std::fs::read_to_string(&log).unwrap();
    assert!(content.lines().next().unwrap().contains("\"run_start\""));
    assert!(content.lines().last().unwrap().contains("\"suite_result\""));

    let index: ArtifactIndex =
        serde_json::from_str(&std::fs::read_to_string(&index).unwrap()).unwrap();
    assert_eq!(index.artifacts.len(), 1);
    assert!(index.verify().is_empty());

    let validated = harness().arg("validate-log").arg("--log").arg(&log).status().unwrap();
    assert!(validated.success());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn validate_log_rejects_malformed_entries() {
    let dir = temp_dir("isocheck-cli-invalid");
    let log = dir.join("bad.jsonl");
    std::fs::write(
        &log,
        "{\"timestamp\":\"x\",\"trace_id\":\"nope\",\"level\":\"loud\",\"event\":\"e\"}\n",
    )
    .unwrap();

    let output = harness().arg("validate-log").arg("--log").arg(&log).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid level"), "{stderr}");
    assert!(stderr.contains("trace_id"), "{stderr}");

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn validate_log_reports_stale_artifacts() {
    let dir = temp_dir("isocheck-cli-stale");
    let log = dir.join("selftest.jsonl");
    let index = dir.join("artifacts.json");

    let status = harness()
        .args(["selftest", "--log"])
        .arg(&log)
        .arg("--artifact-index")
        .arg(&index)
        .env("ISOCHECK_DIAGNOSTICS", "off")
        .output()
        .unwrap()
        .status;
    assert!(status.success());

    let fresh = harness()
        .arg("validate-log")
        .arg("--log")
        .arg(&log)
        .arg("--artifact-index")
        .arg(&index)
        .output()
        .unwrap();
    assert!(fresh.status.success());
    assert!(String::from_utf8_lossy(&fresh.stderr).contains("1 artifacts verified"));

    // Drop the last entry: the log stays valid but no longer matches its digest.
    let content = std::fs::read_to_string(&log).unwrap();
    let kept: Vec<&str> = content.lines().collect();
    std::fs::write(&log, format!("{}\n", kept[..kept.len() - 1].join("\n"))).unwrap();

    let stale = harness()
        .arg("validate-log")
        .arg("--log")
        .arg(&log)
        .arg("--artifact-index")
        .arg(&index)
        .output()
        .unwrap();
    assert!(!stale.status.success());
    let stderr = String::from_utf8_lossy(&stale.stderr);
    assert!(stderr.contains("entries valid"), "{stderr}");
    assert!(stderr.contains(&format!("digest mismatch: {}", log.display())), "{stderr}");
    assert!(stderr.contains("1 artifacts no longer match"), "{stderr}");

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn check_fixtures_accepts_the_builtin_set() {
    let output = harness().arg("check-fixtures").output().unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ok      standard_a\n"), "{stderr}");
    assert!(stderr.contains("report fixtures match"), "{stderr}");
    assert!(!stderr.contains("DIFFERS"), "{stderr}");
}

#[test]
fn check_fixtures_loads_a_file_and_selects_one_case() {
    let file = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/report_fixtures.json");
    let output = harness()
        .arg("check-fixtures")
        .arg("--fixtures")
        .arg(&file)
        .args(["--case", "basic_b"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr, "ok      basic_b\n1 report fixtures match\n");
}

#[test]
fn check_fixtures_rejects_unknown_case() {
    let output = harness()
        .args(["check-fixtures", "--case", "no_such_case"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no report fixture named 'no_such_case'"), "{stderr}");
}

#[test]
fn check_fixtures_shows_the_difference() {
    let dir = temp_dir("isocheck-cli-fixtures");
    let file = dir.join("fixtures.json");
    let mut set = ReportFixtureSet::builtin().unwrap();
    set.cases.retain(|case| case.id == "basic_a");
    set.cases[0].expected_lines.push("extra line".to_string());
    std::fs::write(&file, serde_json::to_string(&set).unwrap()).unwrap();

    let output = harness()
        .arg("check-fixtures")
        .arg("--fixtures")
        .arg(&file)
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("DIFFERS basic_a\n--- expected\n"), "{stderr}");
    assert!(stderr.contains("extra line\n--- actual\n"), "{stderr}");
    assert!(stderr.contains("1 of 1 report fixtures differ"), "{stderr}");

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn selftest_runs_a_fixture_file() {
    let file = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/report_fixtures.json");
    let output = harness()
        .args(["selftest", "--report", "standard", "--fixtures"])
        .arg(&file)
        .env("ISOCHECK_DIAGNOSTICS", "off")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("    report fixture standard_crash_containment\n"), "{stdout}");
}

#[test]
fn demo_reports_every_suite() {
    let output = harness()
        .args(["demo", "--report", "standard"])
        .env("ISOCHECK_DIAGNOSTICS", "off")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    for heading in [
        "Dangling and test checks",
        "One failing test",
        "Main",
        "Crash containment",
    ] {
        assert!(stdout.contains(&format!("{heading}\n")), "{heading} missing:\n{stdout}");
    }
    assert!(stdout.contains("        Check failed: \"abc\" starts with 'b'\n"));
    assert!(stdout.contains("    aborts\n        Successful checks: 0/0.\n"));
}
