//! CLI entrypoint for the isocheck harness.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use isocheck_core::{ReportLevel, config, report};
use isocheck_harness::error::HarnessError;
use isocheck_harness::structured_log::{
    ArtifactIndex, LogEmitter, LogEntry, LogLevel, validate_log_file,
};
use isocheck_harness::{JsonlSink, ReportFixtureSet, demo, run_log, selftest};

/// Tooling for isocheck.
#[derive(Debug, Parser)]
#[command(name = "isocheck-harness")]
#[command(about = "Self-test, demo and log tooling for isocheck")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the harness's own checks as an isolated suite.
    Selftest {
        /// Report level (basic or standard).
        #[arg(long, default_value = "basic")]
        report: String,
        /// Report fixture JSON file (defaults to the built-in set).
        #[arg(long)]
        fixtures: Option<PathBuf>,
        /// Structured JSONL log path.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Artifact index JSON path (requires --log).
        #[arg(long, requires = "log")]
        artifact_index: Option<PathBuf>,
    },
    /// Render report fixtures and compare them with their expected text.
    CheckFixtures {
        /// Report fixture JSON file (defaults to the built-in set).
        #[arg(long)]
        fixtures: Option<PathBuf>,
        /// Only check the fixture with this id.
        #[arg(long)]
        case: Option<String>,
    },
    /// Run the demo suites and print their reports.
    Demo {
        /// Report level (basic or standard).
        #[arg(long, default_value = "standard")]
        report: String,
    },
    /// Validate a structured JSONL run log.
    ValidateLog {
        /// Structured JSONL log path.
        #[arg(long)]
        log: PathBuf,
        /// Artifact index whose digests are re-checked.
        #[arg(long)]
        artifact_index: Option<PathBuf>,
    },
}

fn run_id(prefix: &str) -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("{prefix}-{secs}-{}", std::process::id())
}

fn load_fixtures(path: Option<&Path>) -> Result<ReportFixtureSet, HarnessError> {
    match path {
        Some(path) => ReportFixtureSet::from_file(path),
        None => Ok(ReportFixtureSet::builtin()?),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Selftest {
            report: level,
            fixtures,
            log,
            artifact_index,
        } => {
            let level = ReportLevel::from_str_loose(&level);
            let fixtures = load_fixtures(fixtures.as_deref())?;
            let emitter = match &log {
                Some(path) => Some(Rc::new(RefCell::new(LogEmitter::to_file(
                    path,
                    &run_id("selftest"),
                )?))),
                None => None,
            };

            let run = match &emitter {
                Some(emitter) => {
                    emitter.borrow_mut().emit_entry(
                        LogEntry::new("", LogLevel::Info, "run_start")
                            .with_suite(selftest::SELFTEST_SUITE_NAME)
                            .with_report_level(level.as_str()),
                    )?;
                    let sink = JsonlSink::new(Rc::clone(emitter), selftest::SELFTEST_SUITE_NAME)
                        .with_stderr_echo();
                    let run = selftest::run(Box::new(sink), fixtures)?;
                    run_log::log_run(
                        &mut emitter.borrow_mut(),
                        &run.suite,
                        &run.summary,
                        run.elapsed,
                    )?;
                    run
                }
                None => selftest::run(config::default_sink(), fixtures)?,
            };

            report::print_report(&run.suite, level)?;

            if let (Some(emitter), Some(log), Some(index_path)) = (&emitter, &log, &artifact_index)
            {
                emitter.borrow_mut().flush()?;
                let mut index = ArtifactIndex::new(emitter.borrow().run_id());
                index.add_file(log, "structured_log")?;
                std::fs::write(index_path, index.to_json()?)?;
                eprintln!("Artifact index written to {}", index_path.display());
            }

            if !run.passed() {
                eprintln!(
                    "selftest FAILED: {}/{} checks passed, {} tests did not complete",
                    run.suite.success_count(),
                    run.suite.check_count(),
                    run.summary.problems().count()
                );
                std::process::exit(1);
            }
        }
        Command::CheckFixtures { fixtures, case } => {
            let set = load_fixtures(fixtures.as_deref())?;
            let cases = match &case {
                Some(id) => vec![
                    set.case(id)
                        .ok_or_else(|| HarnessError::UnknownFixture(id.clone()))?,
                ],
                None => set.cases.iter().collect(),
            };

            let mut failed = 0;
            for fixture in &cases {
                let verdict = fixture.verify()?;
                if verdict.matched {
                    eprintln!("ok      {}", verdict.id);
                } else {
                    failed += 1;
                    eprintln!("DIFFERS {}", verdict.id);
                    eprintln!("--- expected\n{}--- actual\n{}", verdict.expected, verdict.actual);
                }
            }
            if failed > 0 {
                return Err(HarnessError::FixtureMismatch {
                    failed,
                    total: cases.len(),
                }
                .into());
            }
            eprintln!("{} report fixtures match", cases.len());
        }
        Command::Demo { report: level } => {
            let level = ReportLevel::from_str_loose(&level);
            for run in demo::run_demos(config::default_sink)? {
                report::print_report(&run.suite, level)?;
                println!();
            }
        }
        Command::ValidateLog {
            log,
            artifact_index,
        } => {
            let (lines, errors) = validate_log_file(&log)?;
            for err in &errors {
                eprintln!("{err}");
            }
            if !errors.is_empty() {
                return Err(HarnessError::InvalidLog {
                    path: log,
                    lines,
                    errors: errors.len(),
                }
                .into());
            }
            eprintln!("{}: {lines} entries valid", log.display());

            if let Some(index_path) = artifact_index {
                let index: ArtifactIndex =
                    serde_json::from_str(&std::fs::read_to_string(&index_path)?)?;
                let stale = index.verify();
                for path in &stale {
                    eprintln!("digest mismatch: {path}");
                }
                if !stale.is_empty() {
                    return Err(HarnessError::StaleArtifacts(stale.len()).into());
                }
                eprintln!(
                    "{}: {} artifacts verified",
                    index_path.display(),
                    index.artifacts.len()
                );
            }
        }
    }

    Ok(())
}
