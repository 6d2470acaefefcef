//! Tooling around isocheck.
//!
//! This crate provides:
//! - Self-test: the harness checking its own properties as an isolated suite
//! - Report fixtures: declarative suites with the exact report text they must render
//! - Demo suites used by `harness demo`
//! - Structured JSONL run logs, a diagnostic sink writing into them, and an artifact index

#![forbid(unsafe_code)]

pub mod demo;
pub mod error;
pub mod fixtures;
pub mod jsonl_sink;
pub mod run_log;
pub mod selftest;
pub mod structured_log;

pub use error::HarnessError;
pub use fixtures::{ReportFixture, ReportFixtureSet};
pub use jsonl_sink::JsonlSink;
pub use selftest::SelftestRun;
