use std::path::PathBuf;

use isocheck_core::SuiteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Suite(#[from] SuiteError),
    #[error("no report fixture named '{0}'")]
    UnknownFixture(String),
    #[error("{failed} of {total} report fixtures differ from their expected text")]
    FixtureMismatch { failed: usize, total: usize },
    #[error("{0} artifacts no longer match their recorded digest")]
    StaleArtifacts(usize),
    #[error("{}: {errors} invalid entries in {lines} lines", path.display())]
    InvalidLog {
        path: PathBuf,
        lines: usize,
        errors: usize,
    },
}
