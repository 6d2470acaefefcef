//! Error taxonomy.
//!
//! Only suite creation and hook registration return errors to the caller. Everything else is
//! classified by [`ErrorKind`] and reported through the suite's diagnostic sink.

use std::fmt;

use thiserror::Error;

use crate::hook::HookKind;

/// Classification of every failure the harness can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A dynamic allocation could not be satisfied.
    AllocationFailure,
    /// The pipe for a test's result channel could not be created.
    ChannelCreationFailure,
    /// The child process for a test could not be created.
    IsolationSpawnFailure,
    /// The child process was killed by a signal (or could not be reaped).
    AbnormalTermination,
    /// The result stream ended before its end marker or was malformed.
    IncompleteTransfer,
}

impl ErrorKind {
    pub const ALL: [Self; 5] = [
        Self::AllocationFailure,
        Self::ChannelCreationFailure,
        Self::IsolationSpawnFailure,
        Self::AbnormalTermination,
        Self::IncompleteTransfer,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllocationFailure => "allocation_failure",
            Self::ChannelCreationFailure => "channel_creation_failure",
            Self::IsolationSpawnFailure => "isolation_spawn_failure",
            Self::AbnormalTermination => "abnormal_termination",
            Self::IncompleteTransfer => "incomplete_transfer",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Suite creation failed; the harness is unusable for that suite.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SuiteError {
    #[error("cannot allocate {what}")]
    AllocationFailure { what: &'static str },
}

impl SuiteError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AllocationFailure { .. } => ErrorKind::AllocationFailure,
        }
    }
}

/// Hook registration is declared but has no scheduler behind it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HookError {
    #[error("{0} hooks are not supported")]
    Unsupported(HookKind),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_names_are_unique() {
        let mut names: Vec<&str> = ErrorKind::ALL.iter().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ErrorKind::ALL.len());
    }

    #[test]
    fn suite_error_maps_to_allocation_kind() {
        let err = SuiteError::AllocationFailure { what: "suite name" };
        assert_eq!(err.kind(), ErrorKind::AllocationFailure);
        assert_eq!(err.to_string(), "cannot allocate suite name");
    }

    #[test]
    fn hook_error_names_the_kind() {
        let err = HookError::Unsupported(HookKind::BeforeEach);
        assert_eq!(err.to_string(), "before_each hooks are not supported");
    }
}
