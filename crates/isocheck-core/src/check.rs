//! The atomic unit of record: one boolean assertion result.

/// A single recorded check.
///
/// Checks are immutable once created and owned by the [`TestRecord`](crate::TestRecord) that
/// was active when they were recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    result: bool,
    comment: Option<String>,
    sequence_number: u32,
}

impl Check {
    pub(crate) fn new(result: bool, comment: Option<String>, sequence_number: u32) -> Self {
        Self {
            result,
            comment,
            sequence_number,
        }
    }

    /// Whether the checked condition held.
    #[must_use]
    pub fn result(&self) -> bool {
        self.result
    }

    /// Free-text comment supplied by the caller, if any.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// 1-based position of this check within its owning test.
    #[must_use]
    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }
}
