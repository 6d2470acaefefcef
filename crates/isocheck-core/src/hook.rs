//! Hook extension point.
//!
//! Hooks are part of the public contract so callers can state their intent, but no scheduler
//! runs them: [`Suite::add_hook`](crate::Suite::add_hook) always answers
//! [`HookError::Unsupported`](crate::HookError::Unsupported).

use std::fmt;

/// When a hook would run relative to test execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Before each registered test body.
    BeforeEach,
}

impl HookKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BeforeEach => "before_each",
        }
    }

    /// Decode the C ABI discriminant.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::BeforeEach),
            _ => None,
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether any hook kind can currently be scheduled.
#[must_use]
pub const fn hooks_supported(_kind: HookKind) -> bool {
    false
}
