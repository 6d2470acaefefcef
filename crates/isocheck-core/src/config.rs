//! Diagnostics configuration.
//!
//! The default diagnostic sink of a new suite is chosen by the `ISOCHECK_DIAGNOSTICS`
//! environment variable:
//! - `stderr` (default): one `"<operation>: <message>"` line per diagnostic on stderr.
//! - `off`: diagnostics are discarded. Counters and run summaries still reflect every failure.
//!
//! [`Suite::with_sink`](crate::Suite::with_sink) bypasses the variable.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::diag::{DiagnosticSink, NullSink, StderrSink};

/// Environment variable consulted on first use.
pub const DIAGNOSTICS_ENV: &str = "ISOCHECK_DIAGNOSTICS";

/// Where diagnostics of newly created suites go.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticsMode {
    #[default]
    Stderr,
    Off,
}

impl DiagnosticsMode {
    /// Parse from string (case-insensitive). Unknown values fall back to `Stderr`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "quiet" | "none" | "0" => Self::Off,
            _ => Self::Stderr,
        }
    }

    /// Build a fresh sink for this mode.
    #[must_use]
    pub fn sink(self) -> Box<dyn DiagnosticSink> {
        match self {
            Self::Stderr => Box::new(StderrSink),
            Self::Off => Box::new(NullSink),
        }
    }
}

// 0 = unresolved, 1 = Stderr, 2 = Off.
static CACHED_MODE: AtomicU8 = AtomicU8::new(MODE_UNRESOLVED);

const MODE_UNRESOLVED: u8 = 0;
const MODE_STDERR: u8 = 1;
const MODE_OFF: u8 = 2;

fn mode_to_u8(mode: DiagnosticsMode) -> u8 {
    match mode {
        DiagnosticsMode::Stderr => MODE_STDERR,
        DiagnosticsMode::Off => MODE_OFF,
    }
}

fn u8_to_mode(v: u8) -> DiagnosticsMode {
    match v {
        MODE_OFF => DiagnosticsMode::Off,
        _ => DiagnosticsMode::Stderr,
    }
}

/// Configured diagnostics mode (reads the environment once, caches thereafter).
#[must_use]
pub fn diagnostics_mode() -> DiagnosticsMode {
    let cached = CACHED_MODE.load(Ordering::Relaxed);
    if cached != MODE_UNRESOLVED {
        return u8_to_mode(cached);
    }

    let mode = std::env::var(DIAGNOSTICS_ENV)
        .map(|v| DiagnosticsMode::from_str_loose(&v))
        .unwrap_or_default();
    // A racing resolver computes the same value from the same environment.
    CACHED_MODE.store(mode_to_u8(mode), Ordering::Release);
    mode
}

/// Sink installed on suites created without an explicit one.
#[must_use]
pub fn default_sink() -> Box<dyn DiagnosticSink> {
    diagnostics_mode().sink()
}
