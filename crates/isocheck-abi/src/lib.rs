//! # isocheck-abi
//!
//! `extern "C"` boundary for isocheck.
//!
//! This crate produces a `cdylib` exposing the suite operations to C callers through an opaque
//! `isocheck_suite *` handle (see `include/isocheck.h`). Every entry point accepts a NULL
//! handle and does nothing with it.
//!
//! # Architecture
//!
//! ```text
//! C caller -> ABI entry (this crate) -> isocheck-core Suite -> fork per test -> report on stdout
//! ```
//!
//! Strings cross the boundary as NUL-terminated byte strings; bytes that are not UTF-8 are
//! replaced with U+FFFD when copied.

mod cstr;
pub mod report_abi;
pub mod suite_abi;

pub use report_abi::{isocheck_report_basic, isocheck_report_standard};
pub use suite_abi::{
    IsocheckHookFn, IsocheckTestFn, ISOCHECK_HOOK_BEFORE_EACH, ISOCHECK_OPT_NONE,
    isocheck_add_hook, isocheck_add_test, isocheck_all_tests_passed, isocheck_check,
    isocheck_free, isocheck_init, isocheck_run_tests,
};
