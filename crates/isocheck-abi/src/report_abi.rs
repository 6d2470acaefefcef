//! ABI layer for the plain-text reports (written to stdout).

use isocheck_core::Suite;
use isocheck_core::report::{self, ReportLevel};

/// # Safety
///
/// `suite` must be NULL or a live handle.
unsafe fn print(suite: *const Suite, level: ReportLevel) {
    let Some(suite) = (unsafe { suite.as_ref() }) else {
        return;
    };
    if let Err(err) = report::print_report(suite, level) {
        eprintln!("isocheck_report: {err}");
    }
}

/// Print suite and test identities with their success fractions.
///
/// # Safety
///
/// `suite` must be NULL or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn isocheck_report_basic(suite: *const Suite) {
    unsafe { print(suite, ReportLevel::Basic) };
}

/// Print the basic report plus one line per failed check.
///
/// # Safety
///
/// `suite` must be NULL or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn isocheck_report_standard(suite: *const Suite) {
    unsafe { print(suite, ReportLevel::Standard) };
}
