//! ABI layer for suite lifecycle, checks, tests and hooks.

use std::ffi::{c_char, c_int};
use std::rc::Rc;

use isocheck_core::{HookKind, Suite, SuiteOptions, TestBody};

use crate::cstr::opt_text;

/// No options set.
pub const ISOCHECK_OPT_NONE: u8 = 0;
/// `kind` value of a before-each-test hook.
pub const ISOCHECK_HOOK_BEFORE_EACH: c_int = 0;

/// Test body. Receives the handle of the child's private copy of the suite.
pub type IsocheckTestFn = unsafe extern "C" fn(suite: *mut Suite);
/// Hook callback.
pub type IsocheckHookFn = unsafe extern "C" fn();

// ---------------------------------------------------------------------------
// init / free
// ---------------------------------------------------------------------------

/// Create a suite. Returns NULL if it cannot be allocated.
///
/// # Safety
///
/// `name` and `comment` must each be NULL or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn isocheck_init(
    options: u8,
    name: *const c_char,
    comment: *const c_char,
) -> *mut Suite {
    let name = unsafe { opt_text(name) };
    let comment = unsafe { opt_text(comment) };
    match Suite::new(
        SuiteOptions::from_bits(options),
        name.as_deref(),
        comment.as_deref(),
    ) {
        Ok(suite) => Box::into_raw(Box::new(suite)),
        Err(err) => {
            eprintln!("isocheck_init: {err}");
            std::ptr::null_mut()
        }
    }
}

/// Release a suite and everything it owns.
///
/// # Safety
///
/// `suite` must be NULL or a handle from [`isocheck_init`] that has not been freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn isocheck_free(suite: *mut Suite) {
    if suite.is_null() {
        return;
    }
    // SAFETY: the handle came from Box::into_raw in isocheck_init and is released once.
    drop(unsafe { Box::from_raw(suite) });
}

// ---------------------------------------------------------------------------
// check / add_test
// ---------------------------------------------------------------------------

/// Record a check against the currently active test.
///
/// # Safety
///
/// `suite` must be NULL or a live handle; `comment` NULL or a valid C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn isocheck_check(suite: *mut Suite, condition: bool, comment: *const c_char) {
    let Some(suite) = (unsafe { suite.as_mut() }) else {
        return;
    };
    let comment = unsafe { opt_text(comment) };
    suite.record_check(condition, comment.as_deref());
}

/// Register a test. A NULL `test` registers a test with no body (it passes with 0/0).
///
/// # Safety
///
/// `suite` must be NULL or a live handle; `name` and `comment` NULL or valid C strings; `test`
/// must be safe to call with the suite handle it receives.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn isocheck_add_test(
    suite: *mut Suite,
    test: Option<IsocheckTestFn>,
    name: *const c_char,
    comment: *const c_char,
) {
    let Some(suite) = (unsafe { suite.as_mut() }) else {
        return;
    };
    let name = unsafe { opt_text(name) };
    let comment = unsafe { opt_text(comment) };
    let body = test.map(|func| -> TestBody {
        // SAFETY: the caller vouched for `func`; the pointer handed over is the live suite.
        Rc::new(move |suite: &mut Suite| unsafe { func(suite) })
    });
    suite.register_test(body, name.as_deref(), comment.as_deref());
}

// ---------------------------------------------------------------------------
// run / query
// ---------------------------------------------------------------------------

/// Run every registered test, each in its own child process.
///
/// # Safety
///
/// `suite` must be NULL or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn isocheck_run_tests(suite: *mut Suite) {
    if let Some(suite) = unsafe { suite.as_mut() } {
        suite.run_tests();
    }
}

/// True iff every check recorded so far succeeded. False for a NULL handle.
///
/// # Safety
///
/// `suite` must be NULL or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn isocheck_all_tests_passed(suite: *const Suite) -> bool {
    unsafe { suite.as_ref() }.is_some_and(Suite::all_passed)
}

// ---------------------------------------------------------------------------
// hooks
// ---------------------------------------------------------------------------

/// Declare a hook. Returns 0 if it was scheduled, -1 otherwise (no hook kind is currently
/// supported, so a live handle always gets -1).
///
/// # Safety
///
/// `suite` must be NULL or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn isocheck_add_hook(
    suite: *mut Suite,
    kind: c_int,
    hook: Option<IsocheckHookFn>,
) -> c_int {
    let Some(suite) = (unsafe { suite.as_mut() }) else {
        return -1;
    };
    let (Some(kind), Some(hook)) = (HookKind::from_raw(kind), hook) else {
        return -1;
    };
    // SAFETY: the caller vouched for `hook`.
    match suite.add_hook(kind, move || unsafe { hook() }) {
        Ok(()) => 0,
        Err(_) => -1,
    }
}
