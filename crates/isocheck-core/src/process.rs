//! Process isolation primitives: pipes, `fork`, and wait-status decoding.
//!
//! This is the only module of the crate that calls into `libc`. Everything it hands back is an
//! owned descriptor or a handle that must be reaped, so no raw fd escapes.

use std::fs::File;
use std::io::{self, Write};
use std::os::fd::{FromRawFd, OwnedFd};
use std::panic::{self, AssertUnwindSafe};

// ---------------------------------------------------------------------------
// Wait-status decoding (glibc bit layout)
// ---------------------------------------------------------------------------

/// True if the child terminated normally (via `_exit` or `exit`).
#[must_use]
pub const fn wifexited(status: i32) -> bool {
    (status & 0x7f) == 0
}

/// Exit code of a normally-terminated child (valid only when `wifexited`).
#[must_use]
pub const fn wexitstatus(status: i32) -> i32 {
    (status >> 8) & 0xff
}

/// True if the child was killed by a signal.
#[must_use]
pub const fn wifsignaled(status: i32) -> bool {
    let low7 = status & 0x7f;
    low7 != 0 && low7 != 0x7f
}

/// Signal number that killed the child (valid only when `wifsignaled`).
#[must_use]
pub const fn wtermsig(status: i32) -> i32 {
    status & 0x7f
}

/// How a reaped child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Normal exit with the given code.
    Exited(i32),
    /// Killed by the given signal.
    Signaled(i32),
    /// Any other status word (only reachable with job-control wait flags).
    Other(i32),
}

impl Termination {
    #[must_use]
    pub const fn from_wait_status(status: i32) -> Self {
        if wifexited(status) {
            Self::Exited(wexitstatus(status))
        } else if wifsignaled(status) {
            Self::Signaled(wtermsig(status))
        } else {
            Self::Other(status)
        }
    }
}

// ---------------------------------------------------------------------------
// Pipe
// ---------------------------------------------------------------------------

/// Both ends of a freshly created unidirectional pipe.
#[derive(Debug)]
pub struct Pipe {
    pub read: OwnedFd,
    pub write: OwnedFd,
}

/// `pipe()`: create a unidirectional byte channel.
pub fn pipe() -> io::Result<Pipe> {
    let mut fds = [0 as libc::c_int; 2];
    // SAFETY: fds is a valid, writable [c_int; 2].
    let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: pipe() succeeded, so both descriptors are open and owned by nobody else.
    let (read, write) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };
    Ok(Pipe { read, write })
}

// ---------------------------------------------------------------------------
// Fork / wait
// ---------------------------------------------------------------------------

/// A forked child that has not been reaped yet.
#[derive(Debug)]
#[must_use = "a child process must be waited on"]
pub struct ChildProcess {
    pid: libc::pid_t,
}

impl ChildProcess {
    /// Block until the child terminates and decode its status. Retries on `EINTR`.
    pub fn wait(self) -> io::Result<Termination> {
        let mut status: libc::c_int = 0;
        loop {
            // SAFETY: status is a valid out-pointer and pid names our own unreaped child.
            let rc = unsafe { libc::waitpid(self.pid, &mut status, 0) };
            if rc == self.pid {
                return Ok(Termination::from_wait_status(status));
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }
}

/// Fork a child that writes into `pipe.write` and hand the read end back to the parent.
///
/// Pending stdout is flushed in the parent before forking. The child never takes a std stdio
/// lock on its own: another thread may have held it at fork time, and that thread does not
/// exist in the child. Output a body leaves unflushed is discarded.
///
/// In the child: the read end is closed, `child` runs with the write end, and the process leaves
/// through `_exit` with the returned code, so no destructor or `atexit` handler inherited from
/// the parent runs twice. A panic inside `child` aborts the process.
///
/// In the parent: the write end is closed immediately, so end-of-file on the returned reader
/// means the child is gone or has closed its end.
pub fn fork_with_pipe<F>(pipe: Pipe, child: F) -> io::Result<(ChildProcess, File)>
where
    F: FnOnce(File) -> i32,
{
    let Pipe { read, write } = pipe;
    let _ = io::stdout().flush();

    // SAFETY: fork has no memory-safety preconditions of its own. The child only touches its
    // private copy of the address space and leaves via `_exit`/`abort` without returning into
    // the parent's call stack.
    let pid = unsafe { libc::fork() };
    match pid {
        -1 => Err(io::Error::last_os_error()),
        0 => {
            drop(read);
            let writer = File::from(write);
            let code = match panic::catch_unwind(AssertUnwindSafe(|| child(writer))) {
                Ok(code) => code,
                Err(_) => abort_child(),
            };
            exit_child(code)
        }
        pid => {
            drop(write);
            Ok((ChildProcess { pid }, File::from(read)))
        }
    }
}

/// Leave the child immediately with `code`.
fn exit_child(code: i32) -> ! {
    // SAFETY: _exit never returns and skips every user-space teardown.
    unsafe { libc::_exit(code) }
}

/// Terminate the child abnormally (`SIGABRT`).
pub fn abort_child() -> ! {
    std::process::abort()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
