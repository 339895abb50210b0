//! Termination status of a child.
//!
//! ## Exit Detection
//!
//! Raw `waitpid` statuses are decoded into:
//! - `Exited` - Normal exit with exit code
//! - `Signaled` - Killed by signal, with the core dump flag
//!
//! A [`Status`] stays `Unknown` until a wait actually collects the child;
//! a timed-out wait leaves it that way.

use std::fmt;

use rustix::io::Errno;

/// Code reported by [`ExitStatus::code`] for a child killed by a signal.
pub const SIGNALED_EXIT_CODE: i32 = libc::EXIT_FAILURE;

/// How a collected child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Exited(i32),
    Signaled { signal: i32, core_dumped: bool },
}

impl ExitStatus {
    /// Decode a raw `waitpid` status. `None` for stop/continue reports.
    pub fn from_raw(status: libc::c_int) -> Option<Self> {
        if libc::WIFEXITED(status) {
            Some(Self::Exited(libc::WEXITSTATUS(status)))
        } else if libc::WIFSIGNALED(status) {
            Some(Self::Signaled {
                signal: libc::WTERMSIG(status),
                core_dumped: libc::WCOREDUMP(status),
            })
        } else {
            None
        }
    }

    /// Conventional exit code. A signal collapses to [`SIGNALED_EXIT_CODE`].
    #[inline]
    pub fn code(&self) -> i32 {
        match *self {
            Self::Exited(code) => code,
            Self::Signaled { .. } => SIGNALED_EXIT_CODE,
        }
    }

    #[inline]
    pub fn success(&self) -> bool {
        *self == Self::Exited(0)
    }

    #[inline]
    pub fn signal(&self) -> Option<i32> {
        match *self {
            Self::Exited(_) => None,
            Self::Signaled { signal, .. } => Some(signal),
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Exited(code) => write!(f, "exit code {code}"),
            Self::Signaled {
                signal,
                core_dumped: false,
            } => write!(f, "killed by signal {signal}"),
            Self::Signaled {
                signal,
                core_dumped: true,
            } => write!(f, "killed by signal {signal} (core dumped)"),
        }
    }
}

/// Collection state of a child, assigned once by a successful or failed wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Unknown,
    Exited(i32),
    Signaled { signal: i32, core_dumped: bool },
    WaitError(Errno),
}

impl Status {
    #[inline]
    pub fn is_unknown(&self) -> bool {
        *self == Self::Unknown
    }

    /// The collected termination, if there is one.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        match *self {
            Self::Exited(code) => Some(ExitStatus::Exited(code)),
            Self::Signaled {
                signal,
                core_dumped,
            } => Some(ExitStatus::Signaled {
                signal,
                core_dumped,
            }),
            Self::Unknown | Self::WaitError(_) => None,
        }
    }
}

impl From<ExitStatus> for Status {
    fn from(exit: ExitStatus) -> Self {
        match exit {
            ExitStatus::Exited(code) => Self::Exited(code),
            ExitStatus::Signaled {
                signal,
                core_dumped,
            } => Self::Signaled {
                signal,
                core_dumped,
            },
        }
    }
}
