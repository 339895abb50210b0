//! Error type for process operations.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use rustix::io::Errno;
use thiserror::Error;

/// Error while spawning, driving or waiting on a child.
///
/// End of stream is not an error: reads report it as `Ok(None)`. A child
/// killed by a signal is not an error either; see
/// [`ExitStatus::Signaled`](crate::ExitStatus::Signaled).
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("pipe: {0}")]
    Pipe(io::Error),

    #[error("fork: {0}")]
    Fork(Errno),

    #[error("argument contains a nul byte: {0:?}")]
    NulByte(String),

    #[error("exec {}: {errno}", path.display())]
    Exec { path: PathBuf, errno: Errno },

    #[error("indeterminate startup: {0}")]
    Startup(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("wait: {0}")]
    Wait(Errno),

    #[error("io: {0}")]
    Io(#[from] io::Error),
}

impl ProcessError {
    /// True for a spent time budget, as opposed to a broken channel.
    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// True if the child never started running the target program.
    #[inline]
    pub fn is_launch(&self) -> bool {
        matches!(
            self,
            Self::Pipe(_) | Self::Fork(_) | Self::NulByte(_) | Self::Exec { .. } | Self::Startup(_)
        )
    }
}
