//! Error types for gradebox.

use gradebox_process::ProcessError;
use thiserror::Error;

/// Main error type for harness operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("process: {0}")]
    Process(#[from] ProcessError),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True if a read or wait ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Process(e) if e.is_timeout())
    }
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, Error>;
