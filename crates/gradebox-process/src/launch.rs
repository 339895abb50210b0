//! Launch configuration.
//!
//! A `Launch` describes the program to start and how its handle behaves.
//!
//! ## Example
//!
//! ```ignore
//! use gradebox_process::{Launch, Timeout};
//!
//! let mut process = Launch::new("./submission")
//!     .arg("--verbose")
//!     .poll_interval(Duration::from_millis(20))
//!     .spawn()?;
//! let line = process.read_line(Timeout::secs(5))?;
//! ```
//!
//! ## Defaults
//!
//! | Field | Default |
//! |-------|---------|
//! | `args` | none |
//! | `read_chunk` | 4096 bytes |
//! | `poll_interval` | 100 ms |
//!
//! Out-of-range values are clamped when the process starts, whether they
//! came through the builder or were assigned to the fields directly:
//! `read_chunk` to at least one byte, `poll_interval` to at least
//! [`MIN_POLL_INTERVAL`].

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ProcessError;
use crate::process::Process;

/// Size of one raw read from the child's stdout.
pub const DEFAULT_READ_CHUNK: usize = 4096;

/// Sleep between status checks in a timed wait.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Floor for `poll_interval`, so a timed wait never spins on `waitpid`.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct Launch {
    /// Executable path. Not searched in `PATH`.
    pub program: PathBuf,
    /// Arguments after `argv[0]`, which is always `program`.
    pub args: Vec<OsString>,
    pub read_chunk: usize,
    pub poll_interval: Duration,
}

impl Launch {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            read_chunk: DEFAULT_READ_CHUNK,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Raw read size; clamped to at least one byte.
    pub fn read_chunk(mut self, bytes: usize) -> Self {
        self.read_chunk = bytes.max(1);
        self
    }

    /// Sleep between status checks; clamped to [`MIN_POLL_INTERVAL`].
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// The settings actually used, with direct field assignments clamped.
    pub(crate) fn normalized(mut self) -> Self {
        self.read_chunk = self.read_chunk.max(1);
        self.poll_interval = self.poll_interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Start the program. Returns only once the child runs the target.
    pub fn spawn(self) -> Result<Process, ProcessError> {
        Process::launch(self)
    }
}
