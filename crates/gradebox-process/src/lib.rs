//! gradebox-process: drive an untrusted program over pipes.
//!
//! This crate starts a child program, feeds its stdin, reads its stdout line
//! by line under a deadline and collects how it terminated. It is the engine
//! under a black-box grading harness:
//!
//! - **Launch** - fork/exec with a close-on-exec sync pipe, so a failed exec
//!   is an error from `spawn`, never a half-started process
//! - **I/O** - full writes to stdin, buffered line reads from stdout with one
//!   cumulative timeout per call
//! - **Lifecycle** - blocking or polled waits with cached status, and
//!   teardown that kills and reaps a child nobody collected
//! - **Temp files** - uniquely named input files with a permission mode
//!
//! stderr is inherited, not captured. Nothing here isolates the child.
//!
//! ## Quick Start
//!
//! ```ignore
//! use gradebox_process::{Process, Timeout};
//!
//! let mut child = Process::spawn("./submission", ["--greet"])?;
//! assert_eq!(child.read_line(Timeout::secs(30))?.as_deref(), Some("Hello world!"));
//! child.close_input();
//! assert_eq!(child.wait_code(Timeout::secs(2))?, 0);
//! ```

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod buffer;
pub mod error;
pub mod launch;
pub mod pipe;
pub mod process;
mod spawn;
pub mod status;
mod sys;
pub mod temp;
pub mod timeout;

pub use buffer::LineBuffer;
pub use error::ProcessError;
pub use launch::{DEFAULT_POLL_INTERVAL, DEFAULT_READ_CHUNK, Launch, MIN_POLL_INTERVAL};
pub use process::Process;
pub use status::{ExitStatus, SIGNALED_EXIT_CODE, Status};
pub use temp::{FileMode, TempFile, TempFiles, remove_file};
pub use timeout::Timeout;
