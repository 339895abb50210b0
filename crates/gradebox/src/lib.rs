//! gradebox: black-box test harness primitives.
//!
//! Drive a submitted program the way a grader does: start it, feed it
//! input, read its output line by line under timeouts, check how it exited.
//!
//! ## Quick Start
//!
//! ```ignore
//! use gradebox::{HarnessEnv, Timeout};
//!
//! let env = HarnessEnv::from_env();
//! let mut child = env.spawn(["--mode", "echo"])?;
//! child.send_line("ping")?;
//! assert_eq!(child.read_line_trimmed(Timeout::secs(5))?.as_deref(), Some("ping"));
//! child.close_input();
//! assert_eq!(child.wait_code(Timeout::secs(2))?, 0);
//! ```
//!
//! ## Input Files
//!
//! ```ignore
//! use gradebox::{FileMode, HarnessEnv};
//!
//! let env = HarnessEnv::from_env();
//! let input = env.temp_files().create_lines(["3", "1 2 3"], FileMode::ReadOnly)?;
//! let mut child = env.spawn([input.path()])?;
//! // ...
//! input.remove()?;
//! ```

mod env;
mod error;
mod lines;

pub use env::{
    DATA_VAR, DEFAULT_SUBMISSION, DEFAULT_TEMP_DIR, HarnessEnv, SUBMISSION_VAR, TEMP_VAR,
};
pub use error::{Error, Result};
pub use lines::{drain_lines, read_lines};

pub use gradebox_process::{
    ExitStatus, FileMode, Launch, Process, ProcessError, SIGNALED_EXIT_CODE, Status, TempFile,
    TempFiles, Timeout, remove_file,
};
