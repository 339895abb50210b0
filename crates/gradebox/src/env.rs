//! Harness environment.
//!
//! The grading harness is configured through environment variables, read
//! once when a [`HarnessEnv`] is built and never again:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `SUBMISSIONPATH` | Program under test | `./submission` |
//! | `DATAPATH` | Directory of test data files | none; required by [`HarnessEnv::data`] |
//! | `TMPDIR` | Directory for temp input files | `/tmp` |
//!
//! Empty values count as unset.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use gradebox_process::{Launch, Process, TempFiles};

use crate::error::{Error, Result};

pub const SUBMISSION_VAR: &str = "SUBMISSIONPATH";
pub const DATA_VAR: &str = "DATAPATH";
pub const TEMP_VAR: &str = "TMPDIR";

pub const DEFAULT_SUBMISSION: &str = "./submission";
pub const DEFAULT_TEMP_DIR: &str = "/tmp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessEnv {
    submission: PathBuf,
    data_dir: Option<PathBuf>,
    temp_dir: PathBuf,
}

impl HarnessEnv {
    pub fn new(submission: impl Into<PathBuf>) -> Self {
        Self {
            submission: submission.into(),
            data_dir: None,
            temp_dir: PathBuf::from(DEFAULT_TEMP_DIR),
        }
    }

    /// Read the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    /// Build from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty()).map(PathBuf::from);

        let env = Self {
            submission: get(SUBMISSION_VAR).unwrap_or_else(|| PathBuf::from(DEFAULT_SUBMISSION)),
            data_dir: get(DATA_VAR),
            temp_dir: get(TEMP_VAR).unwrap_or_else(|| PathBuf::from(DEFAULT_TEMP_DIR)),
        };
        tracing::debug!(
            submission = %env.submission.display(),
            data_dir = ?env.data_dir,
            temp_dir = %env.temp_dir.display(),
            "harness environment"
        );
        env
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    #[inline]
    pub fn submission(&self) -> &Path {
        &self.submission
    }

    #[inline]
    pub fn data_root(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    #[inline]
    pub fn temp_root(&self) -> &Path {
        &self.temp_dir
    }

    /// Path of the data file `name`.
    pub fn data(&self, name: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = self
            .data_dir
            .as_ref()
            .ok_or_else(|| Error::InvalidConfig(format!("{DATA_VAR} is not set")))?;
        Ok(dir.join(name))
    }

    /// Temp file factory rooted at `TMPDIR`.
    pub fn temp_files(&self) -> TempFiles {
        TempFiles::new(&self.temp_dir)
    }

    /// Launch configuration for the submission.
    pub fn launch(&self) -> Launch {
        Launch::new(&self.submission)
    }

    /// Start the submission with `args`.
    pub fn spawn<I, S>(&self, args: I) -> Result<Process>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let launch = self
            .launch()
            .args(args.into_iter().map(|a| a.as_ref().to_os_string()));
        Ok(launch.spawn()?)
    }
}

impl Default for HarnessEnv {
    fn default() -> Self {
        Self::new(DEFAULT_SUBMISSION)
    }
}
