//! Temporary input files for tests.
//!
//! Files are created with a unique `test-XXXXXX` name inside an explicit
//! directory and then left alone: the caller owns removal through
//! [`remove_file`] or [`TempFile::remove`]. The directory is configuration
//! passed in by the caller; [`TempFiles::from_env`] resolves `TMPDIR`
//! (falling back to `/tmp`) once, at construction.
//!
//! ## Modes
//!
//! | Mode | Permission bits |
//! |------|-----------------|
//! | `ReadWrite` | `0600` (as created) |
//! | `ReadOnly` | `0444` |
//! | `WriteOnly` | `0222` |

use std::fs;
use std::io::{self, Write as _};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const DEFAULT_PREFIX: &str = "test-";
const RANDOM_LEN: usize = 6;

/// Access mode applied to a created file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileMode {
    #[default]
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

impl FileMode {
    /// Bits to `chmod` to, or `None` to keep the creation mode.
    fn permission_bits(self) -> Option<u32> {
        match self {
            Self::ReadWrite => None,
            Self::ReadOnly => Some(0o444),
            Self::WriteOnly => Some(0o222),
        }
    }
}

/// A created file. Not removed on drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempFile {
    path: PathBuf,
    mode: FileMode,
}

impl TempFile {
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn mode(&self) -> FileMode {
        self.mode
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }

    pub fn remove(self) -> io::Result<()> {
        remove_file(&self.path)
    }
}

impl AsRef<Path> for TempFile {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Creates uniquely named files in one directory.
#[derive(Debug, Clone)]
pub struct TempFiles {
    dir: PathBuf,
    prefix: String,
}

impl TempFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    /// Use `TMPDIR`, or `/tmp` when it is unset.
    pub fn from_env() -> Self {
        Self::new(std::env::temp_dir())
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create a file holding `content` and apply `mode`.
    ///
    /// If a step after creation fails, the file is removed again.
    pub fn create(&self, content: &[u8], mode: FileMode) -> io::Result<TempFile> {
        let mut file = tempfile::Builder::new()
            .prefix(&self.prefix)
            .rand_bytes(RANDOM_LEN)
            .tempfile_in(&self.dir)?;
        file.write_all(content)?;
        let (_, path) = file.keep()?;

        if let Some(bits) = mode.permission_bits() {
            if let Err(e) = fs::set_permissions(&path, fs::Permissions::from_mode(bits)) {
                fs::remove_file(&path).ok();
                return Err(e);
            }
        }

        tracing::trace!(path = %path.display(), ?mode, "temp file created");
        Ok(TempFile { path, mode })
    }

    /// Create a file with each line followed by `\n`.
    pub fn create_lines<I, S>(&self, lines: I, mode: FileMode) -> io::Result<TempFile>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut content = String::new();
        for line in lines {
            content.push_str(line.as_ref());
            content.push('\n');
        }
        self.create(content.as_bytes(), mode)
    }

    pub fn create_empty(&self, mode: FileMode) -> io::Result<TempFile> {
        self.create(&[], mode)
    }
}

impl Default for TempFiles {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Delete `path` and check that it is really gone.
pub fn remove_file(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    fs::remove_file(path)?;
    if path.try_exists()? {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} still exists after removal", path.display()),
        ));
    }
    Ok(())
}
