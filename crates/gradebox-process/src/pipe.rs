//! Pipes connecting the harness to its child.
//!
//! ## Pipes
//!
//! - **stdin**: Parent writes → Child reads
//! - **stdout**: Child writes → Parent reads
//! - **sync**: Child writes an errno if `execv` fails; closed by exec on success
//!
//! Every end is created `O_CLOEXEC`. The child's `dup2` onto fd 0/1 clears
//! the flag on the copies it keeps, so no other descriptor survives exec and
//! a successful exec closes the sync pipe's write end.
//!
//! ## Pipe Hygiene
//!
//! After `fork()`, each side must drop the ends it does not use:
//! - Parent drops: stdin.read, stdout.write, sync.write
//! - Child closes: stdin.write, stdout.read, sync.read
//!
//! EOF on stdout and on the sync pipe is only observed once ALL write ends
//! are closed, so a leaked parent-side write end turns into a hang.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

/// Unidirectional pipe.
#[derive(Debug)]
pub struct Pipe {
    pub read: OwnedFd,
    pub write: OwnedFd,
}

impl Pipe {
    pub fn new() -> io::Result<Self> {
        let mut fds = [0i32; 2];
        // SAFETY: pipe2 writes to valid array.
        if unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) } != 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: On success, fds are valid file descriptors.
        Ok(Self {
            read: unsafe { OwnedFd::from_raw_fd(fds[0]) },
            write: unsafe { OwnedFd::from_raw_fd(fds[1]) },
        })
    }

    #[inline]
    pub fn read_fd(&self) -> RawFd {
        self.read.as_raw_fd()
    }

    #[inline]
    pub fn write_fd(&self) -> RawFd {
        self.write.as_raw_fd()
    }
}

/// All pipes for one child.
///
/// Construction is all-or-nothing: if a later pipe fails, the ones already
/// created are dropped and closed on the way out.
#[derive(Debug)]
pub struct Pipes {
    pub stdin: Pipe,
    pub stdout: Pipe,
    pub sync: Pipe,
}

impl Pipes {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            stdin: Pipe::new()?,
            stdout: Pipe::new()?,
            sync: Pipe::new()?,
        })
    }
}
