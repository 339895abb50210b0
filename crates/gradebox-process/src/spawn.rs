//! Fork/exec with deterministic launch failure reporting.
//!
//! ## Flow
//!
//! 1. Build `argv` as C strings (before fork: the child must not allocate)
//! 2. Create stdin, stdout and sync pipes
//! 3. `fork()`
//! 4. Child: close parent ends, `dup2` stdin/stdout, mark stray fds
//!    close-on-exec, `execv`
//! 5. Child on failure: write errno to the sync pipe, `_exit`
//! 6. Parent: drop child ends, read the sync pipe until EOF
//!
//! An empty read means exec closed the sync pipe, so the target program is
//! running. Four bytes are the child's errno. Anything else is an
//! indeterminate startup. On every failure path the child is reaped before
//! returning, so no zombie and no descriptor outlives the error.

use std::ffi::CString;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStrExt;

use rustix::io::Errno;
use rustix::process::{Pid, Signal, kill_process};

use crate::error::ProcessError;
use crate::launch::Launch;
use crate::pipe::{Pipe, Pipes};
use crate::sys::{self, last_errno};

/// Exit code of a child whose exec failed and whose report went through.
const EXEC_FAILED_EXIT: libc::c_int = 127;

/// Exit code of a child that could not even report its exec failure.
const SYNC_FAILED_EXIT: libc::c_int = 52;

// close_range(2) flag; marks instead of closing.
const CLOSE_RANGE_CLOEXEC: libc::c_uint = 1 << 2;

/// Parent-side handles of a freshly started child.
#[derive(Debug)]
pub(crate) struct Spawned {
    pub pid: libc::pid_t,
    pub stdin: OwnedFd,
    pub stdout: OwnedFd,
}

/// `execv` arguments, prepared before fork.
struct ExecArgs {
    path: CString,
    // Owns the strings `argv_ptrs` points into.
    _argv: Vec<CString>,
    argv_ptrs: Vec<*const libc::c_char>,
}

impl ExecArgs {
    fn new(launch: &Launch) -> Result<Self, ProcessError> {
        let path = to_cstring(launch.program.as_os_str().as_bytes())?;

        let mut argv: Vec<CString> = Vec::with_capacity(launch.args.len() + 1);
        argv.push(path.clone());
        for arg in &launch.args {
            argv.push(to_cstring(arg.as_bytes())?);
        }

        let argv_ptrs = argv
            .iter()
            .map(|s| s.as_ptr())
            .chain(std::iter::once(std::ptr::null()))
            .collect();

        Ok(Self {
            path,
            _argv: argv,
            argv_ptrs,
        })
    }
}

fn to_cstring(bytes: &[u8]) -> Result<CString, ProcessError> {
    CString::new(bytes)
        .map_err(|_| ProcessError::NulByte(String::from_utf8_lossy(bytes).into_owned()))
}

/// Outcome of the launch handshake on the sync pipe.
#[derive(Debug, PartialEq, Eq)]
enum Handshake {
    Launched,
    ExecFailed(Errno),
    Indeterminate(String),
}

pub(crate) fn spawn(launch: &Launch) -> Result<Spawned, ProcessError> {
    let exec = ExecArgs::new(launch)?;
    let pipes = Pipes::new().map_err(ProcessError::Pipe)?;

    let child_pid = unsafe { libc::fork() };
    if child_pid < 0 {
        return Err(ProcessError::Fork(last_errno()));
    }

    if child_pid == 0 {
        // SAFETY: between fork and exec only async-signal-safe calls are made.
        unsafe { exec_child(&pipes, &exec) }
    }

    let Pipes { stdin, stdout, sync } = pipes;
    let Pipe {
        read: stdin_read,
        write: stdin_write,
    } = stdin;
    let Pipe {
        read: stdout_read,
        write: stdout_write,
    } = stdout;
    let Pipe {
        read: sync_read,
        write: sync_write,
    } = sync;
    drop(stdin_read);
    drop(stdout_write);
    drop(sync_write);

    match read_handshake(sync_read.as_raw_fd()) {
        Handshake::Launched => {
            tracing::debug!(pid = child_pid, program = %launch.program.display(), "child launched");
            Ok(Spawned {
                pid: child_pid,
                stdin: stdin_write,
                stdout: stdout_read,
            })
        }
        Handshake::ExecFailed(errno) => {
            // The child is already on its way to _exit.
            reap(child_pid);
            Err(ProcessError::Exec {
                path: launch.program.clone(),
                errno,
            })
        }
        Handshake::Indeterminate(reason) => {
            if let Some(pid) = Pid::from_raw(child_pid) {
                kill_process(pid, Signal::KILL).ok();
            }
            reap(child_pid);
            Err(ProcessError::Startup(reason))
        }
    }
}

/// Read the sync pipe until EOF or a full errno has arrived.
fn read_handshake(fd: RawFd) -> Handshake {
    let mut buf = [0u8; size_of::<libc::c_int>()];
    let mut filled = 0;
    while filled < buf.len() {
        match sys::read_once(fd, &mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) => return Handshake::Indeterminate(format!("sync pipe read: {e}")),
        }
    }

    match filled {
        0 => Handshake::Launched,
        n if n == buf.len() => {
            Handshake::ExecFailed(Errno::from_raw_os_error(libc::c_int::from_ne_bytes(buf)))
        }
        n => Handshake::Indeterminate(format!("sync pipe returned {n} of {} bytes", buf.len())),
    }
}

fn reap(pid: libc::pid_t) {
    if let Err(errno) = sys::waitpid(pid, false) {
        tracing::warn!(pid, %errno, "failed to reap child after launch failure");
    }
}

/// Child side after fork. Never returns.
///
/// # Safety
///
/// Must only be called in the child of a `fork()`. Uses nothing but
/// async-signal-safe libc calls.
unsafe fn exec_child(pipes: &Pipes, exec: &ExecArgs) -> ! {
    let sync_fd = pipes.sync.write_fd();

    unsafe {
        libc::close(pipes.stdin.write_fd());
        libc::close(pipes.stdout.read_fd());
        libc::close(pipes.sync.read_fd());

        if !redirect(pipes.stdin.read_fd(), libc::STDIN_FILENO)
            || !redirect(pipes.stdout.write_fd(), libc::STDOUT_FILENO)
        {
            report_and_exit(sync_fd);
        }

        // Anything else the parent left open must not reach the target.
        libc::syscall(libc::SYS_close_range, 3u32, u32::MAX, CLOSE_RANGE_CLOEXEC);

        libc::execv(exec.path.as_ptr(), exec.argv_ptrs.as_ptr());
        report_and_exit(sync_fd)
    }
}

/// Make `fd` available as `target` across exec.
unsafe fn redirect(fd: RawFd, target: RawFd) -> bool {
    unsafe {
        if fd == target {
            // dup2 onto itself would keep FD_CLOEXEC set.
            let flags = libc::fcntl(fd, libc::F_GETFD);
            return flags >= 0 && libc::fcntl(fd, libc::F_SETFD, flags & !libc::FD_CLOEXEC) >= 0;
        }
        if libc::dup2(fd, target) < 0 {
            return false;
        }
        libc::close(fd);
        true
    }
}

/// Send the current errno up the sync pipe and exit without unwinding.
unsafe fn report_and_exit(sync_fd: RawFd) -> ! {
    unsafe {
        let bytes = (*libc::__errno_location()).to_ne_bytes();
        let written = libc::write(sync_fd, bytes.as_ptr().cast::<libc::c_void>(), bytes.len());
        if written != bytes.len() as isize {
            libc::_exit(SYNC_FAILED_EXIT);
        }
        libc::_exit(EXEC_FAILED_EXIT)
    }
}
