//! Handle to one running or finished child.
//!
//! A [`Process`] exclusively owns the write end of the child's stdin, the
//! read end of its stdout, the pid and the line buffer. Every mutating call
//! takes `&mut self`, so one handle is never driven from two threads at
//! once; separate handles are independent.
//!
//! ## Reading
//!
//! [`Process::read_line`] serves lines from the buffer first and only
//! touches the pipe when no complete line is buffered. The timeout is a
//! deadline for the whole call, charged across every `poll` it takes. A
//! timeout leaves the buffer as it was, so the next call picks up where
//! this one stopped.
//!
//! ## Teardown
//!
//! Dropping (or [`Process::close`]) closes both pipes, frees the buffer and,
//! if no wait ever collected the child, kills it with SIGKILL and reaps it.
//! Teardown never fails: problems are logged and teardown gives up rather
//! than block forever.

use std::fmt;
use std::io;
use std::os::fd::{AsRawFd, OwnedFd};
use std::thread;
use std::time::Duration;

use rustix::process::{Pid, Signal, kill_process};

use crate::buffer::LineBuffer;
use crate::error::ProcessError;
use crate::launch::Launch;
use crate::spawn::{Spawned, spawn};
use crate::status::{ExitStatus, Status};
use crate::sys;
use crate::timeout::{Deadline, Timeout};

pub struct Process {
    pid: libc::pid_t,
    stdin: Option<OwnedFd>,
    /// `None` once end of stream has been read.
    stdout: Option<OwnedFd>,
    buffer: LineBuffer,
    scratch: Box<[u8]>,
    status: Status,
    poll_interval: Duration,
    torn_down: bool,
}

impl Process {
    /// Start `program` with `args`. Shorthand for [`Launch`] with defaults.
    pub fn spawn<I, S>(program: impl Into<std::path::PathBuf>, args: I) -> Result<Self, ProcessError>
    where
        I: IntoIterator<Item = S>,
        S: Into<std::ffi::OsString>,
    {
        Launch::new(program).args(args).spawn()
    }

    pub(crate) fn launch(launch: Launch) -> Result<Self, ProcessError> {
        let launch = launch.normalized();
        let Spawned { pid, stdin, stdout } = spawn(&launch)?;
        Ok(Self {
            pid,
            stdin: Some(stdin),
            stdout: Some(stdout),
            buffer: LineBuffer::new(),
            scratch: vec![0u8; launch.read_chunk].into_boxed_slice(),
            status: Status::Unknown,
            poll_interval: launch.poll_interval,
            torn_down: false,
        })
    }

    #[inline]
    pub fn pid(&self) -> u32 {
        self.pid as u32
    }

    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    #[inline]
    pub fn is_input_open(&self) -> bool {
        self.stdin.is_some()
    }

    /// True once the child's stdout reached end of stream.
    #[inline]
    pub fn is_drained(&self) -> bool {
        self.stdout.is_none()
    }

    /// Write all of `data` to the child's stdin.
    ///
    /// May block while the pipe is full and the child is not reading.
    pub fn send(&mut self, data: &[u8]) -> Result<(), ProcessError> {
        let Some(stdin) = self.stdin.as_ref() else {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdin closed").into());
        };
        sys::write_all(stdin.as_raw_fd(), data)?;
        Ok(())
    }

    pub fn send_line(&mut self, line: &str) -> Result<(), ProcessError> {
        self.send(line.as_bytes())?;
        self.send(b"\n")
    }

    /// Close the child's stdin so it sees EOF. Does nothing if already closed.
    pub fn close_input(&mut self) {
        if self.stdin.take().is_some() {
            tracing::trace!(pid = self.pid, "stdin closed");
        }
    }

    /// Next line of output without its `\n`.
    ///
    /// `Ok(None)` means the child closed stdout and every byte has been
    /// handed out. An unterminated last line is returned once before that.
    pub fn read_line_bytes(
        &mut self,
        timeout: impl Into<Timeout>,
    ) -> Result<Option<Vec<u8>>, ProcessError> {
        let deadline = Deadline::start(timeout.into());
        loop {
            if let Some(line) = self.buffer.extract_line() {
                return Ok(Some(line));
            }
            let Some(stdout) = self.stdout.as_ref() else {
                return Ok(self.buffer.take_rest());
            };
            let fd = stdout.as_raw_fd();

            let wait_ms = deadline.remaining().map_or(-1, sys::poll_millis);
            match sys::poll_readable(fd, wait_ms) {
                Ok(true) => {}
                Ok(false) => return Err(ProcessError::Timeout(deadline.budget())),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }

            let n = sys::read_once(fd, &mut self.scratch)?;
            if n == 0 {
                tracing::trace!(pid = self.pid, "stdout drained");
                self.stdout = None;
            } else {
                self.buffer.append(&self.scratch[..n]);
            }
        }
    }

    /// [`read_line_bytes`](Self::read_line_bytes), decoded as UTF-8 (lossy).
    pub fn read_line(&mut self, timeout: impl Into<Timeout>) -> Result<Option<String>, ProcessError> {
        Ok(self
            .read_line_bytes(timeout)?
            .map(|line| String::from_utf8_lossy(&line).into_owned()))
    }

    /// [`read_line`](Self::read_line) with trailing whitespace removed.
    pub fn read_line_trimmed(
        &mut self,
        timeout: impl Into<Timeout>,
    ) -> Result<Option<String>, ProcessError> {
        Ok(self.read_line(timeout)?.map(|mut line| {
            line.truncate(line.trim_end().len());
            line
        }))
    }

    /// Collect the child's termination.
    ///
    /// [`Timeout::Never`] blocks in `waitpid`. A bounded timeout polls every
    /// `poll_interval`; when it runs out the child keeps running and the
    /// status stays [`Status::Unknown`]. Once collected, the result is
    /// cached and returned without touching the kernel again.
    pub fn wait(&mut self, timeout: impl Into<Timeout>) -> Result<ExitStatus, ProcessError> {
        if let Status::WaitError(errno) = self.status {
            return Err(ProcessError::Wait(errno));
        }
        if let Some(exit) = self.status.exit_status() {
            return Ok(exit);
        }

        let deadline = Deadline::start(timeout.into());
        if deadline.remaining().is_none() {
            loop {
                if let Some(exit) = self.reap(false)? {
                    return Ok(exit);
                }
            }
        }

        loop {
            if let Some(exit) = self.reap(true)? {
                return Ok(exit);
            }
            let remaining = deadline.remaining().unwrap_or_default();
            if remaining.is_zero() {
                return Err(ProcessError::Timeout(deadline.budget()));
            }
            thread::sleep(remaining.min(self.poll_interval));
        }
    }

    /// Exit code with a signal collapsed to 1.
    pub fn wait_code(&mut self, timeout: impl Into<Timeout>) -> Result<i32, ProcessError> {
        Ok(self.wait(timeout)?.code())
    }

    /// Check for termination without blocking.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>, ProcessError> {
        match self.wait(Timeout::IMMEDIATE) {
            Ok(exit) => Ok(Some(exit)),
            Err(ProcessError::Timeout(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Tear the process down now and return the final status.
    pub fn close(mut self) -> Status {
        self.teardown();
        self.status
    }

    fn reap(&mut self, nohang: bool) -> Result<Option<ExitStatus>, ProcessError> {
        match sys::waitpid(self.pid, nohang) {
            Ok(None) => Ok(None),
            Ok(Some(raw)) => {
                let Some(exit) = ExitStatus::from_raw(raw) else {
                    return Ok(None);
                };
                tracing::debug!(pid = self.pid, %exit, "child collected");
                self.status = exit.into();
                Ok(Some(exit))
            }
            Err(errno) => {
                self.status = Status::WaitError(errno);
                Err(ProcessError::Wait(errno))
            }
        }
    }

    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        self.close_input();
        self.stdout = None;
        self.buffer.release();

        if !self.status.is_unknown() {
            return;
        }

        let Some(pid) = Pid::from_raw(self.pid) else {
            return;
        };
        if let Err(errno) = kill_process(pid, Signal::KILL) {
            tracing::warn!(pid = self.pid, %errno, "failed to kill child during teardown");
            return;
        }
        tracing::debug!(pid = self.pid, "killed uncollected child");

        match sys::waitpid(self.pid, false) {
            Ok(Some(raw)) => {
                if let Some(exit) = ExitStatus::from_raw(raw) {
                    self.status = exit.into();
                }
            }
            Ok(None) => {}
            Err(errno) => {
                tracing::warn!(pid = self.pid, %errno, "failed to reap child during teardown");
                self.status = Status::WaitError(errno);
            }
        }
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("pid", &self.pid)
            .field("status", &self.status)
            .field("input_open", &self.stdin.is_some())
            .field("drained", &self.stdout.is_none())
            .field("buffered", &self.buffer.len())
            .finish()
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        self.teardown();
    }
}
