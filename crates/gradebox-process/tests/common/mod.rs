//! Common utilities for process tests.
//!
//! Fixture children are small `/bin/sh` scripts; `execv` does not search
//! `PATH`, so the shell is addressed by absolute path.

#![allow(dead_code)]

use gradebox_process::{Launch, Process};

pub const SH: &str = "/bin/sh";

/// Run `script` under `sh -c`.
pub fn sh(script: &str) -> Process {
    Process::spawn(SH, ["-c", script]).expect("failed to spawn /bin/sh")
}

/// Run `script` under `sh -c` with positional parameters `$1...`.
pub fn sh_args(script: &str, args: &[&str]) -> Process {
    Launch::new(SH)
        .args(["-c", script, "sh"])
        .args(args.iter().copied())
        .spawn()
        .expect("failed to spawn /bin/sh")
}

/// True if `pid` is no longer our child: waitpid fails with ECHILD.
pub fn is_reaped(pid: u32) -> bool {
    let mut status = 0;
    let ret = unsafe { libc::waitpid(pid as libc::pid_t, &mut status, libc::WNOHANG) };
    ret < 0 && std::io::Error::last_os_error().raw_os_error() == Some(libc::ECHILD)
}

/// Open descriptors of this process.
pub fn open_fds() -> usize {
    std::fs::read_dir("/proc/self/fd")
        .expect("/proc/self/fd")
        .count()
}
