//! Raw syscall helpers shared by the spawner and the process handle.
//!
//! Calls retry `EINTR` internally, except [`poll_readable`], whose caller
//! has a deadline to recompute first.

use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

use rustix::io::Errno;

#[inline]
pub fn last_errno() -> Errno {
    // SAFETY: __errno_location always returns valid thread-local pointer.
    Errno::from_raw_os_error(unsafe { *libc::__errno_location() })
}

/// Write all of `data` to `fd`, looping over short writes.
pub fn write_all(fd: RawFd, mut data: &[u8]) -> io::Result<()> {
    while !data.is_empty() {
        let ret = unsafe { libc::write(fd, data.as_ptr().cast::<libc::c_void>(), data.len()) };
        if ret < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if ret == 0 {
            return Err(io::Error::from(io::ErrorKind::WriteZero));
        }
        data = &data[ret as usize..];
    }
    Ok(())
}

/// A single `read(2)` into `buf`. Zero means end of stream.
pub fn read_once(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        let ret = unsafe { libc::read(fd, buf.as_mut_ptr().cast::<libc::c_void>(), buf.len()) };
        if ret >= 0 {
            return Ok(ret as usize);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

/// Block until `fd` is readable (or hung up) for at most `timeout_ms`.
///
/// A negative timeout waits forever. Returns `false` when the timeout
/// elapsed first. `EINTR` is handed back as [`io::ErrorKind::Interrupted`]
/// so the caller can recompute its remaining budget before retrying.
pub fn poll_readable(fd: RawFd, timeout_ms: i32) -> io::Result<bool> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let ret = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    if ret == 0 {
        return Ok(false);
    }
    if pfd.revents & libc::POLLNVAL != 0 {
        return Err(io::Error::from_raw_os_error(libc::EBADF));
    }
    Ok(pfd.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0)
}

/// Convert a remaining budget into a `poll(2)` timeout, rounding up so a
/// sub-millisecond remainder does not turn into a busy loop.
pub fn poll_millis(remaining: Duration) -> i32 {
    remaining
        .as_nanos()
        .div_ceil(1_000_000)
        .min(i32::MAX as u128) as i32
}

/// `waitpid(2)` on a single child.
///
/// With `nohang` set, `Ok(None)` means the child is still running.
pub fn waitpid(pid: libc::pid_t, nohang: bool) -> Result<Option<libc::c_int>, Errno> {
    let flags = if nohang { libc::WNOHANG } else { 0 };
    loop {
        let mut status: libc::c_int = 0;
        let ret = unsafe { libc::waitpid(pid, &mut status, flags) };
        match ret {
            0 => return Ok(None),
            r if r > 0 => return Ok(Some(status)),
            _ => {
                let errno = last_errno();
                if errno != Errno::INTR {
                    return Err(errno);
                }
            }
        }
    }
}
