//! Lifecycle tests.
//!
//! Exit status collection, timed waits and teardown of children that were
//! never collected.

use std::time::{Duration, Instant};

use gradebox_process::{ExitStatus, Launch, ProcessError, SIGNALED_EXIT_CODE, Status, Timeout};

use crate::common::{SH, is_reaped, sh, sh_args};

#[test]
fn test_exit_code_from_argument() {
    let script = r#"if [ "$1" = fail ]; then exit 1; fi"#;

    let mut ok = sh_args(script, &["pass"]);
    assert_eq!(ok.wait(Timeout::secs(5)).unwrap(), ExitStatus::Exited(0));

    let mut failing = sh_args(script, &["fail"]);
    assert_eq!(failing.wait_code(Timeout::secs(5)).unwrap(), 1);
}

#[test]
fn test_large_exit_code() {
    let mut child = sh("exit 200");
    assert_eq!(child.wait_code(Timeout::Never).unwrap(), 200);
}

#[test]
fn test_killed_by_signal() {
    let mut child = sh("kill -TERM $$");

    let exit = child.wait(Timeout::secs(5)).unwrap();
    assert_eq!(exit.signal(), Some(libc::SIGTERM));
    assert!(!exit.success());
    assert_eq!(exit.code(), SIGNALED_EXIT_CODE);
    assert_eq!(child.wait_code(Timeout::Never).unwrap(), 1);
}

#[test]
fn test_status_is_cached() {
    let mut child = sh("exit 3");
    assert!(child.status().is_unknown());

    assert_eq!(child.wait(Timeout::Never).unwrap(), ExitStatus::Exited(3));
    assert_eq!(child.status(), Status::Exited(3));

    // The pid is gone from the kernel's view; the answer comes from the cache.
    assert!(is_reaped(child.pid()));
    assert_eq!(child.wait(Timeout::IMMEDIATE).unwrap(), ExitStatus::Exited(3));
    assert_eq!(child.wait(Timeout::Never).unwrap(), ExitStatus::Exited(3));
}

#[test]
fn test_timed_wait_expires() {
    let mut child = Launch::new(SH)
        .args(["-c", "sleep 5"])
        .poll_interval(Duration::from_millis(20))
        .spawn()
        .unwrap();

    let start = Instant::now();
    let err = child.wait(Timeout::millis(200)).unwrap_err();
    let elapsed = start.elapsed();

    assert!(matches!(err, ProcessError::Timeout(d) if d == Duration::from_millis(200)));
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_secs(2), "took too long: {elapsed:?}");
    assert!(child.status().is_unknown());
    assert!(!is_reaped(child.pid()));
}

#[test]
fn test_zero_poll_interval_field_still_waits() {
    let mut launch = Launch::new(SH).args(["-c", "sleep 0.3; exit 5"]);
    launch.poll_interval = Duration::ZERO;
    let mut child = launch.spawn().unwrap();

    let start = Instant::now();
    assert_eq!(child.wait_code(Timeout::secs(5)).unwrap(), 5);
    assert!(start.elapsed() >= Duration::from_millis(300));
}

#[test]
fn test_timed_wait_collects_quick_exit() {
    let mut child = sh("sleep 0.2; exit 4");
    assert_eq!(child.wait_code(Timeout::secs(5)).unwrap(), 4);
}

#[test]
fn test_try_wait() {
    let mut child = sh("read -r line; exit 0");
    assert_eq!(child.try_wait().unwrap(), None);

    child.close_input();
    assert_eq!(child.wait(Timeout::secs(5)).unwrap(), ExitStatus::Exited(0));
    assert_eq!(child.try_wait().unwrap(), Some(ExitStatus::Exited(0)));
}

#[test]
fn test_drop_kills_and_reaps() {
    let child = sh("sleep 30");
    let pid = child.pid();
    assert!(!is_reaped(pid));

    let start = Instant::now();
    drop(child);
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(is_reaped(pid));
}

#[test]
fn test_close_reports_kill() {
    let child = sh("sleep 30");
    let status = child.close();
    assert_eq!(
        status,
        Status::Signaled {
            signal: libc::SIGKILL,
            core_dumped: false
        }
    );
}

#[test]
fn test_close_after_wait_keeps_status() {
    let mut child = sh("exit 7");
    child.wait(Timeout::Never).unwrap();
    assert_eq!(child.close(), Status::Exited(7));
}

#[test]
fn test_drop_after_timeout() {
    let mut child = sh("sleep 30");
    let pid = child.pid();
    assert!(child.read_line(Timeout::millis(50)).unwrap_err().is_timeout());
    drop(child);
    assert!(is_reaped(pid));
}

#[test]
fn test_independent_handles() {
    let mut a = sh("echo a; exit 1");
    let mut b = sh("echo b; exit 2");

    assert_eq!(b.read_line(Timeout::secs(5)).unwrap().as_deref(), Some("b"));
    assert_eq!(a.read_line(Timeout::secs(5)).unwrap().as_deref(), Some("a"));
    assert_eq!(b.wait_code(Timeout::secs(5)).unwrap(), 2);
    assert_eq!(a.wait_code(Timeout::secs(5)).unwrap(), 1);
}
