//! Line I/O tests.
//!
//! These check line splitting against real pipes, the final unterminated
//! line, end of stream, the cumulative read deadline and stdin handling.

use std::time::{Duration, Instant};

use gradebox_process::{Launch, ProcessError, Timeout};

use crate::common::{SH, sh};

#[test]
fn test_hello_world() {
    let mut child = sh("echo 'Hello world!'; cat > /dev/null");

    assert_eq!(
        child.read_line(Timeout::secs(30)).unwrap().as_deref(),
        Some("Hello world!")
    );
    child.close_input();
    assert_eq!(child.wait_code(Timeout::secs(2)).unwrap(), 0);
}

#[test]
fn test_lines_in_order() {
    let mut child = sh("printf 'one\\ntwo\\n\\nfour\\n'");
    let mut lines = Vec::new();
    while let Some(line) = child.read_line(Timeout::secs(5)).unwrap() {
        lines.push(line);
    }
    assert_eq!(lines, ["one", "two", "", "four"]);
}

#[test]
fn test_final_line_without_newline_once() {
    let mut child = sh("printf 'first\\nlast'");

    assert_eq!(child.read_line(Timeout::secs(5)).unwrap().as_deref(), Some("first"));
    assert_eq!(child.read_line(Timeout::secs(5)).unwrap().as_deref(), Some("last"));
    assert_eq!(child.read_line(Timeout::secs(5)).unwrap(), None);
    assert_eq!(child.read_line(Timeout::secs(5)).unwrap(), None);
    assert!(child.is_drained());
}

#[test]
fn test_empty_output_is_end_of_stream() {
    let mut child = sh("exit 0");
    assert_eq!(child.read_line(Timeout::secs(5)).unwrap(), None);
}

#[test]
fn test_read_timeout() {
    let mut child = sh("sleep 5; echo late");

    let start = Instant::now();
    let err = child.read_line(Timeout::secs(1)).unwrap_err();
    let elapsed = start.elapsed();

    assert!(err.is_timeout(), "expected timeout, got {err}");
    assert!(elapsed >= Duration::from_secs(1), "returned early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(3), "took too long: {elapsed:?}");
}

#[test]
fn test_immediate_timeout_without_data() {
    let mut child = sh("sleep 5");
    let err = child.read_line(Timeout::IMMEDIATE).unwrap_err();
    assert!(matches!(err, ProcessError::Timeout(d) if d == Duration::ZERO));
}

#[test]
fn test_buffered_line_needs_no_wait() {
    let mut child = sh("printf 'a\\nb\\n'; sleep 5");
    assert_eq!(child.read_line(Timeout::secs(5)).unwrap().as_deref(), Some("a"));
    // "b" arrived in the same write and is already buffered.
    assert_eq!(child.read_line(Timeout::IMMEDIATE).unwrap().as_deref(), Some("b"));
}

#[test]
fn test_deadline_spans_multiple_reads() {
    // Two pieces 300ms apart: each read is well inside the budget, and so
    // is their sum.
    let mut child = sh("sleep 0.3; printf ab; sleep 0.3; echo cd");
    assert_eq!(
        child.read_line(Duration::from_secs(2)).unwrap().as_deref(),
        Some("abcd")
    );
}

#[test]
fn test_deadline_is_cumulative() {
    // Every gap is shorter than the budget, but together they exceed it.
    let mut child = sh("printf ab; sleep 0.7; printf cd; sleep 0.7; echo ef");

    let start = Instant::now();
    let err = child.read_line(Duration::from_secs(1)).unwrap_err();
    assert!(err.is_timeout());
    assert!(start.elapsed() < Duration::from_millis(1400));

    // Nothing read so far is lost.
    assert_eq!(
        child.read_line(Timeout::secs(5)).unwrap().as_deref(),
        Some("abcdef")
    );
}

#[test]
fn test_small_read_chunks() {
    let mut child = Launch::new(SH)
        .args(["-c", "echo 'split across many reads'"])
        .read_chunk(3)
        .spawn()
        .unwrap();
    assert_eq!(
        child.read_line(Timeout::secs(5)).unwrap().as_deref(),
        Some("split across many reads")
    );
}

#[test]
fn test_zero_read_chunk_field_still_reads() {
    let mut launch = Launch::new(SH).args(["-c", "echo hello; sleep 1"]);
    launch.read_chunk = 0;
    let mut child = launch.spawn().unwrap();

    assert_eq!(
        child.read_line(Timeout::secs(5)).unwrap().as_deref(),
        Some("hello")
    );
    assert!(!child.is_drained());
}

#[test]
fn test_long_line_in_many_chunks() {
    // 64 KiB without a newline, arriving one read at a time.
    let mut child = Launch::new(SH)
        .args(["-c", "head -c 65536 /dev/zero | tr '\\0' x; echo"])
        .read_chunk(512)
        .spawn()
        .unwrap();
    let line = child.read_line(Timeout::secs(10)).unwrap().unwrap();
    assert_eq!(line.len(), 65536);
    assert!(line.bytes().all(|b| b == b'x'));
}

#[test]
fn test_trimmed_read() {
    let mut child = sh("printf 'value  \\r\\n'");
    assert_eq!(
        child.read_line_trimmed(Timeout::secs(5)).unwrap().as_deref(),
        Some("value")
    );
}

#[test]
fn test_non_utf8_bytes() {
    let mut child = sh("printf '\\377\\376\\n'");
    assert_eq!(
        child.read_line_bytes(Timeout::secs(5)).unwrap(),
        Some(vec![0xff, 0xfe])
    );
}

#[test]
fn test_echo_lines() {
    let mut child = sh("while read -r line; do echo \"got $line\"; done");

    child.send_line("alpha").unwrap();
    assert_eq!(child.read_line(Timeout::secs(5)).unwrap().as_deref(), Some("got alpha"));
    child.send(b"be").unwrap();
    child.send(b"ta\n").unwrap();
    assert_eq!(child.read_line(Timeout::secs(5)).unwrap().as_deref(), Some("got beta"));

    child.close_input();
    assert_eq!(child.read_line(Timeout::secs(5)).unwrap(), None);
    assert_eq!(child.wait_code(Timeout::secs(5)).unwrap(), 0);
}

#[test]
fn test_large_payload_is_fully_written() {
    // More than a pipe buffer, so the write has to loop.
    let payload = vec![b'x'; 1 << 20];
    let mut child = sh("wc -c");

    child.send(&payload).unwrap();
    child.close_input();
    let count = child.read_line_trimmed(Timeout::secs(10)).unwrap().unwrap();
    assert_eq!(count.trim(), "1048576");
}

#[test]
fn test_send_after_close_input() {
    let mut child = sh("cat > /dev/null");
    child.close_input();
    child.close_input();
    assert!(!child.is_input_open());

    let err = child.send_line("late").unwrap_err();
    match err {
        ProcessError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe),
        other => panic!("expected io error, got {other:?}"),
    }
}
