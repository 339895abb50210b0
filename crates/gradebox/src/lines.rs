//! Line helpers over files and processes.

use std::fs;
use std::path::Path;

use gradebox_process::{Process, Timeout};

use crate::error::Result;

/// Read `path` and split it on `\n`.
///
/// A trailing newline ends the last line; it does not add an empty one.
/// Other whitespace, `\r` included, is kept.
pub fn read_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(split_lines(&content))
}

fn split_lines(content: &str) -> Vec<String> {
    let mut lines: Vec<String> = content.split('\n').map(str::to_owned).collect();
    if lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines
}

/// Read lines until the child closes stdout.
///
/// `timeout` bounds each line, not the whole drain.
pub fn drain_lines(process: &mut Process, timeout: impl Into<Timeout>) -> Result<Vec<String>> {
    let timeout = timeout.into();
    let mut lines = Vec::new();
    while let Some(line) = process.read_line(timeout)? {
        lines.push(line);
    }
    Ok(lines)
}
