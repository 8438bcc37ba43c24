//! Bounded capture of engine stderr.
//!
//! Engines print load errors (missing weights, CUDA init failures) on
//! stderr. The last lines are kept so a crash during startup can be
//! explained in the log and in the status snapshot.

use enginehub_core::EngineKind;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::debug;

/// Number of stderr lines retained per engine process.
pub const STDERR_TAIL_LINES: usize = 200;

/// Ring buffer of the most recent stderr lines. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct StderrTail {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl StderrTail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line, dropping the oldest at capacity.
    pub fn push(&self, line: String) {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        if lines.len() >= STDERR_TAIL_LINES {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Up to `n` most recent lines, oldest first.
    pub fn last(&self, n: usize) -> Vec<String> {
        let lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        let skip = lines.len().saturating_sub(n);
        lines.iter().skip(skip).cloned().collect()
    }

    /// Most recent non-empty line.
    pub fn last_line(&self) -> Option<String> {
        let lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        lines.iter().rev().find(|l| !l.trim().is_empty()).cloned()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Drain the child's stderr into `tail` on a background task.
///
/// Each line is also forwarded to `tracing` at debug level. The task ends
/// when the pipe closes, i.e. when the process exits. Returns `None` if
/// stderr was not piped or was already taken.
pub fn spawn_stderr_reader(
    child: &mut Child,
    engine: EngineKind,
    tail: StderrTail,
) -> Option<JoinHandle<()>> {
    let stderr = child.stderr.take()?;
    Some(tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(engine = %engine, "stderr: {}", line);
            tail.push(line);
        }
        debug!(engine = %engine, "stderr reader task exiting");
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{EngineCommand, resolve_binary, spawn_engine};

    #[test]
    fn test_tail_is_bounded() {
        let tail = StderrTail::new();
        for i in 0..(STDERR_TAIL_LINES + 25) {
            tail.push(format!("line {i}"));
        }
        assert_eq!(tail.len(), STDERR_TAIL_LINES);
        assert_eq!(
            tail.last(2),
            vec![
                format!("line {}", STDERR_TAIL_LINES + 23),
                format!("line {}", STDERR_TAIL_LINES + 24)
            ]
        );
    }

    #[test]
    fn test_last_line_skips_blank_lines() {
        let tail = StderrTail::new();
        assert!(tail.last_line().is_none());
        tail.push("ValueError: model not found".to_string());
        tail.push(String::new());
        assert_eq!(
            tail.last_line().as_deref(),
            Some("ValueError: model not found")
        );
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_reader_collects_stderr_lines() {
        let program = resolve_binary("sh").unwrap();
        let command = EngineCommand::new(["-c", "echo first >&2; echo second >&2"]);
        let mut child = spawn_engine(&program, &command).unwrap();

        let tail = StderrTail::new();
        let reader = spawn_stderr_reader(&mut child, EngineKind::Mlx, tail.clone()).unwrap();
        child.wait().await.unwrap();
        reader.await.unwrap();

        assert_eq!(tail.last(10), vec!["first", "second"]);
        // Already taken
        assert!(spawn_stderr_reader(&mut child, EngineKind::Mlx, tail).is_none());
    }
}
