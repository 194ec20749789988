//! Per-test failure taxonomy.

use std::time::Duration;

use thiserror::Error;

/// Why a single test failed.
///
/// Every variant is fatal to the run; the runner never retries.
#[derive(Error, Debug)]
pub enum TestError {
    #[error("simulator {}", describe_exit(.code, .stderr))]
    Execution { code: Option<i32>, stderr: String },

    #[error("simulator timed out after {}s", seconds(.0))]
    Timeout(Duration),

    #[error("Files do not match! first difference at byte {offset} (line {line})")]
    OutputMismatch {
        expected: std::path::PathBuf,
        actual: std::path::PathBuf,
        offset: usize,
        line: usize,
    },

    #[error("{0}")]
    Environment(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Terminal state of a test that did not pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestState {
    Timeout,
    ExecFailed,
    OutputMismatch,
    Environment,
}

impl TestError {
    /// Map the error onto the per-test state machine.
    pub const fn state(&self) -> TestState {
        match self {
            Self::Execution { .. } => TestState::ExecFailed,
            Self::Timeout(_) => TestState::Timeout,
            Self::OutputMismatch { .. } => TestState::OutputMismatch,
            Self::Environment(_) | Self::Io(_) | Self::Internal(_) => TestState::Environment,
        }
    }

    pub(crate) fn environment(message: impl Into<String>) -> Self {
        Self::Environment(message.into())
    }
}

fn describe_exit(code: &Option<i32>, stderr: &str) -> String {
    let mut message = match code {
        Some(code) => format!("returned non-zero exit status {code}"),
        None => "was terminated by a signal".to_string(),
    };
    // First non-blank stderr line is usually the simulator's own diagnosis
    if let Some(line) = stderr.lines().map(str::trim).find(|line| !line.is_empty()) {
        message.push_str(": ");
        message.push_str(line);
    }
    message
}

fn seconds(timeout: &Duration) -> f64 {
    timeout.as_secs_f64()
}

pub type Result<T> = std::result::Result<T, TestError>;
