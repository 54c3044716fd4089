//! Result types for command execution

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Raw result of one runner invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutput {
    /// Exit status code (0 for success)
    pub status: i32,
    /// Captured output, lines concatenated in arrival order with terminators kept
    pub output: String,
    /// Time taken to execute
    pub duration: Duration,
}

impl RunOutput {
    /// Check if command succeeded (exit code 0)
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// What [`CommandExecutor::execute`](crate::CommandExecutor::execute) hands back
/// when it does not fail outright.
///
/// A successful run always carries its output, which may be empty. A failure
/// the caller chose to ignore carries the exit code but never the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[must_use]
pub enum Outcome {
    /// Command exited with status 0
    Success {
        /// Captured output
        output: String,
    },
    /// Command exited non-zero and the caller asked to ignore errors
    IgnoredFailure {
        /// Exit status reported by the process
        exit_code: i32,
    },
}

impl Outcome {
    /// Output of a successful run
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        match self {
            Outcome::Success { output } => Some(output),
            Outcome::IgnoredFailure { .. } => None,
        }
    }

    /// Consume the outcome, keeping the output of a successful run
    #[must_use]
    pub fn into_output(self) -> Option<String> {
        match self {
            Outcome::Success { output } => Some(output),
            Outcome::IgnoredFailure { .. } => None,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    #[must_use]
    pub fn is_ignored_failure(&self) -> bool {
        matches!(self, Outcome::IgnoredFailure { .. })
    }
}
