//! Error types for fleetcmd-exec

use thiserror::Error;

/// Errors that can occur while executing a command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// Command exited with a non-zero status and errors were not ignored
    #[error("command \"{command}\" returned non-zero exit code {exit_code}")]
    CommandFailed {
        /// Command text as passed by the caller
        command: String,
        /// Exit status reported by the process
        exit_code: i32,
    },

    /// Process could not be started at all
    #[error("failed to spawn {program}: {reason}")]
    SpawnFailed {
        /// Program that was being started (`sh`, `ssh`)
        program: String,
        /// Underlying OS error
        reason: String,
    },

    /// Node is missing an option required for remote execution
    #[error("node {node} has no \"{option}\" option")]
    MissingOption {
        /// Display name of the node
        node: String,
        /// Name of the missing option
        option: String,
    },

    /// Command cannot be represented as a single shell argument
    #[error("cannot quote command \"{command}\": {reason}")]
    Unquotable {
        /// Command text as passed by the caller
        command: String,
        /// Reason reported by the quoter
        reason: String,
    },

    /// I/O error while reading output or waiting on the process
    #[error("I/O error: {0}")]
    IoError(String),
}

impl ExecError {
    /// Build a spawn failure for `program`
    pub fn spawn_failed(program: impl Into<String>, reason: impl ToString) -> Self {
        Self::SpawnFailed {
            program: program.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if the command ran and exited non-zero
    #[must_use]
    pub fn is_command_failure(&self) -> bool {
        matches!(self, ExecError::CommandFailed { .. })
    }

    /// Exit code of a failed command, if the command got that far
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecError::CommandFailed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}
