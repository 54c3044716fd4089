//! Deployment log sinks

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Severity of a deployment log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
}

/// Sink for the lines a deployment produces
///
/// Runners write their trace line and every output line here. Messages are
/// passed through unformatted; how they are rendered is up to the sink.
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

/// Logger that forwards to `tracing`, tagged with the deployment name
#[derive(Debug, Clone)]
pub struct TracingLogger {
    deployment: String,
}

impl TracingLogger {
    pub fn new(deployment: impl Into<String>) -> Self {
        Self {
            deployment: deployment.into(),
        }
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        let message = message.trim_end_matches(['\r', '\n']);
        match level {
            LogLevel::Debug => debug!(deployment = %self.deployment, "{message}"),
            LogLevel::Info => info!(deployment = %self.deployment, "{message}"),
        }
    }
}

/// Logger that keeps every entry in memory
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries logged so far, oldest first
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages logged at `level`, oldest first
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message)
            .collect()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: LogLevel, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}
