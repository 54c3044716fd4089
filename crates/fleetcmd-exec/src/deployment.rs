//! Execution context handed to every command

use std::fmt;
use std::sync::Arc;

use crate::logger::{Logger, TracingLogger};

/// A deployment run: a name plus the logger its commands report to
#[derive(Clone)]
pub struct Deployment {
    name: String,
    logger: Arc<dyn Logger>,
}

impl Deployment {
    /// Create a deployment that logs through `tracing`
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let logger = Arc::new(TracingLogger::new(name.clone()));
        Self { name, logger }
    }

    /// Create a deployment with a custom logger
    pub fn with_logger(name: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self {
            name: name.into(),
            logger,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }
}

impl fmt::Debug for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deployment")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
