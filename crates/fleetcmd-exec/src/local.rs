//! Local command execution using `tokio::process`

use async_trait::async_trait;
use tracing::instrument;

use crate::deployment::Deployment;
use crate::error::ExecError;
use crate::logger::LogLevel;
use crate::result::RunOutput;
use crate::stream::run_shell;
use crate::target::LOCALHOST;
use crate::traits::LocalRunner;

/// Local command runner
///
/// Executes commands on the local machine through `sh -c`, so pipes,
/// redirections and compound commands work as typed.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner;

impl ShellRunner {
    /// Create a new local runner
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LocalRunner for ShellRunner {
    #[instrument(skip(self, deployment), fields(deployment = %deployment.name()), level = "debug")]
    async fn run(&self, command: &str, deployment: &Deployment) -> Result<RunOutput, ExecError> {
        let logger = deployment.logger();
        logger.log(LogLevel::Debug, &format!("    ({LOCALHOST}): \"{command}\""));

        run_shell(command, |line| logger.log(LogLevel::Info, &format!("> {line}"))).await
    }

    fn runner_type(&self) -> &'static str {
        "local"
    }
}
