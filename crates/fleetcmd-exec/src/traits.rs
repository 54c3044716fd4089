//! Runner traits

use async_trait::async_trait;

use crate::deployment::Deployment;
use crate::error::ExecError;
use crate::result::RunOutput;
use crate::target::Node;

/// Runs a command on the current machine
#[async_trait]
pub trait LocalRunner: Send + Sync {
    async fn run(&self, command: &str, deployment: &Deployment) -> Result<RunOutput, ExecError>;

    fn runner_type(&self) -> &'static str;
}

/// Runs a command on a remote node
#[async_trait]
pub trait RemoteRunner: Send + Sync {
    async fn run(
        &self,
        command: &str,
        node: &Node,
        deployment: &Deployment,
    ) -> Result<RunOutput, ExecError>;

    fn runner_type(&self) -> &'static str;
}
