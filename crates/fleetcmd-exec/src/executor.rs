//! Command executor: picks a runner and applies the exit code policy

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::deployment::Deployment;
use crate::error::ExecError;
use crate::local::ShellRunner;
use crate::result::{Outcome, RunOutput};
use crate::ssh::SshRunner;
use crate::target::Target;
use crate::traits::{LocalRunner, RemoteRunner};

/// Entry point for running deployment commands
///
/// Commands without a node, or for a node whose hostname is `localhost`, run
/// through the local runner. Everything else goes through the remote runner.
#[derive(Clone)]
pub struct CommandExecutor {
    local: Arc<dyn LocalRunner>,
    remote: Arc<dyn RemoteRunner>,
}

impl CommandExecutor {
    /// Executor backed by `sh` locally and the system `ssh` client remotely
    #[must_use]
    pub fn new() -> Self {
        Self::with_runners(Arc::new(ShellRunner::new()), Arc::new(SshRunner::new()))
    }

    /// Executor backed by custom runners
    pub fn with_runners(local: Arc<dyn LocalRunner>, remote: Arc<dyn RemoteRunner>) -> Self {
        Self { local, remote }
    }

    /// Execute `command` against `target`
    ///
    /// Returns `Outcome::Success` with the captured output when the command
    /// exits 0. A non-zero exit is `ExecError::CommandFailed` unless
    /// `ignore_errors` is set, in which case `Outcome::IgnoredFailure` is
    /// returned instead.
    ///
    /// # Errors
    /// `ExecError::CommandFailed` on a non-zero exit with `ignore_errors`
    /// unset, or any error from the runner (spawn failure, missing node
    /// option, unquotable command, I/O)
    pub async fn execute<'a>(
        &self,
        command: &str,
        target: impl Into<Target<'a>>,
        deployment: &Deployment,
        ignore_errors: bool,
    ) -> Result<Outcome, ExecError> {
        let result = self.dispatch(command, target.into(), deployment).await?;
        apply_policy(command, result, ignore_errors)
    }

    #[instrument(skip(self, target, deployment), fields(deployment = %deployment.name()))]
    async fn dispatch(
        &self,
        command: &str,
        target: Target<'_>,
        deployment: &Deployment,
    ) -> Result<RunOutput, ExecError> {
        match target.remote_node() {
            Some(node) => {
                debug!(runner = self.remote.runner_type(), node = %node.name(), "dispatching");
                self.remote.run(command, node, deployment).await
            }
            None => {
                debug!(runner = self.local.runner_type(), "dispatching");
                self.local.run(command, deployment).await
            }
        }
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandExecutor")
            .field("local", &self.local.runner_type())
            .field("remote", &self.remote.runner_type())
            .finish()
    }
}

fn apply_policy(command: &str, result: RunOutput, ignore_errors: bool) -> Result<Outcome, ExecError> {
    if result.success() {
        return Ok(Outcome::Success {
            output: result.output,
        });
    }

    if ignore_errors {
        warn!(command, status = result.status, "ignoring command failure");
        return Ok(Outcome::IgnoredFailure {
            exit_code: result.status,
        });
    }

    Err(ExecError::CommandFailed {
        command: command.to_string(),
        exit_code: result.status,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn run_output(status: i32, output: &str) -> RunOutput {
        RunOutput {
            status,
            output: output.to_string(),
            duration: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_success_returns_output_either_way() {
        for ignore_errors in [false, true] {
            let outcome = apply_policy("true", run_output(0, "out\n"), ignore_errors).unwrap();
            assert_eq!(outcome.output(), Some("out\n"));
        }
    }

    #[test]
    fn test_failure_is_error_by_default() {
        let err = apply_policy("exit 3", run_output(3, "partial\n"), false).unwrap_err();

        assert_eq!(
            err,
            ExecError::CommandFailed {
                command: "exit 3".to_string(),
                exit_code: 3,
            }
        );
    }

    #[test]
    fn test_ignored_failure_drops_output() {
        let outcome = apply_policy("exit 3", run_output(3, "partial\n"), true).unwrap();

        assert_eq!(outcome, Outcome::IgnoredFailure { exit_code: 3 });
    }
}
