//! SSH command execution through the system `ssh` client

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::deployment::Deployment;
use crate::error::ExecError;
use crate::logger::LogLevel;
use crate::result::RunOutput;
use crate::stream::run_shell;
use crate::target::{Node, USERNAME_OPTION};
use crate::traits::RemoteRunner;

/// Default SSH client program
pub const SSH_PROGRAM: &str = "ssh";

/// SSH command runner
///
/// Wraps each command as `ssh -A <user>@<host> <command> 2>&1` and runs that
/// line through the local shell. The remote command is quoted as a single
/// shell word, so the remote shell sees exactly what the caller passed.
///
/// The exit code is the one reported by the `ssh` client. A connection or
/// authentication failure (usually 255) cannot be told apart from the
/// remote command exiting with the same code.
#[derive(Debug, Clone)]
pub struct SshRunner {
    /// Client program looked up on `PATH` or given as a path
    program: String,
}

impl SshRunner {
    /// Create a runner using the `ssh` found on `PATH`
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: SSH_PROGRAM.to_string(),
        }
    }

    /// Use a different client program, e.g. a wrapper script
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Build the shell line that runs `command` on `node`
    ///
    /// # Errors
    /// Returns `ExecError::MissingOption` if the node has no `username` and
    /// `ExecError::Unquotable` if the command contains a NUL byte
    pub fn command_line(&self, command: &str, node: &Node) -> Result<String, ExecError> {
        build_line(&self.program, command, node)
    }

    /// Like [`command_line`](Self::command_line), but with the client
    /// resolved on `PATH` first so the binary that was checked is the one
    /// that runs
    ///
    /// # Errors
    /// Returns `ExecError::SpawnFailed` if the client cannot be found, plus
    /// the errors of [`command_line`](Self::command_line)
    pub fn resolved_command_line(&self, command: &str, node: &Node) -> Result<String, ExecError> {
        let client = which::which(&self.program)
            .map_err(|e| ExecError::spawn_failed(&self.program, e))?;
        debug!(client = %client.display(), "resolved ssh client");

        build_line(&client.to_string_lossy(), command, node)
    }
}

fn build_line(program: &str, command: &str, node: &Node) -> Result<String, ExecError> {
    let username = node.username().ok_or_else(|| ExecError::MissingOption {
        node: node.name().to_string(),
        option: USERNAME_OPTION.to_string(),
    })?;

    let program = quote(program)?;
    let remote_command = quote(command)?;

    Ok(format!(
        "{program} -A {username}@{hostname} {remote_command} 2>&1",
        hostname = node.hostname(),
    ))
}

impl Default for SshRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn quote(word: &str) -> Result<String, ExecError> {
    shlex::try_quote(word)
        .map(|quoted| quoted.into_owned())
        .map_err(|e| ExecError::Unquotable {
            command: word.to_string(),
            reason: e.to_string(),
        })
}

#[async_trait]
impl RemoteRunner for SshRunner {
    #[instrument(skip(self, node, deployment), fields(node = %node.name(), host = %node.hostname()), level = "debug")]
    async fn run(
        &self,
        command: &str,
        node: &Node,
        deployment: &Deployment,
    ) -> Result<RunOutput, ExecError> {
        let logger = deployment.logger();
        logger.log(
            LogLevel::Debug,
            &format!("    ${}: \"{command}\"", node.name()),
        );

        let command_line = self.resolved_command_line(command, node)?;

        run_shell(&command_line, |line| {
            let line = line.trim_end();
            logger.log(LogLevel::Info, &format!("    > {line}"));
        })
        .await
    }

    fn runner_type(&self) -> &'static str {
        "ssh"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db1() -> Node {
        Node::new("db1", "db1").with_username("deploy")
    }

    #[test]
    fn test_command_line_shape() {
        let line = SshRunner::new().command_line("echo hi", &db1()).unwrap();

        assert_eq!(line, "ssh -A deploy@db1 'echo hi' 2>&1");
    }

    #[test]
    fn test_metacharacters_stay_one_word() {
        let command = "echo 'a b' && false";
        let line = SshRunner::new().command_line(command, &db1()).unwrap();

        let words = shlex::split(&line).unwrap();
        assert_eq!(words, vec!["ssh", "-A", "deploy@db1", command, "2>&1"]);
    }

    #[test]
    fn test_variables_are_not_expanded_locally() {
        let command = "echo $HOME `id` \"quoted\"";
        let line = SshRunner::new().command_line(command, &db1()).unwrap();

        let words = shlex::split(&line).unwrap();
        assert_eq!(words[3], command);
    }

    #[test]
    fn test_missing_username() {
        let node = Node::new("db1", "db1");
        let err = SshRunner::new().command_line("true", &node).unwrap_err();

        assert_eq!(
            err,
            ExecError::MissingOption {
                node: "db1".to_string(),
                option: "username".to_string(),
            }
        );
    }

    #[test]
    fn test_nul_byte_is_unquotable() {
        let err = SshRunner::new()
            .command_line("echo \0", &db1())
            .unwrap_err();

        assert!(matches!(err, ExecError::Unquotable { .. }));
    }

    #[test]
    fn test_resolved_line_uses_client_path() {
        let runner = SshRunner::new().with_program("sh");
        let line = runner.resolved_command_line("echo hi", &db1()).unwrap();

        let words = shlex::split(&line).unwrap();
        let client = std::path::Path::new(&words[0]);
        assert!(client.is_absolute());
        assert_eq!(client.file_name().unwrap(), "sh");
        assert_eq!(&words[1..], ["-A", "deploy@db1", "echo hi", "2>&1"]);
    }

    #[test]
    fn test_resolved_line_fails_for_missing_client() {
        let runner = SshRunner::new().with_program("/nonexistent/fleetcmd-ssh");
        let err = runner.resolved_command_line("true", &db1()).unwrap_err();

        assert!(matches!(err, ExecError::SpawnFailed { .. }));
    }

    #[tokio::test]
    async fn test_missing_client_is_spawn_failure() {
        let deployment = Deployment::new("test");
        let runner = SshRunner::new().with_program("/nonexistent/fleetcmd-ssh");

        let err = runner.run("true", &db1(), &deployment).await.unwrap_err();

        assert!(matches!(err, ExecError::SpawnFailed { .. }));
    }
}
