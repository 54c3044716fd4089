//! fleetcmd-exec: Command execution for deployments
//!
//! Runs shell commands locally or on remote nodes over SSH, streams their
//! output line by line into the deployment log and turns the exit code into
//! success, ignored failure or error.

pub mod deployment;
pub mod error;
pub mod executor;
pub mod local;
pub mod logger;
pub mod result;
pub mod ssh;
mod stream;
pub mod target;
pub mod traits;

pub use deployment::Deployment;
pub use error::ExecError;
pub use executor::CommandExecutor;
pub use local::ShellRunner;
pub use logger::{LogLevel, Logger, MemoryLogger, TracingLogger};
pub use result::{Outcome, RunOutput};
pub use ssh::SshRunner;
pub use stream::SHELL;
pub use target::{LOCALHOST, Node, Target, USERNAME_OPTION};
pub use traits::{LocalRunner, RemoteRunner};
