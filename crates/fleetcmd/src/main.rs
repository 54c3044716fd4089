//! fleetcmd
//!
//! Runs deployment commands locally or on configured nodes over SSH

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use color_eyre::Result;
use fleetcmd_exec::{CommandExecutor, Deployment, ExecError, Outcome, Target};
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "fleetcmd")]
#[command(about = "Run deployment commands locally or over SSH", long_about = None)]
struct Cli {
    /// Config file (defaults to $FLEETCMD_CONFIG or fleetcmd.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level, overrides the config file (RUST_LOG wins over both)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a shell command
    #[command(name = "run")]
    Run(RunArgs),
    /// List configured nodes
    #[command(name = "nodes")]
    Nodes,
}

#[derive(Args)]
struct RunArgs {
    /// Node to run on; runs locally when omitted
    #[arg(long)]
    node: Option<String>,

    /// Report a non-zero exit as an ignored failure instead of an error
    #[arg(long)]
    ignore_errors: bool,

    /// Print the outcome as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Deployment name for log lines, overrides the config file
    #[arg(long)]
    deployment: Option<String>,

    /// Command words, joined with spaces and run through the shell
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    init_tracing(
        cli.log_level
            .as_deref()
            .unwrap_or(&config.settings.log_level),
    );

    match cli.command {
        Commands::Run(args) => run(&config, args).await,
        Commands::Nodes => {
            list_nodes(&config);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(config: &Config, args: RunArgs) -> Result<ExitCode> {
    let node = match &args.node {
        Some(name) => Some(
            config
                .node(name)
                .ok_or_else(|| eyre::eyre!("unknown node: {name}"))?,
        ),
        None => None,
    };

    let deployment = Deployment::new(
        args.deployment
            .unwrap_or_else(|| config.settings.deployment.clone()),
    );
    let command = args.command.join(" ");

    let result = CommandExecutor::new()
        .execute(&command, Target::from(node), &deployment, args.ignore_errors)
        .await;

    match result {
        Ok(outcome) => {
            print!("{}", render(&outcome, args.json)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(ExecError::CommandFailed { command, exit_code }) => {
            if args.json {
                let failure = serde_json::json!({
                    "outcome": "failed",
                    "command": command,
                    "exit_code": exit_code,
                });
                println!("{failure}");
            }
            tracing::error!(command = %command, exit_code, "command failed");
            Ok(ExitCode::from(exit_status(exit_code)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Stdout text for a finished command: the captured output as is, or one
/// line of JSON. An ignored failure prints nothing in plain mode.
fn render(outcome: &Outcome, json: bool) -> Result<String> {
    if json {
        return Ok(format!("{}\n", serde_json::to_string(outcome)?));
    }
    Ok(outcome.output().unwrap_or_default().to_string())
}

fn list_nodes(config: &Config) {
    if config.node.is_empty() {
        println!("no nodes configured");
        return;
    }

    for node in &config.node {
        match node.username() {
            Some(user) => println!("{}\t{user}@{}", node.name(), node.hostname()),
            None => println!("{}\t{}", node.name(), node.hostname()),
        }
    }
}

/// Process exit status for a failed command; anything outside 1..=255 is 1
fn exit_status(exit_code: i32) -> u8 {
    u8::try_from(exit_code)
        .ok()
        .filter(|code| *code != 0)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_status_passes_through_shell_range() {
        assert_eq!(exit_status(3), 3);
        assert_eq!(exit_status(255), 255);
    }

    #[test]
    fn test_exit_status_clamps_out_of_range() {
        assert_eq!(exit_status(-1), 1);
        assert_eq!(exit_status(256), 1);
        assert_eq!(exit_status(0), 1);
    }

    #[test]
    fn test_plain_mode_prints_captured_output() {
        let outcome = Outcome::Success {
            output: "a\nb\n".to_string(),
        };

        assert_eq!(render(&outcome, false).unwrap(), "a\nb\n");
        assert_eq!(
            render(&Outcome::IgnoredFailure { exit_code: 3 }, false).unwrap(),
            ""
        );
    }

    #[test]
    fn test_json_mode_prints_one_line() {
        let rendered = render(&Outcome::IgnoredFailure { exit_code: 3 }, true).unwrap();

        assert_eq!(
            rendered,
            "{\"outcome\":\"ignored_failure\",\"exit_code\":3}\n"
        );
    }

    #[test]
    fn test_run_args_keep_hyphenated_command_words() {
        let cli = Cli::parse_from(["fleetcmd", "run", "--node", "db1", "ls", "-la", "/srv"]);

        let Commands::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.node.as_deref(), Some("db1"));
        assert_eq!(args.command.join(" "), "ls -la /srv");
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
