//! Configuration loading and types

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use fleetcmd_exec::Node;
use serde::{Deserialize, Serialize};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "FLEETCMD_CONFIG";

/// Top-level configuration for fleetcmd
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub settings: Settings,
    /// Nodes commands can be run against
    #[serde(default)]
    pub node: Vec<Node>,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Deployment name attached to every log line
    #[serde(default = "default_deployment")]
    pub deployment: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            deployment: default_deployment(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_deployment() -> String {
    "default".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read, parsed or fails validation
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("failed to read {}: {e}", path.display()))?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default paths or use defaults
    pub fn load_default() -> eyre::Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }

        let mut paths = vec![
            PathBuf::from("fleetcmd.toml"),
            PathBuf::from("/etc/fleetcmd/fleetcmd.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("fleetcmd/fleetcmd.toml"));
        }

        for path in paths {
            if path.exists() {
                return Self::load(&path);
            }
        }

        tracing::debug!("no config file found, using defaults");
        Ok(Config::default())
    }

    /// Reject duplicate node names
    ///
    /// # Errors
    /// Returns error naming the first duplicate
    pub fn validate(&self) -> eyre::Result<()> {
        let mut seen = HashSet::new();
        for node in &self.node {
            if !seen.insert(node.name()) {
                eyre::bail!("duplicate node name: {}", node.name());
            }
        }
        Ok(())
    }

    /// Look up a node by name
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.node.iter().find(|n| n.name() == name)
    }
}
