//! Nodes and execution targets

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Hostname that always routes to local execution
pub const LOCALHOST: &str = "localhost";

/// Option holding the SSH login user of a node
pub const USERNAME_OPTION: &str = "username";

/// A machine commands can be run against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Display name used in logs
    pub name: String,
    /// Hostname or address passed to `ssh`
    pub hostname: String,
    /// Free-form node options (`username`, ...)
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl Node {
    /// Create a node without options
    pub fn new(name: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hostname: hostname.into(),
            options: BTreeMap::new(),
        }
    }

    /// Set a node option
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Set the SSH login user
    #[must_use]
    pub fn with_username(self, username: impl Into<String>) -> Self {
        self.with_option(USERNAME_OPTION, username)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn username(&self) -> Option<&str> {
        self.option(USERNAME_OPTION)
    }

    /// Whether commands for this node run on the current machine
    #[must_use]
    pub fn is_localhost(&self) -> bool {
        self.hostname == LOCALHOST
    }
}

/// Where a command should run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// The current machine
    Local,
    /// A node, reached over SSH unless its hostname is `localhost`
    Remote(&'a Node),
}

impl<'a> Target<'a> {
    /// The node to reach over SSH, or `None` when the command runs locally
    #[must_use]
    pub fn remote_node(&self) -> Option<&'a Node> {
        match self {
            Target::Remote(node) if !node.is_localhost() => Some(node),
            _ => None,
        }
    }
}

impl<'a> From<Option<&'a Node>> for Target<'a> {
    fn from(node: Option<&'a Node>) -> Self {
        node.map_or(Target::Local, Target::Remote)
    }
}

impl<'a> From<&'a Node> for Target<'a> {
    fn from(node: &'a Node) -> Self {
        Target::Remote(node)
    }
}
