//! Execution configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where and how project commands run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecConfig {
    /// Checkout of the pull request's head commit. Project directories are
    /// resolved relative to it.
    pub root_dir: PathBuf,

    /// Program and leading arguments (first element is the executable).
    /// The command name and the user's extra flags are appended.
    pub program: Vec<String>,

    /// Per-project timeout in seconds. Zero disables the timeout.
    pub timeout_secs: u64,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            program: vec!["terraform".to_string()],
            timeout_secs: 600,
        }
    }
}

impl ExecConfig {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_program(mut self, program: Vec<String>) -> Self {
        self.program = program;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
