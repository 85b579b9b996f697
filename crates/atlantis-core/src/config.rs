//! Orchestrator configuration, injected at construction.

use serde::{Deserialize, Serialize};

/// Name of the flag that enables commands on fork pull requests.
pub const DEFAULT_ALLOW_FORK_PRS_FLAG: &str = "allow-fork-prs";

/// Configuration consumed by the [`crate::CommandRunner`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Allow commands on pull requests whose head repository lives in a
    /// different namespace than the base repository.
    pub allow_fork_prs: bool,

    /// Human-readable name of the flag that sets `allow_fork_prs`. Quoted
    /// verbatim in the fork rejection comment.
    pub allow_fork_prs_flag: String,

    /// Maximum number of project commands run concurrently per request.
    pub parallel_projects: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            allow_fork_prs: false,
            allow_fork_prs_flag: DEFAULT_ALLOW_FORK_PRS_FLAG.to_string(),
            parallel_projects: 1,
        }
    }
}

impl RunnerConfig {
    /// Read overrides from `ATLANTIS_ALLOW_FORK_PRS` and
    /// `ATLANTIS_PARALLEL_PROJECTS`, falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            allow_fork_prs: std::env::var("ATLANTIS_ALLOW_FORK_PRS")
                .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "True"))
                .unwrap_or(defaults.allow_fork_prs),
            parallel_projects: std::env::var("ATLANTIS_PARALLEL_PROJECTS")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .map_or(defaults.parallel_projects, |n| n.max(1)),
            ..defaults
        }
    }

    pub fn with_allow_fork_prs(mut self, allow: bool) -> Self {
        self.allow_fork_prs = allow;
        self
    }

    pub fn with_allow_fork_prs_flag(mut self, flag: impl Into<String>) -> Self {
        self.allow_fork_prs_flag = flag.into();
        self
    }

    /// Set the project concurrency limit. Zero is treated as one.
    pub fn with_parallel_projects(mut self, limit: usize) -> Self {
        self.parallel_projects = limit.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_disallow_forks() {
        let config = RunnerConfig::default();
        assert!(!config.allow_fork_prs);
        assert_eq!(config.allow_fork_prs_flag, "allow-fork-prs");
        assert_eq!(config.parallel_projects, 1);
    }

    #[test]
    fn test_builders() {
        let config = RunnerConfig::default()
            .with_allow_fork_prs(true)
            .with_allow_fork_prs_flag("allow-fork-prs-flag")
            .with_parallel_projects(0);
        assert!(config.allow_fork_prs);
        assert_eq!(config.allow_fork_prs_flag, "allow-fork-prs-flag");
        assert_eq!(config.parallel_projects, 1);
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("ATLANTIS_ALLOW_FORK_PRS", "true");
        std::env::set_var("ATLANTIS_PARALLEL_PROJECTS", "0");
        let config = RunnerConfig::from_env();
        std::env::remove_var("ATLANTIS_ALLOW_FORK_PRS");
        std::env::remove_var("ATLANTIS_PARALLEL_PROJECTS");

        assert!(config.allow_fork_prs);
        assert_eq!(config.parallel_projects, 1);
        assert_eq!(config.allow_fork_prs_flag, DEFAULT_ALLOW_FORK_PRS_FLAG);
    }
}
