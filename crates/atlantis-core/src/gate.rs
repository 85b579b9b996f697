//! Authorization gate.
//!
//! Pure policy checks applied at two points of a request:
//! - before fetching, the provider for the base repository must be configured
//! - after parsing, the pull request must not come from a fork (unless
//!   allowed) and must be open
//!
//! A [`Rejection`]'s `Display` is the exact text posted back to the user.
//! [`Rejection::ProviderNotConfigured`] is never posted; it is logged only.

use crate::config::RunnerConfig;
use crate::models::{PullRequest, Repo, VcsHostType};

/// Why a request was stopped by the gate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Atlantis not configured to support {0}")]
    ProviderNotConfigured(VcsHostType),

    #[error("Atlantis commands can't be run on fork pull requests. To enable, set --{flag}")]
    ForkDisallowed { flag: String },

    #[error("Atlantis commands can't be run on closed pull requests")]
    PullNotOpen,
}

impl Rejection {
    /// Whether the rejection is reported on the pull request. Configuration
    /// problems are only logged.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Rejection::ProviderNotConfigured(_))
    }
}

/// Policy checks derived from a [`RunnerConfig`].
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    allow_fork_prs: bool,
    allow_fork_prs_flag: String,
}

impl AuthorizationGate {
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            allow_fork_prs: config.allow_fork_prs,
            allow_fork_prs_flag: config.allow_fork_prs_flag.clone(),
        }
    }

    /// Require the pull request source for `host` to be configured.
    pub fn require_provider<T>(&self, host: VcsHostType, source: Option<T>) -> Result<T, Rejection> {
        source.ok_or(Rejection::ProviderNotConfigured(host))
    }

    /// Fork-origin then lifecycle check.
    ///
    /// Forks are detected by owning namespace, not full name: a pull request
    /// from another branch of the same repository is never a fork.
    pub fn check_pull(
        &self,
        base_repo: &Repo,
        head_repo: &Repo,
        pull: &PullRequest,
    ) -> Result<(), Rejection> {
        if !self.allow_fork_prs && head_repo.owner != base_repo.owner {
            return Err(Rejection::ForkDisallowed {
                flag: self.allow_fork_prs_flag.clone(),
            });
        }
        if !pull.state.is_open() {
            return Err(Rejection::PullNotOpen);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::fixtures;
    use crate::models::PullState;

    fn gate(allow_fork_prs: bool) -> AuthorizationGate {
        AuthorizationGate::new(
            &RunnerConfig::default()
                .with_allow_fork_prs(allow_fork_prs)
                .with_allow_fork_prs_flag("allow-fork-prs-flag"),
        )
    }

    fn fork_of(repo: &Repo) -> Repo {
        let mut fork = repo.clone();
        fork.full_name = format!("forkrepo/{}", repo.name);
        fork.owner = "forkrepo".to_string();
        fork
    }

    #[test]
    fn test_require_provider() {
        let g = gate(false);
        assert_eq!(g.require_provider(VcsHostType::Github, Some(1)), Ok(1));

        let rejection = g
            .require_provider::<()>(VcsHostType::Gitlab, None)
            .unwrap_err();
        assert_eq!(rejection.to_string(), "Atlantis not configured to support GitLab");
        assert!(!rejection.is_user_visible());
    }

    #[test]
    fn test_same_repo_open_pull_passes() {
        let base = fixtures::github_repo();
        assert!(gate(false)
            .check_pull(&base, &base, &fixtures::pull())
            .is_ok());
    }

    #[test]
    fn test_fork_rejected_with_flag_name() {
        let base = fixtures::github_repo();
        let rejection = gate(false)
            .check_pull(&base, &fork_of(&base), &fixtures::pull())
            .unwrap_err();

        assert_eq!(
            rejection.to_string(),
            "Atlantis commands can't be run on fork pull requests. To enable, set --allow-fork-prs-flag"
        );
        assert!(rejection.is_user_visible());
    }

    #[test]
    fn test_fork_allowed_when_enabled() {
        let base = fixtures::github_repo();
        assert!(gate(true)
            .check_pull(&base, &fork_of(&base), &fixtures::pull())
            .is_ok());
    }

    #[test]
    fn test_different_name_same_owner_is_not_a_fork() {
        let base = fixtures::github_repo();
        let mut head = base.clone();
        head.full_name = format!("{}/renamed", base.owner);
        head.name = "renamed".to_string();
        assert!(gate(false).check_pull(&base, &head, &fixtures::pull()).is_ok());
    }

    #[test]
    fn test_closed_and_merged_rejected() {
        let base = fixtures::github_repo();
        for state in [PullState::Closed, PullState::Merged] {
            let mut pull = fixtures::pull();
            pull.state = state;
            assert_eq!(
                gate(false).check_pull(&base, &base, &pull),
                Err(Rejection::PullNotOpen)
            );
        }
    }

    #[test]
    fn test_fork_checked_before_state() {
        let base = fixtures::github_repo();
        let mut pull = fixtures::pull();
        pull.state = PullState::Closed;
        let rejection = gate(false)
            .check_pull(&base, &fork_of(&base), &pull)
            .unwrap_err();
        assert!(matches!(rejection, Rejection::ForkDisallowed { .. }));
    }
}
