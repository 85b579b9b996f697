//! VCS collaborator contracts.
//!
//! - [`GithubPullGetter`] / [`GitlabMergeRequestGetter`]: per-provider pull
//!   request sources, selected by the base repository's host type
//! - [`VcsClient`]: comments and raw commit statuses
//! - [`CommitStatusUpdater`]: maps a command outcome to a commit status
//!
//! Implementations must be safe to call from many requests at once.

pub mod github;
pub mod gitlab;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{FetchError, VcsError};
use crate::models::{CommandName, CommitStatus, PullRequest, Repo};

pub use github::GithubPull;
pub use gitlab::GitlabMergeRequest;

/// A provider-specific pull request payload, as delivered by a webhook or
/// fetched from the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPull {
    Github(GithubPull),
    Gitlab(GitlabMergeRequest),
}

/// Fetches the authoritative pull request from GitHub.
#[async_trait]
pub trait GithubPullGetter: Send + Sync {
    async fn get_pull_request(&self, repo: &Repo, num: u64) -> Result<GithubPull, FetchError>;
}

/// Fetches the authoritative merge request from GitLab.
#[async_trait]
pub trait GitlabMergeRequestGetter: Send + Sync {
    async fn get_merge_request(
        &self,
        repo_full_name: &str,
        num: u64,
    ) -> Result<GitlabMergeRequest, FetchError>;
}

/// Write-side VCS operations.
#[async_trait]
pub trait VcsClient: Send + Sync {
    async fn create_comment(&self, repo: &Repo, pull_num: u64, body: &str) -> Result<(), VcsError>;

    async fn update_status(
        &self,
        repo: &Repo,
        pull: &PullRequest,
        status: CommitStatus,
        description: &str,
    ) -> Result<(), VcsError>;
}

/// Sets the Atlantis commit status on a pull request's head commit.
#[async_trait]
pub trait CommitStatusUpdater: Send + Sync {
    async fn update(
        &self,
        repo: &Repo,
        pull: &PullRequest,
        status: CommitStatus,
        command: CommandName,
    ) -> Result<(), VcsError>;
}

/// [`CommitStatusUpdater`] that derives the description from the command and
/// status and forwards to a [`VcsClient`].
pub struct DefaultCommitStatusUpdater {
    client: Arc<dyn VcsClient>,
}

impl DefaultCommitStatusUpdater {
    pub fn new(client: Arc<dyn VcsClient>) -> Self {
        Self { client }
    }

    /// `Plan succeeded.`, `Apply failed.`, `Plan in progress...`
    pub fn description(status: CommitStatus, command: CommandName) -> String {
        let suffix = match status {
            CommitStatus::Pending => "in progress...",
            CommitStatus::Success => "succeeded.",
            CommitStatus::Failed => "failed.",
        };
        format!("{} {}", command.title(), suffix)
    }
}

#[async_trait]
impl CommitStatusUpdater for DefaultCommitStatusUpdater {
    async fn update(
        &self,
        repo: &Repo,
        pull: &PullRequest,
        status: CommitStatus,
        command: CommandName,
    ) -> Result<(), VcsError> {
        let description = Self::description(status, command);
        self.client
            .update_status(repo, pull, status, &description)
            .await
    }
}
