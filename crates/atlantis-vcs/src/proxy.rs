//! Host-dispatching [`VcsClient`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use atlantis_core::{CommitStatus, PullRequest, Repo, VcsClient, VcsError, VcsHostType};

/// Routes each call to the client for the repository's host type.
#[derive(Clone, Default)]
pub struct ClientProxy {
    github: Option<Arc<dyn VcsClient>>,
    gitlab: Option<Arc<dyn VcsClient>>,
}

impl ClientProxy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_github(mut self, client: Arc<dyn VcsClient>) -> Self {
        self.github = Some(client);
        self
    }

    pub fn with_gitlab(mut self, client: Arc<dyn VcsClient>) -> Self {
        self.gitlab = Some(client);
        self
    }

    fn client_for(&self, repo: &Repo) -> Result<&dyn VcsClient, VcsError> {
        let host = repo.host_type();
        let client = match host {
            VcsHostType::Github => self.github.as_deref(),
            VcsHostType::Gitlab => self.gitlab.as_deref(),
        };
        client.ok_or_else(|| {
            warn!(%host, repo = %repo.full_name, "no VCS client configured");
            VcsError::UnsupportedHost(host)
        })
    }
}

#[async_trait]
impl VcsClient for ClientProxy {
    async fn create_comment(&self, repo: &Repo, pull_num: u64, body: &str) -> Result<(), VcsError> {
        self.client_for(repo)?
            .create_comment(repo, pull_num, body)
            .await
    }

    async fn update_status(
        &self,
        repo: &Repo,
        pull: &PullRequest,
        status: CommitStatus,
        description: &str,
    ) -> Result<(), VcsError> {
        self.client_for(repo)?
            .update_status(repo, pull, status, description)
            .await
    }
}
