//! GitLab REST API (v4) client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use atlantis_core::{
    CommitStatus, FetchError, GitlabMergeRequest, GitlabMergeRequestGetter, PullRequest, Repo,
    VcsClient, VcsError,
};

use crate::error::Result;
use crate::http;

/// Pipeline status name shown on the merge request.
pub const STATUS_NAME: &str = "Atlantis";

/// GitLab configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitlabConfig {
    /// REST API base URL, including `/api/v4`
    pub api_url: String,
    pub token: String,
}

impl Default for GitlabConfig {
    fn default() -> Self {
        GitlabConfig {
            api_url: "https://gitlab.com/api/v4".to_string(),
            token: String::new(),
        }
    }
}

impl GitlabConfig {
    /// Read `ATLANTIS_GITLAB_TOKEN` and `ATLANTIS_GITLAB_HOSTNAME`.
    /// Returns `None` when no token is set.
    pub fn from_env() -> Option<Self> {
        let token = std::env::var("ATLANTIS_GITLAB_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())?;
        let config = Self::default().with_token(token);
        Some(match std::env::var("ATLANTIS_GITLAB_HOSTNAME") {
            Ok(hostname) => config.with_hostname(&hostname),
            Err(_) => config,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Point at a self-managed GitLab host.
    pub fn with_hostname(self, hostname: &str) -> Self {
        let hostname = if hostname.is_empty() { "gitlab.com" } else { hostname };
        self.with_api_url(format!("https://{hostname}/api/v4"))
    }
}

/// Client for the GitLab REST API
pub struct GitlabClient {
    config: GitlabConfig,
    http_client: reqwest::Client,
}

impl GitlabClient {
    pub fn new(config: GitlabConfig) -> Result<Self> {
        Ok(GitlabClient {
            config,
            http_client: http::build_client()?,
        })
    }

    pub fn config(&self) -> &GitlabConfig {
        &self.config
    }

    /// The project path is a single URL-encoded segment, so nested groups
    /// (`group/sub/project`) address the right project.
    fn project_url(&self, repo_full_name: &str, rest: &[&str]) -> Result<reqwest::Url> {
        let mut segments = vec!["projects", repo_full_name];
        segments.extend_from_slice(rest);
        http::endpoint(&self.config.api_url, &segments)
    }

    pub fn merge_request_url(&self, repo_full_name: &str, iid: u64) -> Result<reqwest::Url> {
        self.project_url(repo_full_name, &["merge_requests", &iid.to_string()])
    }

    pub fn notes_url(&self, repo_full_name: &str, iid: u64) -> Result<reqwest::Url> {
        self.project_url(repo_full_name, &["merge_requests", &iid.to_string(), "notes"])
    }

    pub fn status_url(&self, repo_full_name: &str, sha: &str) -> Result<reqwest::Url> {
        self.project_url(repo_full_name, &["statuses", sha])
    }

    fn request(&self, method: reqwest::Method, url: reqwest::Url) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, url)
            .header("PRIVATE-TOKEN", &self.config.token)
    }

    async fn fetch_merge_request(
        &self,
        repo_full_name: &str,
        iid: u64,
    ) -> Result<GitlabMergeRequest> {
        let url = self.merge_request_url(repo_full_name, iid)?;
        debug!(%url, "fetching merge request");
        let response = self.request(reqwest::Method::GET, url).send().await?;
        Ok(http::check("GET", response).await?.json().await?)
    }

    async fn post_note(&self, repo: &Repo, iid: u64, body: &str) -> Result<()> {
        let url = self.notes_url(&repo.full_name, iid)?;
        debug!(%url, "creating note");
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&json!({ "body": body }))
            .send()
            .await?;
        http::check("POST", response).await?;
        Ok(())
    }

    async fn post_status(
        &self,
        repo: &Repo,
        pull: &PullRequest,
        status: CommitStatus,
        description: &str,
    ) -> Result<()> {
        let url = self.status_url(&repo.full_name, &pull.head_commit)?;
        debug!(%url, state = status_state(status), "updating commit status");
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&json!({
                "state": status_state(status),
                "ref": pull.head_branch,
                "name": STATUS_NAME,
                "description": description,
                "target_url": pull.url,
            }))
            .send()
            .await?;
        http::check("POST", response).await?;
        Ok(())
    }
}

/// GitLab commit status `state` value.
pub fn status_state(status: CommitStatus) -> &'static str {
    match status {
        CommitStatus::Pending => "pending",
        CommitStatus::Success => "success",
        CommitStatus::Failed => "failed",
    }
}

#[async_trait]
impl GitlabMergeRequestGetter for GitlabClient {
    async fn get_merge_request(
        &self,
        repo_full_name: &str,
        num: u64,
    ) -> std::result::Result<GitlabMergeRequest, FetchError> {
        Ok(self.fetch_merge_request(repo_full_name, num).await?)
    }
}

#[async_trait]
impl VcsClient for GitlabClient {
    async fn create_comment(
        &self,
        repo: &Repo,
        pull_num: u64,
        body: &str,
    ) -> std::result::Result<(), VcsError> {
        Ok(self.post_note(repo, pull_num, body).await?)
    }

    async fn update_status(
        &self,
        repo: &Repo,
        pull: &PullRequest,
        status: CommitStatus,
        description: &str,
    ) -> std::result::Result<(), VcsError> {
        Ok(self.post_status(repo, pull, status, description).await?)
    }
}
