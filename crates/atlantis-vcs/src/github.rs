//! GitHub REST API client
//!
//! Implements [`GithubPullGetter`] and [`VcsClient`] against
//! `api.github.com` or a GitHub Enterprise `/api/v3` endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use atlantis_core::{
    CommitStatus, FetchError, GithubPull, GithubPullGetter, PullRequest, Repo, VcsClient,
    VcsError,
};

use crate::error::Result;
use crate::http;

/// Commit status context shown in the pull request checks list.
pub const STATUS_CONTEXT: &str = "Atlantis";

/// GitHub configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubConfig {
    /// REST API base URL
    pub api_url: String,
    /// User the token belongs to
    pub user: String,
    pub token: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        GithubConfig {
            api_url: "https://api.github.com".to_string(),
            user: String::new(),
            token: String::new(),
        }
    }
}

impl GithubConfig {
    /// Read `ATLANTIS_GH_USER`, `ATLANTIS_GH_TOKEN` and `ATLANTIS_GH_HOSTNAME`.
    /// Returns `None` when no token is set.
    pub fn from_env() -> Option<Self> {
        let token = std::env::var("ATLANTIS_GH_TOKEN").ok().filter(|t| !t.is_empty())?;
        let mut config = Self::default().with_token(token);
        if let Ok(user) = std::env::var("ATLANTIS_GH_USER") {
            config = config.with_user(user);
        }
        if let Ok(hostname) = std::env::var("ATLANTIS_GH_HOSTNAME") {
            config = config.with_hostname(&hostname);
        }
        Some(config)
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Point at a GitHub Enterprise host. `github.com` keeps the public API.
    pub fn with_hostname(self, hostname: &str) -> Self {
        if hostname.is_empty() || hostname == "github.com" {
            return self.with_api_url("https://api.github.com");
        }
        self.with_api_url(format!("https://{hostname}/api/v3"))
    }
}

/// Client for the GitHub REST API
pub struct GithubClient {
    config: GithubConfig,
    http_client: reqwest::Client,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> Result<Self> {
        Ok(GithubClient {
            config,
            http_client: http::build_client()?,
        })
    }

    pub fn config(&self) -> &GithubConfig {
        &self.config
    }

    fn repo_url(&self, repo_full_name: &str, rest: &[&str]) -> Result<reqwest::Url> {
        let mut segments = vec!["repos"];
        segments.extend(repo_full_name.split('/'));
        segments.extend_from_slice(rest);
        http::endpoint(&self.config.api_url, &segments)
    }

    pub fn pull_url(&self, repo_full_name: &str, num: u64) -> Result<reqwest::Url> {
        self.repo_url(repo_full_name, &["pulls", &num.to_string()])
    }

    /// Pull request comments go through the issues API.
    pub fn comments_url(&self, repo_full_name: &str, num: u64) -> Result<reqwest::Url> {
        self.repo_url(repo_full_name, &["issues", &num.to_string(), "comments"])
    }

    pub fn status_url(&self, repo_full_name: &str, sha: &str) -> Result<reqwest::Url> {
        self.repo_url(repo_full_name, &["statuses", sha])
    }

    fn request(&self, method: reqwest::Method, url: reqwest::Url) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("token {}", self.config.token))
    }

    async fn fetch_pull(&self, repo: &Repo, num: u64) -> Result<GithubPull> {
        let url = self.pull_url(&repo.full_name, num)?;
        debug!(%url, "fetching pull request");
        let response = self.request(reqwest::Method::GET, url).send().await?;
        Ok(http::check("GET", response).await?.json().await?)
    }

    async fn post_comment(&self, repo: &Repo, num: u64, body: &str) -> Result<()> {
        let url = self.comments_url(&repo.full_name, num)?;
        debug!(%url, "creating comment");
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
                "description": description,
                "context": STATUS_CONTEXT,
            }))
            .send()
            .await?;
        http::check("POST", response).await?;
        Ok(())
    }
}

/// GitHub commit status `state` value.
pub fn status_state(status: CommitStatus) -> &'static str {
    match status {
        CommitStatus::Pending => "pending",
        CommitStatus::Success => "success",
        CommitStatus::Failed => "failure",
    }
}

#[async_trait]
impl GithubPullGetter for GithubClient {
    async fn get_pull_request(
        &self,
        repo: &Repo,
        num: u64,
    ) -> std::result::Result<GithubPull, FetchError> {
        Ok(self.fetch_pull(repo, num).await?)
    }
}

#[async_trait]
impl VcsClient for GithubClient {
    async fn create_comment(
        &self,
        repo: &Repo,
        pull_num: u64,
        body: &str,
    ) -> std::result::Result<(), VcsError> {
        Ok(self.post_comment(repo, pull_num, body).await?)
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
