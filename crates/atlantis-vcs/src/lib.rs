//! Atlantis VCS: GitHub and GitLab API clients
//!
//! - [`GithubClient`]: pull request source and VCS client for GitHub
//! - [`GitlabClient`]: merge request source and VCS client for GitLab
//! - [`ClientProxy`]: one [`atlantis_core::VcsClient`] over both, keyed by
//!   the repository's host type

pub mod error;
pub mod github;
pub mod gitlab;
mod http;
pub mod proxy;

pub use error::{Result, VcsApiError};
pub use github::{GithubClient, GithubConfig};
pub use gitlab::{GitlabClient, GitlabConfig};
pub use proxy::ClientProxy;
