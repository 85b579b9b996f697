//! Raw GitHub pull request payload.
//!
//! Only the fields the event parser reads are modelled. Every field is
//! optional so a partial payload deserializes and the parser can report
//! exactly which field is missing.

use serde::{Deserialize, Serialize};

/// `GET /repos/{owner}/{repo}/pulls/{number}` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubPull {
    pub number: Option<u64>,
    pub state: Option<String>,
    pub merged: Option<bool>,
    pub html_url: Option<String>,
    pub user: Option<GithubUser>,
    pub head: Option<GithubBranch>,
    pub base: Option<GithubBranch>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubUser {
    pub login: Option<String>,
}

/// `head` / `base` object of a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubBranch {
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    pub sha: Option<String>,
    pub repo: Option<GithubRepository>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubRepository {
    pub full_name: Option<String>,
    pub clone_url: Option<String>,
}
