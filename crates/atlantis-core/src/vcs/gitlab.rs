//! Raw GitLab merge request payload.

use serde::{Deserialize, Serialize};

/// `GET /projects/{id}/merge_requests/{iid}` response, reduced to the
/// fields the event parser reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitlabMergeRequest {
    pub iid: Option<u64>,
    /// `opened`, `closed`, `locked` or `merged`.
    pub state: Option<String>,
    pub sha: Option<String>,
    pub web_url: Option<String>,
    pub source_branch: Option<String>,
    pub target_branch: Option<String>,
    pub author: Option<GitlabUser>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitlabUser {
    pub username: Option<String>,
}
