//! Error taxonomy for comment-command orchestration.
//!
//! Fetch and parse failures are fatal to the current request and are posted
//! back as a code-quoted comment through [`PullResolutionError`]. Build
//! failures are folded into the execution outcome. VCS errors from the final
//! reporting step are logged only.

use crate::models::VcsHostType;

/// Errors constructing a [`crate::models::Repo`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepoError {
    #[error("repo full name cannot be empty")]
    EmptyFullName,

    #[error("invalid repo full name {full_name:?}: expected owner/name")]
    InvalidFullName { full_name: String },

    #[error("invalid clone url {url:?}: expected an http(s) URL")]
    InvalidCloneUrl { url: String },
}

/// Failure fetching a pull/merge request from the provider API.
///
/// `Display` is the underlying error text, unmodified, since it is quoted
/// verbatim in the comment posted back to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    Transport(String),

    #[error("GET {url} returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("decoding response body: {0}")]
    Decode(String),
}

/// The raw pull request is missing fields the canonical model requires.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("{0} is null")]
    MissingField(&'static str),

    #[error(transparent)]
    InvalidRepo(#[from] RepoError),

    #[error("{0}")]
    Invalid(String),
}

/// The project command builder could not expand a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("invalid dir {dir:?}: {reason}")]
    InvalidDir { dir: String, reason: String },

    #[error("{0}")]
    Config(String),
}

/// Errors returned by VCS client operations (commenting, commit statuses).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VcsError {
    #[error("{0}")]
    Api(String),

    #[error("no VCS client configured for {0}")]
    UnsupportedHost(VcsHostType),
}

/// Failure resolving the request's pull request. `Display` is the text that
/// is posted back, code-quoted, as `Error: <display>`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PullResolutionError {
    #[error("making pull request API call to GitHub: {0}")]
    GithubFetch(#[source] FetchError),

    #[error("making merge request API call to GitLab: {0}")]
    GitlabFetch(#[source] FetchError),

    #[error("extracting required fields from comment data: {0}")]
    Parse(#[from] ParseError),
}

impl PullResolutionError {
    /// Comment body posted to the pull request.
    pub fn comment(&self) -> String {
        format!("`Error: {self}`")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_comment_keeps_underlying_text() {
        let err = PullResolutionError::GithubFetch(FetchError::Transport("err".to_string()));
        assert_eq!(
            err.comment(),
            "`Error: making pull request API call to GitHub: err`"
        );

        let err = PullResolutionError::GitlabFetch(FetchError::Transport("err".to_string()));
        assert_eq!(
            err.comment(),
            "`Error: making merge request API call to GitLab: err`"
        );
    }

    #[test]
    fn test_parse_error_comment() {
        let err = PullResolutionError::from(ParseError::Invalid("err".to_string()));
        assert_eq!(
            err.comment(),
            "`Error: extracting required fields from comment data: err`"
        );

        let err = PullResolutionError::from(ParseError::MissingField("head.sha"));
        assert!(err.comment().contains("head.sha is null"));
    }

    #[test]
    fn test_repo_error_display() {
        let err = RepoError::InvalidFullName {
            full_name: "nope".to_string(),
        };
        assert!(err.to_string().contains("expected owner/name"));
    }
}
