//! Error types for the provider API clients

use atlantis_core::{FetchError, VcsError};
use thiserror::Error;

/// Errors talking to a provider API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VcsApiError {
    /// Transport-level failure (DNS, TLS, connection reset, ...)
    #[error("{0}")]
    Http(String),

    /// The API answered with a non-success status
    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    /// The response body did not match the expected shape
    #[error("decoding response body: {0}")]
    Decode(String),

    /// The configured API URL cannot carry path segments
    #[error("invalid API URL {0:?}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for VcsApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            VcsApiError::Decode(err.to_string())
        } else {
            VcsApiError::Http(err.to_string())
        }
    }
}

impl From<VcsApiError> for FetchError {
    fn from(err: VcsApiError) -> Self {
        match err {
            VcsApiError::Status {
                url, status, body, ..
            } => FetchError::Status { url, status, body },
            VcsApiError::Decode(msg) => FetchError::Decode(msg),
            other => FetchError::Transport(other.to_string()),
        }
    }
}

impl From<VcsApiError> for VcsError {
    fn from(err: VcsApiError) -> Self {
        VcsError::Api(err.to_string())
    }
}

/// Result type for provider API calls
pub type Result<T> = std::result::Result<T, VcsApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_maps_to_fetch_status() {
        let err = VcsApiError::Status {
            method: "GET",
            url: "https://api.github.com/repos/o/r/pulls/1".to_string(),
            status: 404,
            body: "Not Found".to_string(),
        };
        assert_eq!(
            FetchError::from(err),
            FetchError::Status {
                url: "https://api.github.com/repos/o/r/pulls/1".to_string(),
                status: 404,
                body: "Not Found".to_string(),
            }
        );
    }

    #[test]
    fn test_transport_error_text_is_kept_verbatim() {
        let err = VcsApiError::Http("connection refused".to_string());
        assert_eq!(
            FetchError::from(err.clone()).to_string(),
            "connection refused"
        );
        assert_eq!(VcsError::from(err).to_string(), "connection refused");
    }
}
