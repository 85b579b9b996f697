//! Shared HTTP plumbing for the provider clients

use reqwest::{Response, Url};

use crate::error::{Result, VcsApiError};

pub(crate) const USER_AGENT: &str = concat!("atlantis/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
}

/// Append path segments to `base`. Each segment is percent-encoded on its
/// own, so `group/sub/project` becomes a single `group%2Fsub%2Fproject`
/// segment.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|_| VcsApiError::InvalidUrl(base.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| VcsApiError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turn a non-success response into [`VcsApiError::Status`], keeping the body.
pub(crate) async fn check(method: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(VcsApiError::Status {
        method,
        url,
        status: status.as_u16(),
        body,
    })
}
