//! Blocking HTTP plumbing shared by the embedding, retrieval and completion
//! clients. Each outbound call is a single attempt: there is no retry here.

#[cfg(test)]
mod tests;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Error bodies longer than this are cut before they reach logs
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("blocking task failed: {0}")]
    TaskJoin(String),
}

impl UpstreamError {
    /// HTTP status reported by the upstream, if it answered at all
    #[inline]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Build an agent that reports HTTP error statuses as responses so their
/// bodies can be logged.
#[inline]
pub fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Append `path` to `base` without discarding the base path.
///
/// `Url::join` replaces the last segment of a base without a trailing slash,
/// which would turn `.../api/v1` + `chat/completions` into
/// `.../api/chat/completions`.
#[inline]
pub fn endpoint(base: &Url, path: &str) -> Result<Url, UpstreamError> {
    let raw = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&raw).map_err(|e| UpstreamError::InvalidInput(format!("bad endpoint {raw}: {e}")))
}

/// POST a JSON body and decode a JSON response
#[inline]
pub fn post_json<Req, Resp>(
    agent: &ureq::Agent,
    url: &Url,
    headers: &[(&str, &str)],
    body: &Req,
) -> Result<Resp, UpstreamError>
where
    Req: Serialize + ?Sized,
    Resp: DeserializeOwned,
{
    let payload = serde_json::to_string(body)
        .map_err(|e| UpstreamError::InvalidInput(format!("failed to encode request: {e}")))?;

    debug!("POST {} ({} bytes)", url, payload.len());

    let mut request = agent
        .post(url.as_str())
        .header("Content-Type", "application/json");
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let response = request
        .send(&payload)
        .map_err(|e| UpstreamError::Transport(e.to_string()))?;

    read_json(url, response)
}

/// GET a JSON document
#[inline]
pub fn get_json<Resp>(
    agent: &ureq::Agent,
    url: &Url,
    headers: &[(&str, &str)],
) -> Result<Resp, UpstreamError>
where
    Resp: DeserializeOwned,
{
    debug!("GET {}", url);

    let mut request = agent.get(url.as_str());
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let response = request
        .call()
        .map_err(|e| UpstreamError::Transport(e.to_string()))?;

    read_json(url, response)
}

fn read_json<Resp>(
    url: &Url,
    mut response: ureq::http::Response<ureq::Body>,
) -> Result<Resp, UpstreamError>
where
    Resp: DeserializeOwned,
{
    let status = response.status().as_u16();
    let text = response
        .body_mut()
        .read_to_string()
        .map_err(|e| UpstreamError::Transport(format!("failed to read response body: {e}")))?;

    if !(200..300).contains(&status) {
        warn!("{} answered HTTP {}", url, status);
        return Err(UpstreamError::Status {
            status,
            body: truncate_body(&text),
        });
    }

    serde_json::from_str(&text).map_err(|e| UpstreamError::Decode(e.to_string()))
}

fn truncate_body(body: &str) -> String {
    let mut chars = body.chars();
    let mut truncated: String = chars.by_ref().take(MAX_ERROR_BODY_CHARS).collect();
    if chars.next().is_some() {
        truncated.push('…');
    }
    truncated
}

/// Run a blocking upstream call on tokio's blocking pool
#[inline]
pub async fn run_blocking<T, F>(call: F) -> Result<T, UpstreamError>
where
    F: FnOnce() -> Result<T, UpstreamError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| UpstreamError::TaskJoin(e.to_string()))?
}
