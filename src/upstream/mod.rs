//! Outbound adapters for the backends behind the gateway
//!
//! Each adapter wraps one `reqwest::Client` built at startup and performs a
//! single logical call per inbound request. There are no retries and no
//! response caching.

pub mod bilibili;
pub mod firestore;
pub mod google_auth;
pub mod youtube;

use reqwest::{Client, Response, Url};
use std::time::Duration;
use thiserror::Error;

pub use bilibili::{BilibiliClient, VideoView};
pub use firestore::{DocumentStore, FirestoreClient, FirestoreError};
pub use google_auth::{CredentialsError, ServiceAccountKey, ServiceAccountTokens, StaticToken, TokenSource};
pub use youtube::{MediaKind, YoutubeClient};

const MAX_REDIRECTS: usize = 10;
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Too many redirects")]
    TooManyRedirects,

    #[error("Upstream returned HTTP {status} for url '{url}': {body}")]
    Status { status: u16, url: String, body: String },

    #[error("Invalid response body: {0}")]
    InvalidBody(String),
}

pub type Result<T> = std::result::Result<T, UpstreamError>;

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout
        } else if e.is_redirect() {
            UpstreamError::TooManyRedirects
        } else if e.is_builder() {
            UpstreamError::InvalidUrl(e.without_url().to_string())
        } else if e.is_decode() {
            UpstreamError::InvalidBody(e.without_url().to_string())
        } else {
            // URLs may carry API keys in their query string
            UpstreamError::RequestFailed(e.without_url().to_string())
        }
    }
}

/// Builds the shared client for one adapter
pub fn build_client(request_timeout: Duration, connect_timeout: Duration) -> Result<Client> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(request_timeout)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(|e| UpstreamError::RequestFailed(e.to_string()))
}

/// Builds a client for bodies that are streamed through to the caller
///
/// `read_timeout` bounds each read, not the whole transfer, so a slow but
/// steady body is never cut off after the caller already received 200.
pub fn build_streaming_client(read_timeout: Duration, connect_timeout: Duration) -> Result<Client> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .read_timeout(read_timeout)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(|e| UpstreamError::RequestFailed(e.to_string()))
}

/// Turns a non-2xx response into [`UpstreamError::Status`]
pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = redact(response.url());
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Unknown").to_string());

    Err(UpstreamError::Status {
        status: status.as_u16(),
        url,
        body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    })
}

/// Drops the query string so keys never end up in error bodies or logs
pub(crate) fn redact(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_strips_query() {
        let url = Url::parse("https://www.googleapis.com/youtube/v3/videos?id=a&key=secret").unwrap();
        assert_eq!(redact(&url), "https://www.googleapis.com/youtube/v3/videos");
    }

    #[tokio::test]
    async fn test_invalid_url_is_reported() {
        let client = build_client(Duration::from_secs(1), Duration::from_secs(1)).unwrap();
        let err = client.get("not a url").send().await.map_err(UpstreamError::from).unwrap_err();
        assert!(matches!(err, UpstreamError::InvalidUrl(_)));
    }
}
