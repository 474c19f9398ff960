//! API utility functions
//!
//! Helpers for relaying upstream bytes back to the caller.

use axum::body::Body;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::upstream::bilibili::content_type_or_default;

/// Cache directive attached to every proxied image
pub const PROXY_CACHE_CONTROL: &str = "public, max-age=86400";

/// Streams an upstream body back unmodified
///
/// Always answers 200, keeps the upstream content type (or
/// `application/octet-stream`) and marks the result cacheable for a day.
pub fn relay_stream(upstream: reqwest::Response) -> Response {
    let content_type = content_type_or_default(upstream.headers());

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, HeaderValue::from_static(PROXY_CACHE_CONTROL)),
        ],
        Body::from_stream(upstream.bytes_stream()),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(content_type: Option<&str>, body: &'static [u8]) -> reqwest::Response {
        let mut builder = axum::http::Response::builder().status(404);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        reqwest::Response::from(builder.body(body).unwrap())
    }

    #[tokio::test]
    async fn test_relay_keeps_content_type() {
        let response = relay_stream(upstream(Some("image/png"), b"\x89PNG"));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(response.headers()[header::CACHE_CONTROL], PROXY_CACHE_CONTROL);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), b"\x89PNG");
    }

    #[tokio::test]
    async fn test_relay_defaults_content_type() {
        let response = relay_stream(upstream(None, b"raw"));
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/octet-stream");
    }
}
