//! YouTube Data API v3 channel and video lookups

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use tracing::debug;

use super::{Result, UpstreamError, ensure_success};

const PARTS: &str = "snippet,statistics";

/// Which listing endpoint a lookup targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Channel,
    Video,
}

impl MediaKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            MediaKind::Channel => "channels",
            MediaKind::Video => "videos",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Channel => write!(f, "channel"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<Value>,
}

pub struct YoutubeClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl YoutubeClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Looks up all `ids` in one request; items come back unmodified
    pub async fn lookup(&self, kind: MediaKind, ids: &[String]) -> Result<Vec<Value>> {
        let url = format!("{}/{}", self.base_url, kind.endpoint());
        let joined = ids.join(",");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("part", PARTS),
                ("id", joined.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let list: ListResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(UpstreamError::from)?;

        debug!(%kind, requested = ids.len(), returned = list.items.len(), "YouTube lookup completed");
        Ok(list.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_lookup_sends_one_batched_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/videos"))
            .and(query_param("part", "snippet,statistics"))
            .and(query_param("id", "a1,b2"))
            .and(query_param("key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "youtube#videoListResponse",
                "items": [{"id": "a1"}, {"id": "b2"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = YoutubeClient::new(Client::new(), server.uri(), "secret");
        let ids = vec!["a1".to_string(), "b2".to_string()];
        let items = client.lookup(MediaKind::Video, &ids).await.unwrap();

        assert_eq!(items, vec![json!({"id": "a1"}), json!({"id": "b2"})]);
    }

    #[tokio::test]
    async fn test_missing_items_is_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/channels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pageInfo": {}})))
            .mount(&server)
            .await;

        let client = YoutubeClient::new(Client::new(), server.uri(), "secret");
        let items = client
            .lookup(MediaKind::Channel, &["UCx".to_string()])
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_error_status_hides_api_key() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/channels"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quotaExceeded"))
            .mount(&server)
            .await;

        let client = YoutubeClient::new(Client::new(), server.uri(), "secret");
        let err = client
            .lookup(MediaKind::Channel, &["UCx".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, UpstreamError::Status { status: 403, .. }));
        assert!(!err.to_string().contains("secret"));
    }
}
