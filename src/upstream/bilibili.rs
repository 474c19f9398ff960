//! Bilibili video metadata lookup and CDN image fetches
//!
//! Both calls carry a `Referer` pointing at bilibili.com; the API and the
//! image CDN reject requests without it.

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, REFERER, USER_AGENT};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::{Result, UpstreamError, ensure_success};

const VIEW_PATH: &str = "/x/web-interface/view";
const OCTET_STREAM: &str = "application/octet-stream";

/// Metadata for one video, split into named sub-objects and a scalar bag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoView {
    pub pic: Value,
    pub title: Value,
    pub owner: Value,
    pub stat: Value,
    pub data: Map<String, Value>,
    pub pages: Value,
}

impl VideoView {
    /// Scalars go to `data`; objects and arrays are dropped from it.
    /// The named fields are lifted out as-is (missing ones become `null`).
    pub fn partition(raw: Map<String, Value>) -> Self {
        let data = raw
            .iter()
            .filter(|(_, value)| !value.is_object() && !value.is_array())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let field = |name: &str| raw.get(name).cloned().unwrap_or(Value::Null);

        Self {
            pic: field("pic"),
            title: field("title"),
            owner: field("owner"),
            stat: field("stat"),
            pages: field("pages"),
            data,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ViewEnvelope {
    /// Absent means empty; an explicit `null` is an error
    #[serde(default = "empty_object")]
    data: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Fallback when the upstream omits `Content-Type`
pub fn content_type_or_default(headers: &HeaderMap) -> HeaderValue {
    headers
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(OCTET_STREAM))
}

pub struct BilibiliClient {
    api: Client,
    images: Client,
    api_base_url: String,
    referer: HeaderValue,
    user_agent: HeaderValue,
}

impl BilibiliClient {
    /// `images` should carry the proxy timeout; `api` the regular one.
    pub fn new(
        api: Client,
        images: Client,
        api_base_url: impl Into<String>,
        referer: HeaderValue,
        user_agent: HeaderValue,
    ) -> Self {
        Self {
            api,
            images,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            referer,
            user_agent,
        }
    }

    pub async fn video_view(&self, bvid: &str) -> Result<VideoView> {
        let url = format!("{}{}", self.api_base_url, VIEW_PATH);

        let response = self
            .api
            .get(&url)
            .query(&[("bvid", bvid)])
            .header(REFERER, self.referer.clone())
            .header(USER_AGENT, self.user_agent.clone())
            .send()
            .await?;

        let envelope: ViewEnvelope = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(UpstreamError::from)?;

        let raw = match envelope.data {
            Value::Object(map) => map,
            other => {
                return Err(UpstreamError::InvalidBody(format!(
                    "'data' is not an object: {other}"
                )));
            }
        };

        debug!(bvid, fields = raw.len(), "Bilibili view fetched");
        Ok(VideoView::partition(raw))
    }

    /// Starts fetching `url`; the caller streams the body.
    ///
    /// The upstream status is not checked, so error pages are relayed as-is.
    /// Any URL is accepted: this is an open proxy.
    pub async fn fetch_image(&self, url: &str) -> Result<Response> {
        let response = self
            .images
            .get(url)
            .header(REFERER, self.referer.clone())
            .send()
            .await?;

        debug!(status = response.status().as_u16(), "Image upstream responded");
        Ok(response)
    }
}
