//! Firestore document store adapter (REST API v1)

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::google_auth::{TokenError, TokenSource};
use super::{UpstreamError, ensure_success};

const PAGE_SIZE: u32 = 300;

#[derive(Debug, Error)]
pub enum FirestoreError {
    #[error("authentication failed: {0}")]
    Auth(#[from] TokenError),

    #[error("request failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("could not decode document '{name}': {reason}")]
    Decode { name: String, reason: String },
}

/// A decoded document: plain JSON fields plus `id`
pub type Document = Map<String, Value>;

/// Read access to the one collection the gateway exposes
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Collection name, also the key of the response body
    fn collection(&self) -> &str;

    /// Every document in the collection, in store order
    async fn fetch_all(&self) -> Result<Vec<Document>, FirestoreError>;
}

/// Typed value as returned by the REST API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FirestoreValue {
    NullValue(Value),
    BooleanValue(bool),
    /// int64 values are JSON strings
    IntegerValue(Value),
    /// NaN and infinities arrive as strings
    DoubleValue(Value),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(GeoPoint),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Deserialize)]
pub struct GeoPoint {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<FirestoreValue>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, FirestoreValue>,
}

impl FirestoreValue {
    /// Converts to plain JSON; the error is a human-readable reason
    pub fn into_json(self) -> Result<Value, String> {
        Ok(match self {
            FirestoreValue::NullValue(_) => Value::Null,
            FirestoreValue::BooleanValue(b) => Value::Bool(b),
            FirestoreValue::IntegerValue(v) => match v {
                Value::String(s) => s
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|e| format!("integerValue '{s}': {e}"))?,
                Value::Number(n) => Value::Number(n),
                other => return Err(format!("integerValue has unexpected shape: {other}")),
            },
            FirestoreValue::DoubleValue(v) => match v {
                Value::Number(n) => Value::Number(n),
                // "NaN" / "Infinity" have no JSON representation
                Value::String(_) => Value::Null,
                other => return Err(format!("doubleValue has unexpected shape: {other}")),
            },
            FirestoreValue::TimestampValue(s)
            | FirestoreValue::StringValue(s)
            | FirestoreValue::BytesValue(s)
            | FirestoreValue::ReferenceValue(s) => Value::String(s),
            FirestoreValue::GeoPointValue(point) => {
                let mut map = Map::new();
                map.insert("latitude".to_string(), number(point.latitude));
                map.insert("longitude".to_string(), number(point.longitude));
                Value::Object(map)
            }
            FirestoreValue::ArrayValue(array) => Value::Array(
                array
                    .values
                    .into_iter()
                    .map(FirestoreValue::into_json)
                    .collect::<Result<_, _>>()?,
            ),
            FirestoreValue::MapValue(map) => Value::Object(decode_fields(map.fields)?),
        })
    }
}

fn number(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

fn decode_fields(fields: BTreeMap<String, FirestoreValue>) -> Result<Map<String, Value>, String> {
    fields
        .into_iter()
        .map(|(key, value)| value.into_json().map(|json| (key, json)))
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct RawDocument {
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl RawDocument {
    /// Last segment of the resource name
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    pub fn into_document(self) -> Result<Document, FirestoreError> {
        let id = self.id().to_string();
        let decode_err = |reason: String| FirestoreError::Decode {
            name: self.name.clone(),
            reason,
        };

        let mut document = Map::new();
        for (key, raw) in &self.fields {
            let typed: FirestoreValue = serde_json::from_value(raw.clone())
                .map_err(|e| decode_err(format!("field '{key}': {e}")))?;
            let value = typed
                .into_json()
                .map_err(|reason| decode_err(format!("field '{key}': {reason}")))?;
            document.insert(key.clone(), value);
        }

        document.insert("id".to_string(), Value::String(id));
        Ok(document)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Firestore REST client scoped to one project, database and collection
pub struct FirestoreClient {
    http: Client,
    tokens: Arc<dyn TokenSource>,
    base_url: String,
    project_id: String,
    database: String,
    collection: String,
}

impl FirestoreClient {
    pub fn new(
        http: Client,
        tokens: Arc<dyn TokenSource>,
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            http,
            tokens,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            database: database.into(),
            collection: collection.into(),
        }
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents/{}",
            self.base_url, self.project_id, self.database, self.collection
        )
    }

    async fn fetch_page(
        &self,
        token: &str,
        page_token: Option<&str>,
    ) -> Result<ListDocumentsResponse, FirestoreError> {
        let mut request = self
            .http
            .get(self.collection_url())
            .bearer_auth(token)
            .query(&[("pageSize", PAGE_SIZE.to_string())]);
        if let Some(page_token) = page_token {
            request = request.query(&[("pageToken", page_token)]);
        }

        let response = request.send().await.map_err(UpstreamError::from)?;
        let page = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(UpstreamError::from)?;
        Ok(page)
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn fetch_all(&self) -> Result<Vec<Document>, FirestoreError> {
        let token = self.tokens.access_token().await?;

        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.fetch_page(&token, page_token.as_deref()).await?;
            pages += 1;

            for raw in page.documents {
                documents.push(raw.into_document()?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!(collection = %self.collection, pages, count = documents.len(), "Fetched documents");
        Ok(documents)
    }
}
