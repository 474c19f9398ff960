//! Response bodies for the gateway endpoints
//!
//! Upstream payloads (YouTube items, Firestore documents) are passed through
//! as `serde_json::Value`; only the envelopes are typed here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HelloResponse {
    pub message: String,
    pub message2: String,
    pub message3: String,
}

impl Default for HelloResponse {
    fn default() -> Self {
        Self {
            message: "Hello World.".to_string(),
            message2: "こんにちは、世界。".to_string(),
            message3: "世界，你好!".to_string(),
        }
    }
}

/// `{count, items}` for channel and video lookups
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MediaListResponse {
    pub count: usize,
    pub items: Vec<Value>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ErrorResponse {
    Details { error: &'static str, details: String },
    Message { error: &'static str, message: String },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
