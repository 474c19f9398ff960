use crate::humanize::HumanDuration;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub firestore: FirestoreConfig,
    #[serde(default)]
    pub youtube: YoutubeConfig,
    #[serde(default)]
    pub bilibili: BilibiliConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Shared limits for outbound metadata/document calls
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_request_timeout")]
    pub request_timeout: HumanDuration,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

fn default_request_timeout() -> HumanDuration {
    HumanDuration::from_secs(15)
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration::from_secs(5)
}

/// Firestore document store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FirestoreConfig {
    #[serde(default = "default_project_id")]
    pub project_id: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_firestore_base_url")]
    pub base_url: String,
    /// Base64-encoded service account JSON (loaded from environment, not from config file)
    #[serde(skip)]
    pub credentials_b64: Option<String>,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: default_project_id(),
            database: default_database(),
            collection: default_collection(),
            base_url: default_firestore_base_url(),
            credentials_b64: None,
        }
    }
}

fn default_project_id() -> String {
    "myvue3-e45b9".to_string()
}

fn default_database() -> String {
    "(default)".to_string()
}

fn default_collection() -> String {
    "myvue3food".to_string()
}

fn default_firestore_base_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

/// YouTube Data API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YoutubeConfig {
    #[serde(default = "default_youtube_base_url")]
    pub base_url: String,
    /// API key (loaded from environment, not from config file)
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            base_url: default_youtube_base_url(),
            api_key: None,
        }
    }
}

fn default_youtube_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

/// Bilibili API and image proxy configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BilibiliConfig {
    #[serde(default = "default_bilibili_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_referer")]
    pub referer: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-read limit for proxied images; the whole transfer is unbounded
    #[serde(default = "default_proxy_timeout")]
    pub proxy_timeout: HumanDuration,
}

impl Default for BilibiliConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_bilibili_api_base_url(),
            referer: default_referer(),
            user_agent: default_user_agent(),
            proxy_timeout: default_proxy_timeout(),
        }
    }
}

fn default_bilibili_api_base_url() -> String {
    "https://api.bilibili.com".to_string()
}

fn default_referer() -> String {
    "https://www.bilibili.com/".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/114.0.0.0 Safari/537.36"
        .to_string()
}

fn default_proxy_timeout() -> HumanDuration {
    HumanDuration::from_secs(10)
}
