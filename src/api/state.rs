use std::sync::Arc;

use reqwest::header::HeaderValue;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{Config, ConfigError};
use crate::countdown::{Clock, SystemClock};
use crate::upstream::{
    self, BilibiliClient, CredentialsError, DocumentStore, FirestoreClient, ServiceAccountKey,
    ServiceAccountTokens, UpstreamError, YoutubeClient,
};

/// Reasons the gateway refuses to start serving
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid Google credentials: {0}")]
    Credentials(#[from] CredentialsError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] UpstreamError),

    #[error("{field} is not a valid header value")]
    InvalidHeader { field: &'static str },
}

#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<dyn DocumentStore>,
    pub youtube: Arc<YoutubeClient>,
    pub bilibili: Arc<BilibiliClient>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        youtube: YoutubeClient,
        bilibili: BilibiliClient,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            documents,
            youtube: Arc::new(youtube),
            bilibili: Arc::new(bilibili),
            clock,
        }
    }

    /// Builds every adapter from configuration
    ///
    /// Fails when a secret is missing or malformed, so the process never
    /// starts serving half-configured.
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let request_timeout = config.upstream.request_timeout.as_duration();
        let connect_timeout = config.upstream.connect_timeout.as_duration();

        let key = ServiceAccountKey::from_base64(config.firestore_credentials()?)?;
        if let Some(project) = key.project_id.as_deref() {
            if project != config.firestore.project_id {
                warn!(
                    credentials_project = project,
                    configured_project = %config.firestore.project_id,
                    "Service account belongs to a different project"
                );
            }
        }
        info!(client_email = %key.client_email, "Loaded service account credentials");

        let api_key = config.youtube_api_key()?;

        let http = upstream::build_client(request_timeout, connect_timeout)?;
        let image_http = upstream::build_streaming_client(
            config.bilibili.proxy_timeout.as_duration(),
            connect_timeout,
        )?;

        let tokens = Arc::new(ServiceAccountTokens::new(key, http.clone()));
        let documents = FirestoreClient::new(
            http.clone(),
            tokens,
            config.firestore.base_url.clone(),
            config.firestore.project_id.clone(),
            config.firestore.database.clone(),
            config.firestore.collection.clone(),
        );

        let youtube = YoutubeClient::new(http.clone(), config.youtube.base_url.clone(), api_key);

        let bilibili = BilibiliClient::new(
            http,
            image_http,
            config.bilibili.api_base_url.clone(),
            header_value("bilibili.referer", &config.bilibili.referer)?,
            header_value("bilibili.user_agent", &config.bilibili.user_agent)?,
        );

        Ok(Self::new(
            Arc::new(documents),
            youtube,
            bilibili,
            Arc::new(SystemClock),
        ))
    }
}

fn header_value(field: &'static str, value: &str) -> Result<HeaderValue, StartupError> {
    HeaderValue::from_str(value).map_err(|_| StartupError::InvalidHeader { field })
}
