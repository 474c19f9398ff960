//! Google service account credentials and OAuth2 access tokens
//!
//! The service account JSON arrives base64-encoded from the environment.
//! Access tokens are obtained with the JWT bearer grant and reused until
//! shortly before they expire.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use super::{UpstreamError, ensure_success};

const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
/// Tokens closer than this to expiry are refreshed
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("credentials are not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("credentials are not valid service account JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("service account private key is invalid: {0}")]
    PrivateKey(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("token exchange failed: {0}")]
    Exchange(#[from] UpstreamError),
}

/// Fields of a service account key file that token exchange needs
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(default)]
    pub project_id: Option<String>,
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_base64(encoded: &str) -> Result<Self, CredentialsError> {
        let raw = STANDARD.decode(encoded.trim())?;
        let key: ServiceAccountKey = serde_json::from_slice(&raw)?;
        // Surface a bad key at startup instead of on the first request
        EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        Ok(key)
    }
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: i64,
}

/// Source of bearer tokens for Google APIs
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, TokenError>;
}

/// Fixed bearer token with no exchange behind it
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, TokenError> {
        Ok(self.0.clone())
    }
}

/// Exchanges signed JWT assertions for access tokens
pub struct ServiceAccountTokens {
    key: ServiceAccountKey,
    http: Client,
    cache: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokens {
    pub fn new(key: ServiceAccountKey, http: Client) -> Self {
        Self {
            key,
            http,
            cache: Mutex::new(None),
        }
    }

    fn assertion(&self) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = JwtClaims {
            iss: &self.key.client_email,
            sub: &self.key.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };

        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)?)
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokens {
    async fn access_token(&self) -> Result<String, TokenError> {
        // Held across the exchange so concurrent callers share one refresh
        let mut cache = self.cache.lock().await;

        let now = Utc::now().timestamp();
        if let Some(cached) = cache
            .as_ref()
            .filter(|cached| cached.expires_at > now + REFRESH_MARGIN_SECS)
        {
            return Ok(cached.access_token.clone());
        }

        let assertion = self.assertion()?;
        let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(UpstreamError::from)?;
        let token: TokenResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(UpstreamError::from)?;

        debug!(expires_in = token.expires_in, "Obtained Google access token");

        *cache = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Utc::now().timestamp() + token.expires_in,
        });

        Ok(token.access_token)
    }
}
