//! Service account token exchange against a mock OAuth2 endpoint
//!
//! The fixture key is a throwaway RSA key generated for these tests only.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mediagate::upstream::{ServiceAccountKey, ServiceAccountTokens, TokenSource};

const TEST_PRIVATE_KEY: &str = include_str!("fixtures/test_service_account_key.pem");

fn encoded_key(token_uri: &str) -> String {
    let json = json!({
        "type": "service_account",
        "project_id": "myvue3-e45b9",
        "private_key_id": "test",
        "private_key": TEST_PRIVATE_KEY,
        "client_email": "gateway@myvue3-e45b9.iam.gserviceaccount.com",
        "client_id": "1234567890",
        "token_uri": token_uri,
    });
    STANDARD.encode(json.to_string())
}

#[test]
fn test_decodes_base64_service_account() {
    let key = ServiceAccountKey::from_base64(&encoded_key("https://oauth2.googleapis.com/token"))
        .unwrap();

    assert_eq!(key.project_id.as_deref(), Some("myvue3-e45b9"));
    assert_eq!(key.client_email, "gateway@myvue3-e45b9.iam.gserviceaccount.com");
    assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");
}

#[tokio::test]
async fn test_token_is_exchanged_once_and_reused() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.test",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let key = ServiceAccountKey::from_base64(&encoded_key(&format!("{}/token", server.uri())))
        .unwrap();
    let tokens = ServiceAccountTokens::new(key, reqwest::Client::new());

    assert_eq!(tokens.access_token().await.unwrap(), "ya29.test");
    assert_eq!(tokens.access_token().await.unwrap(), "ya29.test");
}

#[tokio::test]
async fn test_concurrent_callers_share_one_exchange() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "ya29.shared", "expires_in": 3599}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let key = ServiceAccountKey::from_base64(&encoded_key(&format!("{}/token", server.uri())))
        .unwrap();
    let tokens = Arc::new(ServiceAccountTokens::new(key, reqwest::Client::new()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let tokens = Arc::clone(&tokens);
            tokio::spawn(async move { tokens.access_token().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "ya29.shared");
    }
}

#[tokio::test]
async fn test_rejected_exchange_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&server)
        .await;

    let key = ServiceAccountKey::from_base64(&encoded_key(&format!("{}/token", server.uri())))
        .unwrap();
    let tokens = ServiceAccountTokens::new(key, reqwest::Client::new());

    let err = tokens.access_token().await.unwrap_err();
    assert!(err.to_string().contains("invalid_grant"));
}
