//! Integration tests for IAM token management
//!
//! These tests run the token manager against a mock IAM endpoint and verify:
//! - First acquisition, caching and expiry-driven refresh
//! - Fallback to a full request once the refresh token is stale
//! - Authentication service error propagation
//! - Composition with the recognize request builder

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use watson_speech::config::SdkConfig;
use watson_speech::core::providers::iam::{
    IamTokenManager, SharedIamTokenManager, TokenProvider,
};
use watson_speech::core::stt::RecognizeRequest;
use watson_speech::errors::IamError;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, header, method, path},
};

const DAY: i64 = 24 * 60 * 60;

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

fn token_body(access_token: &str, expires_in: i64, expiration: i64) -> serde_json::Value {
    serde_json::json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": expires_in,
        "expiration": expiration,
        "refresh_token": format!("{access_token}-refresh"),
    })
}

fn token_url(server: &MockServer) -> String {
    format!("{}/identity/token", server.uri())
}

#[tokio::test]
async fn test_request_then_refresh_cycle() {
    let server = MockServer::start().await;
    let now = now();

    // Issued token is already inside its refresh window.
    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .and(header("authorization", "Basic Yng6Yng="))
        .and(body_string_contains("apikey=integration-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(
            "first",
            3600,
            now + 60,
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=first-refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(
            "second",
            3600,
            now + 3600,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut manager =
        IamTokenManager::new(Some("integration-key".to_string()), None, Some(token_url(&server)));

    assert_eq!(manager.get_token().await.unwrap(), "first");
    assert!(manager.is_token_expired());
    assert!(!manager.is_refresh_token_expired());

    assert_eq!(manager.get_token().await.unwrap(), "second");
    assert!(!manager.is_token_expired());

    // The refresh response replaced the cached state wholesale.
    let info = manager.token_info().unwrap();
    assert_eq!(info.expiration, Some(now + 3600));
    assert_eq!(info.refresh_token, "second-refresh");

    // Valid token: served from cache.
    assert_eq!(manager.get_token().await.unwrap(), "second");
}

#[tokio::test]
async fn test_stale_refresh_token_requests_again() {
    let server = MockServer::start().await;
    let now = now();

    Mock::given(method("POST"))
        .and(body_string_contains("response_type=cloud_iam"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(
            "old",
            3600,
            now - 8 * DAY,
        )))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("response_type=cloud_iam"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(
            "new",
            3600,
            now + 3600,
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let mut manager =
        IamTokenManager::new(Some("integration-key".to_string()), None, Some(token_url(&server)));

    assert_eq!(manager.get_token().await.unwrap(), "old");
    assert!(manager.is_refresh_token_expired());
    assert_eq!(manager.get_token().await.unwrap(), "new");
}

#[tokio::test]
async fn test_auth_service_error_reaches_caller() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "errorCode": "BXNIM0415E",
            "errorMessage": "Provided API key could not be found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut manager =
        IamTokenManager::new(Some("bogus".to_string()), None, Some(token_url(&server)));

    let err = manager.get_token().await.unwrap_err();
    assert!(err.is_auth_service_error());
    match err {
        IamError::AuthServiceError { status, message } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(message, "Provided API key could not be found");
        }
        other => panic!("Expected AuthServiceError, got {other:?}"),
    }
    assert!(manager.token_info().is_none());
}

#[tokio::test]
async fn test_pinned_token_never_calls_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let mut manager =
        IamTokenManager::new(Some("key".to_string()), None, Some(token_url(&server)));
    manager.set_access_token("pinned");

    assert_eq!(manager.get_token().await.unwrap(), "pinned");
    assert_eq!(manager.get_token().await.unwrap(), "pinned");
}

#[tokio::test]
async fn test_shared_manager_feeds_recognize_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(
            "shared-token",
            3600,
            now() + 3600,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let config = SdkConfig {
        iam_apikey: Some("config-key".to_string()),
        iam_url: token_url(&server),
        iam_timeout_seconds: 5,
        ..Default::default()
    };
    let shared = SharedIamTokenManager::new(config.token_manager().unwrap());

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            tokio::spawn(async move { shared.get_token().await })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), "shared-token");
    }

    let headers = config
        .recognize_request()
        .with_token_provider(&shared)
        .await
        .unwrap()
        .headers()
        .unwrap();
    assert_eq!(headers["authorization"], "Bearer shared-token");
}

#[tokio::test]
async fn test_request_timeout_is_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("late", 3600, now() + 3600))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let manager = IamTokenManager::with_timeout(
        Duration::from_millis(200),
        Some("key".to_string()),
        None,
        Some(token_url(&server)),
    )
    .unwrap();

    let err = manager.request_token().await.unwrap_err();
    assert!(matches!(err, IamError::HttpError(_)));
    assert!(!err.is_auth_service_error());
}

#[test]
fn test_request_builder_is_usable_without_tokens() {
    let url = RecognizeRequest::default().websocket_url().unwrap();
    assert_eq!(url.scheme(), "wss");
}
