use std::{path::PathBuf, sync::Arc};

use chrono::Utc;
use rand::Rng;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, method, path},
};

use weatherify::{
    error::ApiError,
    management::{AuthFlow, CredentialStore},
    spotify::auth::TokenExchanger,
    types::TokenExchange,
};

fn temp_store_path() -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "weatherify-flow-test-{}.json",
        rand::rng().random::<u64>()
    ));
    path
}

fn exchanger_against(server: &MockServer, client_secret: Option<&str>) -> TokenExchanger {
    TokenExchanger::new(
        format!("{}/api/token", server.uri()),
        format!("{}/v1", server.uri()),
        "client-123".to_string(),
        client_secret.map(str::to_string),
        "http://localhost:8080/callback".to_string(),
    )
}

async fn flow_against(server: &MockServer) -> (AuthFlow, Arc<CredentialStore>, PathBuf) {
    let path = temp_store_path();
    let store = Arc::new(CredentialStore::open(path.clone()).await.unwrap());
    let flow = AuthFlow::new(Arc::clone(&store), exchanger_against(server, None));
    (flow, store, path)
}

fn token_body(access: &str, refresh: Option<&str>) -> serde_json::Value {
    let mut body = json!({
        "access_token": access,
        "token_type": "Bearer",
        "scope": "playlist-modify-private",
        "expires_in": 3600,
    });
    if let Some(refresh) = refresh {
        body["refresh_token"] = json!(refresh);
    }
    body
}

#[tokio::test]
async fn test_exchange_with_pkce_verifier() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code_verifier=verifier-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-1", Some("rt-1"))))
        .expect(1)
        .mount(&server)
        .await;

    let exchanger = exchanger_against(&server, None);
    let outcome = exchanger
        .exchange_authorization_code("code-1", Some("verifier-1"))
        .await
        .unwrap();

    match outcome {
        TokenExchange::Success(grant) => {
            assert_eq!(grant.access_token, "at-1");
            assert_eq!(grant.refresh_token.as_deref(), Some("rt-1"));
            assert_eq!(grant.expires_in, 3600);
        }
        TokenExchange::Failure { error, .. } => panic!("unexpected failure: {}", error),
    }
}

#[tokio::test]
async fn test_exchange_falls_back_to_client_secret() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("client_secret=sekrit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-1", Some("rt-1"))))
        .expect(1)
        .mount(&server)
        .await;

    let exchanger = exchanger_against(&server, Some("sekrit"));
    let outcome = exchanger
        .exchange_authorization_code("code-1", None)
        .await
        .unwrap();

    assert!(matches!(outcome, TokenExchange::Success(_)));
}

#[tokio::test]
async fn test_exchange_with_neither_verifier_nor_secret_fails_without_calling_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let exchanger = exchanger_against(&server, None);
    let outcome = exchanger
        .exchange_authorization_code("code-1", None)
        .await
        .unwrap();

    match outcome {
        TokenExchange::Failure { error, .. } => assert_eq!(error, "invalid_client"),
        TokenExchange::Success(_) => panic!("exchange should not succeed"),
    }
}

#[tokio::test]
async fn test_exchange_surfaces_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Authorization code expired",
        })))
        .mount(&server)
        .await;

    let exchanger = exchanger_against(&server, None);
    let outcome = exchanger
        .exchange_authorization_code("code-1", Some("verifier-1"))
        .await
        .unwrap();

    match outcome {
        TokenExchange::Failure {
            error,
            error_description,
        } => {
            assert_eq!(error, "invalid_grant");
            assert_eq!(error_description.as_deref(), Some("Authorization code expired"));
        }
        TokenExchange::Success(_) => panic!("exchange should fail"),
    }
}

#[tokio::test]
async fn test_refresh_response_may_omit_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-2", None)))
        .mount(&server)
        .await;

    let exchanger = exchanger_against(&server, None);
    let outcome = exchanger.refresh("rt-1").await.unwrap();

    match outcome {
        TokenExchange::Success(grant) => {
            assert_eq!(grant.access_token, "at-2");
            assert!(grant.refresh_token.is_none());
        }
        TokenExchange::Failure { error, .. } => panic!("unexpected failure: {}", error),
    }
}

#[tokio::test]
async fn test_refresh_sends_client_secret_in_fallback_mode() {
    let server = MockServer::start().await;
    // The provider rejects unauthenticated refreshes from secret-based
    // clients, so the secret must accompany the refresh form too.
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("client_secret=sekrit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-2", None)))
        .expect(1)
        .mount(&server)
        .await;

    let exchanger = exchanger_against(&server, Some("sekrit"));
    let outcome = exchanger.refresh("rt-1").await.unwrap();

    match outcome {
        TokenExchange::Success(grant) => assert_eq!(grant.access_token, "at-2"),
        TokenExchange::Failure { error, .. } => panic!("unexpected failure: {}", error),
    }
}

#[tokio::test]
async fn test_fetch_user_id_handles_missing_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"display_name": "x"})))
        .mount(&server)
        .await;

    let exchanger = exchanger_against(&server, None);
    assert!(exchanger.fetch_user_id("at-1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_fetch_user_id_handles_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let exchanger = exchanger_against(&server, None);
    assert!(exchanger.fetch_user_id("at-1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_callback_with_unknown_session_never_touches_token_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (flow, _store, path) = flow_against(&server).await;
    let result = flow.complete_callback("code-1", "no-such-session").await;

    assert!(matches!(result, Err(ApiError::NotFound(_))));

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_callback_persists_user_and_consumes_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-1", Some("rt-1"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "spotify-user-1"})))
        .mount(&server)
        .await;

    let (flow, store, path) = flow_against(&server).await;
    store
        .put_pending("sess-1", Some("verifier-1".to_string()), 3600)
        .await
        .unwrap();

    let access_token = flow.complete_callback("code-1", "sess-1").await.unwrap();
    assert_eq!(access_token, "at-1");

    let user = store
        .find_user_by_user_id("spotify-user-1")
        .await
        .expect("user persisted");
    assert_eq!(user.access_token, "at-1");
    assert_eq!(user.refresh_token.as_deref(), Some("rt-1"));
    assert!(user.expires_at > Utc::now().timestamp());

    // The pending authorization is consumed.
    assert!(store.get_pending("sess-1").await.is_none());

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_refresh_without_refresh_token_requires_reauthorization() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (flow, store, path) = flow_against(&server).await;
    let later = Utc::now().timestamp() + 3600;
    store
        .upsert_user_token("user-1", "at-1", None, later)
        .await
        .unwrap();

    let result = flow.refresh_by_user_id("user-1").await;
    assert!(matches!(result, Err(ApiError::AuthenticationRequired)));

    // The stored record is untouched.
    let user = store.find_user_by_user_id("user-1").await.unwrap();
    assert_eq!(user.access_token, "at-1");
    assert_eq!(user.expires_at, later);

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_refresh_failure_leaves_stored_record_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
        })))
        .mount(&server)
        .await;

    let (flow, store, path) = flow_against(&server).await;
    let later = Utc::now().timestamp() + 3600;
    store
        .upsert_user_token("user-1", "at-1", Some("rt-1".to_string()), later)
        .await
        .unwrap();

    let result = flow.refresh_by_user_id("user-1").await;
    assert!(matches!(result, Err(ApiError::UpstreamAuth { .. })));

    let user = store.find_user_by_user_id("user-1").await.unwrap();
    assert_eq!(user.access_token, "at-1");
    assert_eq!(user.refresh_token.as_deref(), Some("rt-1"));

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_second_refresh_keeps_previously_rotated_refresh_token() {
    let server = MockServer::start().await;
    // First refresh rotates the refresh token, the second omits it.
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-2", Some("rt-rotated"))))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-3", None)))
        .mount(&server)
        .await;

    let (flow, store, path) = flow_against(&server).await;
    store
        .upsert_user_token(
            "user-1",
            "at-1",
            Some("rt-initial".to_string()),
            Utc::now().timestamp() + 3600,
        )
        .await
        .unwrap();

    flow.refresh_by_user_id("user-1").await.unwrap();
    flow.refresh_by_user_id("user-1").await.unwrap();

    let user = store.find_user_by_user_id("user-1").await.unwrap();
    assert_eq!(user.access_token, "at-3");
    assert_eq!(user.refresh_token.as_deref(), Some("rt-rotated"));

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_resolve_prefers_header_token() {
    let server = MockServer::start().await;
    let (flow, _store, path) = flow_against(&server).await;

    let resolved = flow
        .resolve_access_token(Some("header-token"), Some("cookie-token"))
        .await
        .unwrap();

    assert_eq!(resolved.access_token, "header-token");
    assert!(resolved.user_id.is_none());

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_resolve_refreshes_stale_cookie_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("fresh-token", None)))
        .expect(1)
        .mount(&server)
        .await;

    let (flow, store, path) = flow_against(&server).await;
    store
        .upsert_user_token(
            "user-1",
            "stale-token",
            Some("rt-1".to_string()),
            Utc::now().timestamp() - 100,
        )
        .await
        .unwrap();

    let resolved = flow
        .resolve_access_token(None, Some("stale-token"))
        .await
        .unwrap();

    // The handler downstream observes a fresh token, never the stale one.
    assert_eq!(resolved.access_token, "fresh-token");
    assert_eq!(resolved.user_id.as_deref(), Some("user-1"));

    let user = store.find_user_by_user_id("user-1").await.unwrap();
    assert_eq!(user.access_token, "fresh-token");
    assert_eq!(user.refresh_token.as_deref(), Some("rt-1"));
    assert!(
        store
            .find_user_by_access_token("stale-token")
            .await
            .unwrap()
            .is_none()
    );

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_resolve_fresh_cookie_token_passes_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (flow, store, path) = flow_against(&server).await;
    store
        .upsert_user_token(
            "user-1",
            "live-token",
            Some("rt-1".to_string()),
            Utc::now().timestamp() + 3600,
        )
        .await
        .unwrap();

    let resolved = flow
        .resolve_access_token(None, Some("live-token"))
        .await
        .unwrap();

    assert_eq!(resolved.access_token, "live-token");
    assert_eq!(resolved.user_id.as_deref(), Some("user-1"));

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_resolve_without_credentials_is_rejected() {
    let server = MockServer::start().await;
    let (flow, _store, path) = flow_against(&server).await;

    let result = flow.resolve_access_token(None, None).await;
    assert!(matches!(result, Err(ApiError::AuthenticationRequired)));

    let unknown = flow.resolve_access_token(None, Some("unknown")).await;
    assert!(matches!(unknown, Err(ApiError::AuthenticationRequired)));

    let _ = std::fs::remove_file(&path);
}
