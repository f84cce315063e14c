use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use axum::{Extension, Router, middleware::from_fn, routing::get};
use chrono::Utc;
use rand::Rng;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, method, path},
};

use weatherify::{
    management::{AuthFlow, CredentialStore},
    middleware::resolve_token,
    server::AppState,
    spotify::auth::TokenExchanger,
    types::ResolvedToken,
};

fn temp_store_path() -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "weatherify-middleware-test-{}.json",
        rand::rng().random::<u64>()
    ));
    path
}

async fn token_echo(Extension(token): Extension<ResolvedToken>) -> String {
    token.access_token
}

/// Serves a single protected route that echoes the resolved access token.
async fn serve_protected(state: Arc<AppState>) -> SocketAddr {
    let app = Router::new()
        .route("/token-echo", get(token_echo))
        .route_layer(from_fn(resolve_token))
        .layer(Extension(state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

fn set_cookies(res: &reqwest::Response) -> Vec<String> {
    res.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_stale_cookie_refresh_rebinds_rotated_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh-token",
            "token_type": "Bearer",
            "expires_in": 3600,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store_path = temp_store_path();
    let store = Arc::new(CredentialStore::open(store_path.clone()).await.unwrap());
    store
        .upsert_user_token(
            "user-1",
            "stale-token",
            Some("rt-1".to_string()),
            Utc::now().timestamp() - 100,
        )
        .await
        .unwrap();

    let exchanger = TokenExchanger::new(
        format!("{}/api/token", server.uri()),
        format!("{}/v1", server.uri()),
        "client-123".to_string(),
        None,
        "http://localhost:8080/callback".to_string(),
    );
    let state = Arc::new(AppState {
        flow: AuthFlow::new(store, exchanger),
    });
    let addr = serve_protected(state).await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("http://{}/token-echo", addr))
        .header("Cookie", "accessToken=stale-token")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), reqwest::StatusCode::OK);

    // The rotated token goes back to the browser as a cookie.
    let cookies = set_cookies(&res);
    assert!(
        cookies.iter().any(|c| c.contains("accessToken=fresh-token")),
        "rotated token not re-bound: {:?}",
        cookies
    );
    assert_eq!(res.text().await.unwrap(), "fresh-token");

    // The next cookie-only request with the rotated token still resolves.
    let res = client
        .get(format!("http://{}/token-echo", addr))
        .header("Cookie", "accessToken=fresh-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "fresh-token");

    let _ = std::fs::remove_file(&store_path);
}

#[tokio::test]
async fn test_fresh_cookie_and_bearer_requests_set_no_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store_path = temp_store_path();
    let store = Arc::new(CredentialStore::open(store_path.clone()).await.unwrap());
    store
        .upsert_user_token(
            "user-1",
            "live-token",
            Some("rt-1".to_string()),
            Utc::now().timestamp() + 3600,
        )
        .await
        .unwrap();

    let exchanger = TokenExchanger::new(
        format!("{}/api/token", server.uri()),
        format!("{}/v1", server.uri()),
        "client-123".to_string(),
        None,
        "http://localhost:8080/callback".to_string(),
    );
    let state = Arc::new(AppState {
        flow: AuthFlow::new(store, exchanger),
    });
    let addr = serve_protected(state).await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("http://{}/token-echo", addr))
        .header("Cookie", "accessToken=live-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    assert!(set_cookies(&res).is_empty());

    let res = client
        .get(format!("http://{}/token-echo", addr))
        .bearer_auth("header-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    assert!(set_cookies(&res).is_empty());
    assert_eq!(res.text().await.unwrap(), "header-token");

    let _ = std::fs::remove_file(&store_path);
}

#[tokio::test]
async fn test_request_without_credentials_is_unauthorized() {
    let server = MockServer::start().await;

    let store_path = temp_store_path();
    let store = Arc::new(CredentialStore::open(store_path.clone()).await.unwrap());
    let exchanger = TokenExchanger::new(
        format!("{}/api/token", server.uri()),
        format!("{}/v1", server.uri()),
        "client-123".to_string(),
        None,
        "http://localhost:8080/callback".to_string(),
    );
    let state = Arc::new(AppState {
        flow: AuthFlow::new(store, exchanger),
    });
    let addr = serve_protected(state).await;

    let res = reqwest::Client::new()
        .get(format!("http://{}/token-echo", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::UNAUTHORIZED);

    let _ = std::fs::remove_file(&store_path);
}
