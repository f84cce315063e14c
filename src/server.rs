use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{
    Extension, Router,
    http::{HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use crate::{
    api, config, error,
    management::{AuthFlow, CredentialStore},
    middleware::resolve_token,
    spotify::auth::TokenExchanger,
};

/// Shared application state handed to every handler.
pub struct AppState {
    pub flow: AuthFlow,
}

impl AppState {
    pub fn from_env(store: Arc<CredentialStore>) -> Self {
        Self {
            flow: AuthFlow::new(store, TokenExchanger::from_env()),
        }
    }
}

/// Assembles the application router.
///
/// The playlist-facing routes sit behind the token resolution middleware;
/// the auth flow and health endpoints stay open.
pub fn build_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/search", get(api::search))
        .route("/weather", post(api::weather))
        .route("/create-playlist", post(api::create_playlist))
        .route("/add-tracks", post(api::add_tracks))
        .route_layer(from_fn(resolve_token));

    let origin = config::cors_origin()
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000"));
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
        .allow_credentials(true);

    Router::new()
        .route("/health", get(api::health))
        .route("/login", get(api::login))
        .route("/callback", get(api::callback))
        .route("/close", get(api::close))
        .route("/refresh-token", get(api::refresh_token))
        .merge(protected)
        .layer(Extension(state))
        .layer(cors)
}

pub async fn start_api_server(state: Arc<AppState>) {
    let app = build_router(state);

    let addr = match SocketAddr::from_str(&config::server_addr()) {
        Ok(addr) => addr,
        Err(e) => error!("Failed to parse server address: {}", e),
    };

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => error!("Failed to bind {}: {}", addr, e),
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server terminated: {}", e);
    }
}
