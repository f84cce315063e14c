//! Token resolution for protected routes, plus the cookie conventions shared
//! by the auth handlers.

use std::sync::Arc;

use axum::{
    Extension,
    extract::Request,
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{config, error::ApiError, server::AppState};

/// Correlation cookie linking the login response to the provider callback.
pub const SESSION_COOKIE: &str = "session_id";

/// Cookie carrying the client-visible access token after a completed login.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Builds a session-scoped (non-persistent) cookie with `SameSite=Lax`.
///
/// `Secure`/`HttpOnly` follow the deployment configuration; production
/// deployments must enable both.
pub fn correlation_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(config::secure_cookies())
        .http_only(config::secure_cookies())
        .build()
}

/// Resolves the caller's access token before a protected handler runs.
///
/// Precedence: explicit `Authorization: Bearer` header first, then the
/// access-token cookie backed by the credential store (refreshed when
/// stale). Requests with neither are rejected with 401 rather than handed
/// downstream with an empty credential. The resolved token is installed as a
/// request extension, and a token rotated by a stale-cookie refresh is
/// re-bound on the response so the browser's next cookie-only request still
/// resolves.
pub async fn resolve_token(
    Extension(state): Extension<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);
    let cookie_token = jar
        .get(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_string());

    let resolved = state
        .flow
        .resolve_access_token(bearer.as_deref(), cookie_token.as_deref())
        .await?;

    let rotated = bearer.is_none()
        && cookie_token.as_deref() != Some(resolved.access_token.as_str());
    let access_token = resolved.access_token.clone();

    req.extensions_mut().insert(resolved);
    let response = next.run(req).await;

    if rotated {
        let jar = jar.add(correlation_cookie(ACCESS_TOKEN_COOKIE, access_token));
        return Ok((jar, response).into_response());
    }
    Ok(response)
}
