use std::{collections::HashMap, sync::Arc};

use axum::{
    Extension, Json,
    extract::Query,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    error::ApiError,
    middleware::{ACCESS_TOKEN_COOKIE, SESSION_COOKIE, correlation_cookie},
    server::AppState,
    types::LoginResponse,
};

/// Starts the OAuth flow.
///
/// Returns the provider authorize URL together with the session id, and
/// binds the same session id as the correlation cookie the browser echoes
/// back on `/callback`.
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let start = state.flow.begin_login().await?;
    let jar = jar.add(correlation_cookie(SESSION_COOKIE, start.session_id.clone()));
    Ok((jar, Json(start)))
}

/// Completes the OAuth flow from the provider redirect.
///
/// A provider-reported `error` terminates the flow and is surfaced verbatim
/// in the safe error shape. On success the access token is bound as a cookie
/// and the popup is sent to `/close`; it is never embedded in a redirect URL.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(state): Extension<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    if let Some(error) = params.get("error") {
        return Err(ApiError::UpstreamAuth {
            error: error.clone(),
            description: None,
        });
    }

    let code = params
        .get("code")
        .ok_or_else(|| ApiError::Validation("authorization code not provided".to_string()))?;
    let session_id = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| ApiError::NotFound("session not found".to_string()))?;

    let access_token = state.flow.complete_callback(code, &session_id).await?;

    let jar = jar.add(correlation_cookie(ACCESS_TOKEN_COOKIE, access_token));
    Ok((jar, Redirect::to("/close")))
}

/// Page the callback redirects the login popup to; notifies the opener and
/// closes the window.
pub async fn close() -> Html<&'static str> {
    Html(
        "<html><body>\
         <script>\
         window.opener.postMessage('loginSuccess', '*');\
         window.close();\
         </script>\
         </body></html>",
    )
}

/// Forces a refresh of the cookie-bound token.
///
/// Callers without a usable cookie, or whose record has no refresh token on
/// file, are redirected back to `/login`; re-authorization is the only way
/// forward for them. Provider failures surface as errors and leave the
/// stored record untouched.
pub async fn refresh_token(
    Extension(state): Extension<Arc<AppState>>,
    jar: CookieJar,
) -> Response {
    let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_string()) else {
        return Redirect::to("/login").into_response();
    };

    match state.flow.refresh_by_access_token(&cookie).await {
        Ok(user) => {
            let jar = jar.add(correlation_cookie(ACCESS_TOKEN_COOKIE, user.access_token));
            (jar, Redirect::to("/close")).into_response()
        }
        Err(ApiError::AuthenticationRequired) => Redirect::to("/login").into_response(),
        Err(e) => e.into_response(),
    }
}
