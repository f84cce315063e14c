//! Request-level error taxonomy and its mapping onto HTTP responses.
//!
//! Provider error bodies are reduced to a safe `{error, error_description}`
//! shape before they reach the browser-facing caller; internal failures are
//! logged and reported without detail.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};

use crate::{management::StoreError, warning};

#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed request field.
    Validation(String),
    /// No resolvable access token, or reauthorization is required.
    AuthenticationRequired,
    /// The provider rejected a code or refresh token; the flow terminates
    /// and the user must restart the login.
    UpstreamAuth {
        error: String,
        description: Option<String>,
    },
    /// Provider-reported status passed through unchanged (playlist wrappers).
    Provider(StatusCode),
    /// Network failure or 5xx from a collaborator; safe to retry the whole
    /// user action.
    UpstreamUnavailable(String),
    /// No matching playlist or session.
    NotFound(String),
    /// Store invariant violation or other bug; logged, never exposed.
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(format!("credential store failure: {:?}", err))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ApiError::Provider(status),
            None => ApiError::UpstreamUnavailable(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, description) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::AuthenticationRequired => (
                StatusCode::UNAUTHORIZED,
                "authentication required".to_string(),
                None,
            ),
            ApiError::UpstreamAuth { error, description } => {
                (StatusCode::BAD_REQUEST, error, description)
            }
            ApiError::Provider(status) => (status, "spotify request failed".to_string(), None),
            ApiError::UpstreamUnavailable(msg) => {
                warning!("Upstream unavailable: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream service unavailable".to_string(),
                    None,
                )
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Internal(msg) => {
                warning!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                    None,
                )
            }
        };

        let mut body = Map::new();
        body.insert("error".to_string(), json!(error));
        if let Some(description) = description {
            body.insert("error_description".to_string(), json!(description));
        }

        (status, Json(Value::Object(body))).into_response()
    }
}
