use std::sync::Arc;

use chrono::Utc;

use crate::{
    config,
    error::ApiError,
    management::CredentialStore,
    spotify::auth::TokenExchanger,
    types::{LoginResponse, ResolvedToken, TokenExchange, UserToken},
    utils,
};

/// TTL for a pending authorization; a callback arriving later than this
/// cannot be completed because the verifier is gone.
const PENDING_TTL_SECS: i64 = 3600;

/// Orchestrates the OAuth authorization attempts: login initiation, callback
/// completion, and refresh. All state lives in the [`CredentialStore`]; the
/// controller itself is stateless per request.
pub struct AuthFlow {
    store: Arc<CredentialStore>,
    exchanger: TokenExchanger,
}

impl AuthFlow {
    pub fn new(store: Arc<CredentialStore>, exchanger: TokenExchanger) -> Self {
        Self { store, exchanger }
    }

    /// Starts a new authorization attempt.
    ///
    /// Generates a fresh session id and, when PKCE is enabled, a
    /// verifier/challenge pair; persists the pending record; and returns the
    /// provider authorize URL together with the session id the browser must
    /// echo back on the callback.
    pub async fn begin_login(&self) -> Result<LoginResponse, ApiError> {
        let session_id = utils::generate_session_id();

        let (verifier, challenge) = if config::use_pkce() {
            let verifier = utils::generate_code_verifier();
            let challenge = utils::generate_code_challenge(&verifier);
            (Some(verifier), Some(challenge))
        } else {
            (None, None)
        };

        let auth_url = utils::build_authorize_url(
            &config::spotify_auth_url(),
            &config::spotify_client_id(),
            &config::spotify_redirect_uri(),
            &config::spotify_scope(),
            challenge.as_deref(),
        )
        .map_err(ApiError::Internal)?;

        self.store
            .put_pending(&session_id, verifier, PENDING_TTL_SECS)
            .await?;

        Ok(LoginResponse {
            auth_url,
            session_id,
        })
    }

    /// Completes an authorization attempt from the provider callback.
    ///
    /// Redeems the code with the verifier correlated via `session_id`,
    /// resolves the provider user id, persists the token record and returns
    /// the access token for the caller to bind as a cookie. An absent or
    /// expired pending record is a hard failure; the verifier cannot be
    /// reconstructed.
    pub async fn complete_callback(
        &self,
        code: &str,
        session_id: &str,
    ) -> Result<String, ApiError> {
        let pending = self
            .store
            .get_pending(session_id)
            .await
            .ok_or_else(|| ApiError::NotFound("session not found".to_string()))?;

        let outcome = self
            .exchanger
            .exchange_authorization_code(code, pending.code_verifier.as_deref())
            .await
            .map_err(|e| ApiError::UpstreamUnavailable(e.to_string()))?;

        let grant = match outcome {
            TokenExchange::Success(grant) => grant,
            TokenExchange::Failure {
                error,
                error_description,
            } => {
                return Err(ApiError::UpstreamAuth {
                    error,
                    description: error_description,
                });
            }
        };

        let user_id = self
            .exchanger
            .fetch_user_id(&grant.access_token)
            .await
            .map_err(|e| ApiError::UpstreamUnavailable(e.to_string()))?
            .ok_or_else(|| ApiError::UpstreamAuth {
                error: "user_resolution_failed".to_string(),
                description: Some("failed to retrieve user id".to_string()),
            })?;

        let expires_at = Utc::now().timestamp() + grant.expires_in;
        self.store
            .upsert_user_token(
                &user_id,
                &grant.access_token,
                grant.refresh_token.clone(),
                expires_at,
            )
            .await?;

        // Consumed; callbacks cannot be replayed against this session.
        self.store.delete_pending(session_id).await?;

        Ok(grant.access_token)
    }

    /// Refreshes the token pair for an existing record.
    ///
    /// Without a refresh token on file the only way forward is a new login.
    /// A provider failure propagates without touching the stored record; a
    /// transient refresh failure must not invalidate a still-possibly-valid
    /// token.
    pub async fn refresh_for(&self, user: &UserToken) -> Result<UserToken, ApiError> {
        let refresh_token = user
            .refresh_token
            .as_deref()
            .ok_or(ApiError::AuthenticationRequired)?;

        let outcome = self
            .exchanger
            .refresh(refresh_token)
            .await
            .map_err(|e| ApiError::UpstreamUnavailable(e.to_string()))?;

        let grant = match outcome {
            TokenExchange::Success(grant) => grant,
            TokenExchange::Failure {
                error,
                error_description,
            } => {
                return Err(ApiError::UpstreamAuth {
                    error,
                    description: error_description,
                });
            }
        };

        let expires_at = Utc::now().timestamp() + grant.expires_in;
        self.store
            .upsert_user_token(
                &user.user_id,
                &grant.access_token,
                grant.refresh_token.clone(),
                expires_at,
            )
            .await?;

        self.store
            .find_user_by_user_id(&user.user_id)
            .await
            .ok_or_else(|| ApiError::Internal("refreshed token record disappeared".to_string()))
    }

    /// Refreshes the record that currently holds `access_token`.
    pub async fn refresh_by_access_token(&self, access_token: &str) -> Result<UserToken, ApiError> {
        let user = self
            .store
            .find_user_by_access_token(access_token)
            .await?
            .ok_or(ApiError::AuthenticationRequired)?;
        self.refresh_for(&user).await
    }

    /// Refreshes the record for `user_id`.
    pub async fn refresh_by_user_id(&self, user_id: &str) -> Result<UserToken, ApiError> {
        let user = self
            .store
            .find_user_by_user_id(user_id)
            .await
            .ok_or(ApiError::AuthenticationRequired)?;
        self.refresh_for(&user).await
    }

    /// Resolves the access token for an inbound request.
    ///
    /// Precedence is strict: a header-supplied bearer token wins and is
    /// trusted as-is (the caller asserts responsibility for freshness); a
    /// cookie-bound token is looked up in the store and refreshed first when
    /// stale, so a known-expired token is never handed downstream. With
    /// neither, the caller must be sent back to login.
    pub async fn resolve_access_token(
        &self,
        bearer: Option<&str>,
        cookie_token: Option<&str>,
    ) -> Result<ResolvedToken, ApiError> {
        if let Some(token) = bearer {
            return Ok(ResolvedToken {
                access_token: token.to_string(),
                user_id: None,
            });
        }

        let token = cookie_token.ok_or(ApiError::AuthenticationRequired)?;
        let user = self
            .store
            .find_user_by_access_token(token)
            .await?
            .ok_or(ApiError::AuthenticationRequired)?;

        if user.is_expired(Utc::now().timestamp()) {
            let refreshed = self.refresh_for(&user).await?;
            return Ok(ResolvedToken {
                access_token: refreshed.access_token,
                user_id: Some(refreshed.user_id),
            });
        }

        Ok(ResolvedToken {
            access_token: user.access_token,
            user_id: Some(user.user_id),
        })
    }
}
