use reqwest::Client;
use serde_json::Value;

use crate::{
    config,
    types::{TokenExchange, TokenGrant},
    utils,
};

/// Client for the three Spotify token-endpoint operations: authorization-code
/// exchange, refresh, and current-user lookup.
///
/// Every operation returns a typed [`TokenExchange`] outcome; only transport
/// failures surface as `reqwest::Error`. Endpoints are injected so tests can
/// point the client at a local mock server.
pub struct TokenExchanger {
    client: Client,
    token_url: String,
    api_url: String,
    client_id: String,
    client_secret: Option<String>,
    redirect_uri: String,
}

impl TokenExchanger {
    pub fn new(
        token_url: String,
        api_url: String,
        client_id: String,
        client_secret: Option<String>,
        redirect_uri: String,
    ) -> Self {
        Self {
            client: utils::http_client(),
            token_url,
            api_url,
            client_id,
            client_secret,
            redirect_uri,
        }
    }

    /// Builds the exchanger from the service configuration.
    pub fn from_env() -> Self {
        Self::new(
            config::spotify_token_url(),
            config::spotify_api_url(),
            config::spotify_client_id(),
            config::spotify_client_secret(),
            config::spotify_redirect_uri(),
        )
    }

    /// Exchanges an authorization code for a token pair.
    ///
    /// Exactly one of {PKCE verifier, client secret} accompanies the request:
    /// the verifier when the login flow used PKCE, the configured client
    /// secret otherwise. A missing secret on the fallback path is reported as
    /// a `Failure`, not a panic.
    pub async fn exchange_authorization_code(
        &self,
        code: &str,
        verifier: Option<&str>,
    ) -> Result<TokenExchange, reqwest::Error> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        match verifier {
            Some(verifier) => form.push(("code_verifier", verifier)),
            None => match self.client_secret.as_deref() {
                Some(secret) => form.push(("client_secret", secret)),
                None => {
                    return Ok(TokenExchange::Failure {
                        error: "invalid_client".to_string(),
                        error_description: Some(
                            "no PKCE verifier and no client secret configured".to_string(),
                        ),
                    });
                }
            },
        }

        let res = self.client.post(&self.token_url).form(&form).send().await?;
        let json: Value = res.json().await?;
        Ok(parse_token_response(json))
    }

    /// Redeems a refresh token for a fresh access token.
    ///
    /// A configured client secret authenticates the refresh the same way it
    /// authenticates the code exchange; without one the refresh stays a
    /// public-client (PKCE) request. The response may omit `refresh_token`;
    /// the grant then carries `None` and the caller keeps the previous value.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenExchange, reqwest::Error> {
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(secret) = self.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let res = self.client.post(&self.token_url).form(&form).send().await?;

        let json: Value = res.json().await?;
        Ok(parse_token_response(json))
    }

    /// Fetches the provider user id behind an access token.
    ///
    /// Non-2xx responses and responses without an `id` field both come back
    /// as `None`; the caller decides how loudly to fail.
    pub async fn fetch_user_id(&self, access_token: &str) -> Result<Option<String>, reqwest::Error> {
        let res = self
            .client
            .get(format!("{}/me", self.api_url))
            .bearer_auth(access_token)
            .send()
            .await?;

        if !res.status().is_success() {
            return Ok(None);
        }

        let json: Value = res.json().await?;
        Ok(json["id"].as_str().map(str::to_string))
    }
}

fn parse_token_response(json: Value) -> TokenExchange {
    match json["access_token"].as_str() {
        Some(access_token) => TokenExchange::Success(TokenGrant {
            access_token: access_token.to_string(),
            refresh_token: json["refresh_token"].as_str().map(str::to_string),
            scope: json["scope"].as_str().map(str::to_string),
            expires_in: json["expires_in"].as_i64().unwrap_or(3600),
        }),
        None => TokenExchange::Failure {
            error: json["error"]
                .as_str()
                .unwrap_or("invalid_response")
                .to_string(),
            error_description: json["error_description"].as_str().map(str::to_string),
        },
    }
}
