//! Configuration management for the weather playlist service.
//!
//! All configuration comes from environment variables, optionally loaded from
//! a `.env` file in the working directory. Required variables terminate the
//! process with a clear message when absent; variables with sensible defaults
//! (API base URLs, cookie hardening, CORS origin) fall back silently.

use std::{env, path::PathBuf};

use dotenv;

/// Loads environment variables from a `.env` file in the working directory.
///
/// Missing files are ignored so that deployments which inject configuration
/// through the process environment keep working without a `.env` on disk.
pub fn load_env() {
    dotenv::dotenv().ok();
}

/// Returns the address and port the HTTP server binds to.
///
/// # Panics
///
/// Panics if the `SERVER_ADDRESS` environment variable is not set.
pub fn server_addr() -> String {
    env::var("SERVER_ADDRESS").expect("SERVER_ADDRESS must be set")
}

/// Returns the Spotify API client ID for authentication.
///
/// # Panics
///
/// Panics if the `SPOTIFY_CLIENT_ID` environment variable is not set.
pub fn spotify_client_id() -> String {
    env::var("SPOTIFY_CLIENT_ID").expect("SPOTIFY_CLIENT_ID must be set")
}

/// Returns the Spotify API client secret, when one is configured.
///
/// The secret is only required for the non-PKCE fallback exchange; PKCE
/// deployments can omit it entirely.
pub fn spotify_client_secret() -> Option<String> {
    env::var("SPOTIFY_CLIENT_SECRET").ok()
}

/// Returns the OAuth redirect URI registered with Spotify.
///
/// # Panics
///
/// Panics if the `SPOTIFY_REDIRECT_URI` environment variable is not set.
pub fn spotify_redirect_uri() -> String {
    env::var("SPOTIFY_REDIRECT_URI").expect("SPOTIFY_REDIRECT_URI must be set")
}

/// Returns the scope string requested during authorization.
///
/// # Panics
///
/// Panics if the `SPOTIFY_SCOPES` environment variable is not set.
pub fn spotify_scope() -> String {
    env::var("SPOTIFY_SCOPES").expect("SPOTIFY_SCOPES must be set")
}

/// Returns the Spotify OAuth authorization endpoint.
pub fn spotify_auth_url() -> String {
    env::var("SPOTIFY_AUTH_URL")
        .unwrap_or_else(|_| "https://accounts.spotify.com/authorize".to_string())
}

/// Returns the Spotify OAuth token exchange endpoint.
pub fn spotify_token_url() -> String {
    env::var("SPOTIFY_TOKEN_URL")
        .unwrap_or_else(|_| "https://accounts.spotify.com/api/token".to_string())
}

/// Returns the Spotify Web API base URL.
pub fn spotify_api_url() -> String {
    env::var("SPOTIFY_API_URL").unwrap_or_else(|_| "https://api.spotify.com/v1".to_string())
}

/// Whether logins use the PKCE exchange (default) or fall back to the
/// client-secret exchange.
///
/// PKCE is primary; set `SPOTIFY_USE_PKCE=false` only for environments that
/// cannot run it, in which case `SPOTIFY_CLIENT_SECRET` must be configured.
pub fn use_pkce() -> bool {
    env::var("SPOTIFY_USE_PKCE")
        .map(|v| v != "false" && v != "0")
        .unwrap_or(true)
}

/// Returns the LocationIQ geocoding API key.
///
/// # Panics
///
/// Panics if the `LOCATIONIQ_API_KEY` environment variable is not set.
pub fn locationiq_api_key() -> String {
    env::var("LOCATIONIQ_API_KEY").expect("LOCATIONIQ_API_KEY must be set")
}

/// Returns the LocationIQ search endpoint.
pub fn locationiq_url() -> String {
    env::var("LOCATIONIQ_URL")
        .unwrap_or_else(|_| "https://us1.locationiq.com/v1/search.php".to_string())
}

/// Returns the OpenWeather API key.
///
/// # Panics
///
/// Panics if the `OPENWEATHER_API_KEY` environment variable is not set.
pub fn openweather_api_key() -> String {
    env::var("OPENWEATHER_API_KEY").expect("OPENWEATHER_API_KEY must be set")
}

/// Returns the OpenWeather current-conditions endpoint.
pub fn openweather_url() -> String {
    env::var("OPENWEATHER_URL")
        .unwrap_or_else(|_| "https://api.openweathermap.org/data/2.5/weather".to_string())
}

/// Returns the browser origin allowed to call the API with credentials.
pub fn cors_origin() -> String {
    env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Whether cookies are issued with `Secure` and `HttpOnly`.
///
/// Production deployments must set `SECURE_COOKIES=true`; the default stays
/// off so that local HTTP development keeps working.
pub fn secure_cookies() -> bool {
    env::var("SECURE_COOKIES")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

/// Returns the path of the credential store document.
///
/// Defaults to `weatherify/credentials.json` under the platform-specific
/// local data directory.
pub fn store_path() -> PathBuf {
    match env::var("CREDENTIAL_STORE_PATH") {
        Ok(p) => PathBuf::from(p),
        Err(_) => {
            let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
            path.push("weatherify/credentials.json");
            path
        }
    }
}
