use std::{sync::OnceLock, time::Duration};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use reqwest::Client;
use sha2::{Digest, Sha256};

use crate::types::TrackQualities;

/// Bound on every outbound provider call, so a hung upstream cannot hang the
/// handling request indefinitely.
const HTTP_TIMEOUT: Duration = Duration::from_secs(8);

static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

/// Returns the shared HTTP client with the service-wide request timeout.
///
/// # Panics
///
/// Panics on the first call if the client cannot be built (TLS backend
/// initialization); a client without the timeout is not an acceptable
/// substitute.
pub fn http_client() -> Client {
    HTTP_CLIENT
        .get_or_init(|| {
            Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .expect("failed to initialize the HTTP client")
        })
        .clone()
}

/// Generates a PKCE code verifier: base64url of 32 securely random bytes,
/// padding stripped.
pub fn generate_code_verifier() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Derives the S256 code challenge for a verifier:
/// `base64url(SHA-256(verifier))` with padding stripped.
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generates an opaque correlation token for the login/callback pair.
///
/// Same entropy and encoding as the code verifier, but the two values are
/// never interchangeable: the session id travels to the browser, the
/// verifier never does.
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Builds the provider authorize URL for an authorization-code login.
///
/// `challenge` carries the PKCE code challenge; when it is `None` the URL is
/// built for the plain client-secret exchange instead and no
/// `code_challenge_method` is advertised.
pub fn build_authorize_url(
    base: &str,
    client_id: &str,
    redirect_uri: &str,
    scope: &str,
    challenge: Option<&str>,
) -> Result<String, String> {
    let mut params = vec![
        ("client_id", client_id),
        ("response_type", "code"),
        ("redirect_uri", redirect_uri),
        ("scope", scope),
        ("show_dialog", "true"),
    ];
    if let Some(challenge) = challenge {
        params.push(("code_challenge_method", "S256"));
        params.push(("code_challenge", challenge));
    }

    reqwest::Url::parse_with_params(base, &params)
        .map(|url| url.to_string())
        .map_err(|e| format!("invalid authorize URL {}: {}", base, e))
}

/// Selects track URIs whose audio features fit the current weather.
///
/// Thresholds, in order of precedence:
/// - above 30 °C: energetic and happy (`energy > 0.7 && valence > 0.7`)
/// - below 10 °C: calm and melancholic (`energy < 0.3 && valence < 0.3`)
/// - rain or snow: acoustic (`acousticness > 0.5`)
/// - clear skies: danceable (`danceability > 0.7`)
/// - anything else: middle of the road (`0.3..=0.7` energy and valence)
///
/// When fewer than 10 tracks match, the first 10 input tracks are used
/// instead so the resulting playlist is never almost empty.
pub fn filter_tracks_by_weather(
    tracks: &[TrackQualities],
    weather_condition: &str,
    temperature: f64,
) -> Vec<String> {
    let filtered: Vec<&TrackQualities> = if temperature > 30.0 {
        tracks
            .iter()
            .filter(|t| t.energy > 0.7 && t.valence > 0.7)
            .collect()
    } else if temperature < 10.0 {
        tracks
            .iter()
            .filter(|t| t.energy < 0.3 && t.valence < 0.3)
            .collect()
    } else if weather_condition == "Rain" || weather_condition == "Snow" {
        tracks.iter().filter(|t| t.acousticness > 0.5).collect()
    } else if weather_condition == "Clear" {
        tracks.iter().filter(|t| t.danceability > 0.7).collect()
    } else {
        tracks
            .iter()
            .filter(|t| (0.3..=0.7).contains(&t.energy) && (0.3..=0.7).contains(&t.valence))
            .collect()
    };

    let picked: Vec<&TrackQualities> = if filtered.len() >= 10 {
        filtered
    } else {
        tracks.iter().take(10).collect()
    };

    picked.iter().map(|t| t.uri.clone()).collect()
}

/// Upper-cases the first letter of every word, for playlist names built from
/// weather descriptions ("scattered clouds" -> "Scattered Clouds").
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
