use serde_json::Value;

use crate::{
    config,
    types::{AddTracksRequest, AddTracksResponse, CreatePlaylistRequest, CreatePlaylistResponse},
    utils,
};

/// Creates a private playlist owned by the authenticated user.
pub async fn create(token: &str, name: &str) -> Result<CreatePlaylistResponse, reqwest::Error> {
    let user_id = current_user_id(token).await?;
    let api_url = format!(
        "{uri}/users/{user_id}/playlists",
        uri = config::spotify_api_url(),
    );

    let body = CreatePlaylistRequest {
        name: name.to_string(),
        description: "Created by weatherify from the current weather.".to_string(),
        public: false,
        collaborative: false,
    };

    let client = utils::http_client();
    let response = client
        .post(&api_url)
        .bearer_auth(token)
        .json(&body)
        .send()
        .await?
        .error_for_status()?;

    response.json::<CreatePlaylistResponse>().await
}

/// Adds tracks to a playlist. Callers chunk to at most 100 URIs per call,
/// the provider limit.
pub async fn add_tracks(
    token: &str,
    playlist_id: &str,
    uris: Vec<String>,
) -> Result<AddTracksResponse, reqwest::Error> {
    let api_url = format!(
        "{uri}/playlists/{playlist_id}/tracks",
        uri = config::spotify_api_url(),
    );

    let client = utils::http_client();
    let response = client
        .post(&api_url)
        .bearer_auth(token)
        .json(&AddTracksRequest { uris })
        .send()
        .await?
        .error_for_status()?;

    response.json::<AddTracksResponse>().await
}

/// Resolves the authenticated user's id for user-scoped endpoints.
async fn current_user_id(token: &str) -> Result<String, reqwest::Error> {
    let api_url = format!("{}/me", config::spotify_api_url());

    let client = utils::http_client();
    let response = client
        .get(&api_url)
        .bearer_auth(token)
        .send()
        .await?
        .error_for_status()?;

    let json = response.json::<Value>().await?;
    Ok(json["id"].as_str().unwrap_or_default().to_string())
}
