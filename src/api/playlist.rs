use std::collections::HashMap;

use axum::{Extension, Json, extract::Query};
use serde_json::{Value, json};

use crate::{
    error::ApiError,
    spotify,
    types::{AddTracksBody, AddTracksReply, CreatePlaylistBody, CreatePlaylistReply, ResolvedToken},
};

/// Looks up the Top-50 playlist for a country.
pub async fn search(
    Query(params): Query<HashMap<String, String>>,
    Extension(token): Extension<ResolvedToken>,
) -> Result<Json<Value>, ApiError> {
    let country = params
        .get("country")
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("country parameter is missing".to_string()))?;

    let playlist = spotify::search::search_top_playlist(&token.access_token, country)
        .await?
        .ok_or_else(|| ApiError::NotFound("no playlist found".to_string()))?;

    Ok(Json(json!({ "playlist_id": playlist.id })))
}

/// Creates an empty playlist owned by the authenticated user.
///
/// Provider failures pass their status code through unchanged; this wrapper
/// does not retry.
pub async fn create_playlist(
    Extension(token): Extension<ResolvedToken>,
    Json(body): Json<CreatePlaylistBody>,
) -> Result<Json<CreatePlaylistReply>, ApiError> {
    let name = body
        .playlist_name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("playlist_name is missing".to_string()))?;

    let created = spotify::playlist::create(&token.access_token, &name).await?;

    Ok(Json(CreatePlaylistReply {
        playlist_id: created.id,
        playlist_name: created.name,
    }))
}

/// Adds tracks to an existing playlist, chunked to the provider limit.
pub async fn add_tracks(
    Extension(token): Extension<ResolvedToken>,
    Json(body): Json<AddTracksBody>,
) -> Result<Json<AddTracksReply>, ApiError> {
    let playlist_id = body
        .playlist_id
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("playlist_id is missing".to_string()))?;
    let track_uris = body
        .track_uris
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Validation("track_uris is missing".to_string()))?;

    for chunk in track_uris.chunks(100) {
        spotify::playlist::add_tracks(&token.access_token, &playlist_id, chunk.to_vec()).await?;
    }

    Ok(Json(AddTracksReply {
        success: true,
        playlist_id,
    }))
}
