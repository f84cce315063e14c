use std::sync::Arc;

use axum::{Extension, Json};
use reqwest::StatusCode;

use crate::{
    error::ApiError,
    server::AppState,
    spotify,
    types::{ResolvedToken, WeatherRequest, WeatherResponse},
    utils, weather,
};

/// The weather-to-playlist pipeline.
///
/// Geocodes the city, reads the current conditions, fetches the Top-50
/// playlist of the city's country, scores its tracks' audio features against
/// the weather, and materializes the selection as a new playlist named after
/// the city and the weather description.
pub async fn weather(
    Extension(state): Extension<Arc<AppState>>,
    Extension(token): Extension<ResolvedToken>,
    Json(body): Json<WeatherRequest>,
) -> Result<Json<WeatherResponse>, ApiError> {
    let city = body
        .city
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("invalid or missing city parameter".to_string()))?;

    let places = weather::geocode(&city)
        .await
        .map_err(|e| ApiError::UpstreamUnavailable(e.to_string()))?;
    let place = places
        .first()
        .ok_or_else(|| ApiError::NotFound(format!("no location found for {}", city)))?;

    let current = weather::current(&place.lat, &place.lon)
        .await
        .map_err(|e| ApiError::UpstreamUnavailable(e.to_string()))?;
    let condition = current
        .weather
        .first()
        .ok_or_else(|| ApiError::UpstreamUnavailable("weather response had no conditions".to_string()))?;
    let temperature = current.main.temp;

    // Country is the last segment of the geocoder's display name.
    let country = place
        .display_name
        .rsplit(',')
        .next()
        .unwrap_or(&city)
        .trim()
        .to_string();

    let playlist = spotify::search::search_top_playlist(&token.access_token, &country)
        .await?
        .ok_or_else(|| ApiError::NotFound("no playlist found".to_string()))?;
    let tracks = spotify::search::playlist_tracks(&token.access_token, &playlist.id).await?;
    let track_ids: Vec<String> = tracks.iter().map(|t| t.id.clone()).collect();
    let qualities = spotify::search::audio_features(&token.access_token, &track_ids).await?;

    let track_uris = utils::filter_tracks_by_weather(&qualities, &condition.main, temperature);
    let playlist_name = format!("{} {}", city, utils::title_case(&condition.description));

    let playlist_id = create_and_populate(&state, &token, &playlist_name, &track_uris).await?;

    Ok(Json(WeatherResponse {
        temperature,
        playlist: playlist_id,
    }))
}

/// Creates the playlist and fills it, refreshing the caller's token and
/// retrying exactly once if the provider rejects it as unauthorized.
///
/// The retry is only possible for store-backed tokens; a header-supplied
/// bearer token carries no user context to refresh with.
async fn create_and_populate(
    state: &AppState,
    token: &ResolvedToken,
    playlist_name: &str,
    track_uris: &[String],
) -> Result<String, ApiError> {
    match try_create_and_populate(&token.access_token, playlist_name, track_uris).await {
        Ok(playlist_id) => Ok(playlist_id),
        Err(e) if is_unauthorized(&e) => {
            let Some(user_id) = token.user_id.as_deref() else {
                return Err(ApiError::AuthenticationRequired);
            };
            let refreshed = state.flow.refresh_by_user_id(user_id).await?;
            try_create_and_populate(&refreshed.access_token, playlist_name, track_uris)
                .await
                .map_err(ApiError::from)
        }
        Err(e) => Err(e.into()),
    }
}

async fn try_create_and_populate(
    token: &str,
    playlist_name: &str,
    track_uris: &[String],
) -> Result<String, reqwest::Error> {
    let created = spotify::playlist::create(token, playlist_name).await?;
    for chunk in track_uris.chunks(100) {
        spotify::playlist::add_tracks(token, &created.id, chunk.to_vec()).await?;
    }
    Ok(created.id)
}

fn is_unauthorized(err: &reqwest::Error) -> bool {
    err.status() == Some(StatusCode::UNAUTHORIZED)
}
