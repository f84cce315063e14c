use crate::{
    config,
    types::{
        AudioFeaturesResponse, PlaylistRef, PlaylistTracksResponse, SearchPlaylistsResponse,
        TrackQualities, TrackRef,
    },
    utils,
};

/// Finds the "Top 50" playlist for a country via the search endpoint.
///
/// Returns `Ok(None)` when the search succeeds but yields no playlist; the
/// caller maps that to a 404.
pub async fn search_top_playlist(
    token: &str,
    country: &str,
) -> Result<Option<PlaylistRef>, reqwest::Error> {
    let api_url = format!("{}/search", config::spotify_api_url());
    let query = format!("top 50 {}", country);

    let client = utils::http_client();
    let response = client
        .get(&api_url)
        .bearer_auth(token)
        .query(&[("q", query.as_str()), ("type", "playlist"), ("limit", "1")])
        .send()
        .await?
        .error_for_status()?;

    let res = response.json::<SearchPlaylistsResponse>().await?;
    Ok(res.playlists.items.into_iter().flatten().next())
}

/// Fetches the first page of tracks of a playlist (50 tracks covers the
/// Top-50 lists this service works on).
pub async fn playlist_tracks(
    token: &str,
    playlist_id: &str,
) -> Result<Vec<TrackRef>, reqwest::Error> {
    let api_url = format!(
        "{uri}/playlists/{playlist_id}/tracks",
        uri = config::spotify_api_url(),
    );

    let client = utils::http_client();
    let response = client
        .get(&api_url)
        .bearer_auth(token)
        .query(&[
            ("limit", "50"),
            ("fields", "items(track(id,name,uri))"),
        ])
        .send()
        .await?
        .error_for_status()?;

    let res = response.json::<PlaylistTracksResponse>().await?;
    Ok(res.items.into_iter().filter_map(|item| item.track).collect())
}

/// Fetches the audio features for up to 100 tracks in one batch call.
///
/// Tracks the provider has no analysis for come back as nulls and are
/// dropped.
pub async fn audio_features(
    token: &str,
    track_ids: &[String],
) -> Result<Vec<TrackQualities>, reqwest::Error> {
    if track_ids.is_empty() {
        return Ok(Vec::new());
    }

    let api_url = format!("{}/audio-features", config::spotify_api_url());

    let client = utils::http_client();
    let response = client
        .get(&api_url)
        .bearer_auth(token)
        .query(&[("ids", track_ids.join(",").as_str())])
        .send()
        .await?
        .error_for_status()?;

    let res = response.json::<AudioFeaturesResponse>().await?;
    Ok(res.audio_features.into_iter().flatten().collect())
}
