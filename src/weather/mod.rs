//! Geocoding and current-weather providers.
//!
//! Thin request/response wrappers over LocationIQ (city name to coordinates)
//! and OpenWeather (coordinates to temperature and conditions). No retry or
//! caching; the weather pipeline treats any failure here as an upstream
//! outage the user can retry wholesale.

use crate::{
    config,
    types::{CurrentWeather, GeoPlace},
    utils,
};

/// Resolves a city name to candidate places. The first result is the best
/// match; an empty list means the city is unknown to the geocoder.
pub async fn geocode(city: &str) -> Result<Vec<GeoPlace>, reqwest::Error> {
    let client = utils::http_client();
    let response = client
        .get(config::locationiq_url())
        .query(&[
            ("key", config::locationiq_api_key().as_str()),
            ("q", city),
            ("format", "json"),
        ])
        .send()
        .await?
        .error_for_status()?;

    response.json::<Vec<GeoPlace>>().await
}

/// Fetches current conditions for a coordinate pair, in metric units.
pub async fn current(lat: &str, lon: &str) -> Result<CurrentWeather, reqwest::Error> {
    let client = utils::http_client();
    let response = client
        .get(config::openweather_url())
        .query(&[
            ("lat", lat),
            ("lon", lon),
            ("appid", config::openweather_api_key().as_str()),
            ("units", "metric"),
        ])
        .send()
        .await?
        .error_for_status()?;

    response.json::<CurrentWeather>().await
}
