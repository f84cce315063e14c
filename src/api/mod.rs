//! # API Module
//!
//! HTTP handlers for the service endpoints, built on [Axum](https://docs.rs/axum).
//!
//! ## Endpoints
//!
//! ### Authentication
//!
//! - [`login`] - starts the OAuth flow: returns the provider authorize URL
//!   and binds the correlation cookie
//! - [`callback`] - completes the flow: redeems the authorization code and
//!   binds the access-token cookie
//! - [`close`] - popup-closing page the callback redirects to
//! - [`refresh_token`] - forces a refresh of the cookie-bound token
//!
//! ### Playlists (protected by the token resolution middleware)
//!
//! - [`search`] - Top-50 playlist id for a country
//! - [`weather`] - the full weather-to-playlist pipeline
//! - [`create_playlist`] / [`add_tracks`] - thin playlist wrappers with
//!   provider status passthrough
//!
//! ### Monitoring
//!
//! - [`health`] - status and version for load balancers

mod auth;
mod health;
mod playlist;
mod weather;

pub use auth::callback;
pub use auth::close;
pub use auth::login;
pub use auth::refresh_token;
pub use health::health;
pub use playlist::add_tracks;
pub use playlist::create_playlist;
pub use playlist::search;
pub use weather::weather;
