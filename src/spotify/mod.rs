//! # Spotify Integration Module
//!
//! Interface to the Spotify Accounts service and Web API. The submodules are
//! split by concern:
//!
//! - [`auth`] - the token endpoint client: authorization-code exchange (PKCE
//!   or client secret), refresh, and current-user lookup
//! - [`search`] - Top-50 playlist lookup, playlist tracks, audio features
//! - [`playlist`] - playlist creation and track insertion
//!
//! All Web API calls send the access token as a bearer header and return
//! `Result<_, reqwest::Error>`; callers translate HTTP status codes into the
//! service error taxonomy. None of the wrappers retry on authorization
//! failures; the refresh-and-retry-once policy lives with the caller that
//! owns the resolved token.

pub mod auth;
pub mod playlist;
pub mod search;
