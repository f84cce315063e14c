//! Spotify Weather Playlist Backend Library
//!
//! This library implements a small backend service that authenticates a user
//! against Spotify via OAuth 2.0 (Authorization Code with PKCE), keeps the
//! resulting token pair in a durable credential store, refreshes it
//! transparently, and builds playlists matched to the current weather of a
//! city.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the public endpoints
//! - `config` - Configuration management and environment variables
//! - `error` - Request-level error taxonomy and HTTP mapping
//! - `management` - Credential store and OAuth flow orchestration
//! - `middleware` - Token resolution for protected routes
//! - `server` - Router assembly and HTTP listener
//! - `spotify` - Spotify Accounts and Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - PKCE helpers and the weather scoring function
//! - `weather` - Geocoding and current-conditions providers

pub mod api;
pub mod config;
pub mod error;
pub mod management;
pub mod middleware;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;
pub mod weather;

/// Prints an informational message with a blue bullet point.
///
/// The macro accepts the same arguments as `println!`, supporting format
/// strings and interpolation.
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only suitable for unrecoverable startup errors; request handlers return
/// [`error::ApiError`] instead so a single bad request cannot take the
/// service down.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues such as upstream hiccups or internal errors
/// that are reported to the client in a redacted form.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
