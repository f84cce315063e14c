use serde::{Deserialize, Serialize};

/// Seconds before the recorded expiry at which a stored access token is
/// already treated as stale, so a token is never handed downstream with only
/// moments left on the clock.
pub const EXPIRY_LEEWAY_SECS: i64 = 60;

/// Durable per-user OAuth token record.
///
/// Exactly one live record exists per Spotify user id; the access token value
/// doubles as a lookup key for cookie-bound requests and is therefore unique
/// across live records. `expires_at` is an absolute epoch-second timestamp
/// computed from the server-observed issuance time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserToken {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: i64,
}

impl UserToken {
    /// Whether the access token is expired (or about to expire) at `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at - EXPIRY_LEEWAY_SECS
    }
}

/// Short-lived record correlating a login-initiation response with the
/// provider callback for the same browser.
///
/// `code_verifier` is `None` when the login used the client-secret fallback
/// instead of PKCE.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub session_id: String,
    pub code_verifier: Option<String>,
    pub created_at: i64,
    pub expires_at: i64,
}

/// Successful outcome of a token endpoint call.
///
/// `refresh_token` is optional because the provider does not rotate it on
/// every refresh; callers must never overwrite a stored value with absence.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub expires_in: i64,
}

/// Discriminated outcome of a token endpoint call; never partially populated.
#[derive(Debug, Clone)]
pub enum TokenExchange {
    Success(TokenGrant),
    Failure {
        error: String,
        error_description: Option<String>,
    },
}

/// Access token resolved for the current request, installed as a request
/// extension by the token resolution middleware.
///
/// `user_id` is known only when the token came out of the credential store;
/// header-supplied bearer tokens are trusted as-is and carry no user context,
/// so they cannot be refreshed on the caller's behalf.
#[derive(Debug, Clone)]
pub struct ResolvedToken {
    pub access_token: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub auth_url: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherRequest {
    pub city: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeatherResponse {
    pub temperature: f64,
    pub playlist: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlaylistBody {
    pub playlist_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePlaylistReply {
    pub playlist_id: String,
    pub playlist_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddTracksBody {
    pub playlist_id: Option<String>,
    pub track_uris: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddTracksReply {
    pub success: bool,
    pub playlist_id: String,
}

// --- Spotify Web API payloads ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
    pub collaborative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistResponse {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTracksRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTracksResponse {
    pub snapshot_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPlaylistsResponse {
    pub playlists: PlaylistPage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistPage {
    // Search pages may pad with nulls.
    pub items: Vec<Option<PlaylistRef>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTracksResponse {
    pub items: Vec<PlaylistTrackItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTrackItem {
    pub track: Option<TrackRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRef {
    pub id: String,
    pub name: String,
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFeaturesResponse {
    pub audio_features: Vec<Option<TrackQualities>>,
}

/// The audio feature subset the weather filter scores on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackQualities {
    pub uri: String,
    pub danceability: f64,
    pub energy: f64,
    pub valence: f64,
    pub acousticness: f64,
}

// --- Geocoding / weather payloads ---

/// A single LocationIQ search result. Coordinates come back as strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoPlace {
    pub lat: String,
    pub lon: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub main: WeatherMain,
    pub weather: Vec<WeatherCondition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherMain {
    pub temp: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub main: String,
    pub description: String,
}
