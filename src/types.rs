use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// OAuth token with an absolute expiry (unix seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: String,
    pub expires_at: u64,
}

impl Token {
    /// Seconds before expiry at which a token is treated as expired.
    pub const REFRESH_MARGIN_SECS: u64 = 60;

    pub fn needs_refresh(&self, now: u64) -> bool {
        self.expires_at.saturating_sub(now) < Self::REFRESH_MARGIN_SECS
    }
}

/// Raw body of the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub product: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

// --- /me/playlists ---------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GetUserPlaylistsResponse {
    #[serde(default)]
    pub items: Vec<PlaylistEntry>,
    pub total: Option<u64>,
    pub next: Option<String>,
}

/// One entry of the user's playlist collection. Every field is optional so a
/// single malformed entry does not poison the whole page.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlaylistEntry {
    pub id: Option<String>,
    pub name: Option<String>,
    pub href: Option<String>,
    pub tracks: Option<PlaylistTracksRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlaylistTracksRef {
    pub total: Option<u64>,
}

// --- /playlists/{id}/tracks ------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GetPlaylistItemsResponse {
    pub name: Option<String>,
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlaylistItem {
    pub track: Option<TrackObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrackObject {
    pub id: Option<String>,
    pub name: Option<String>,
    pub album: Option<AlbumRef>,
    pub artists: Option<Vec<ArtistRef>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AlbumRef {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArtistRef {
    pub name: Option<String>,
}

// --- /audio-features -------------------------------------------------------

/// Elements are kept undecoded so one malformed entry cannot fail the batch.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AudioFeaturesResponse {
    #[serde(default)]
    pub audio_features: Vec<Option<serde_json::Value>>,
}

/// One element of an audio-features response.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureEntry {
    Found(TrackMetadata),
    /// The API answered `null`, e.g. for podcast episodes.
    Missing,
    /// Present but not decodable as [`TrackMetadata`].
    Malformed(String),
}

impl From<Option<serde_json::Value>> for FeatureEntry {
    fn from(raw: Option<serde_json::Value>) -> Self {
        match raw {
            None | Some(serde_json::Value::Null) => FeatureEntry::Missing,
            Some(value) => match serde_json::from_value(value) {
                Ok(metadata) => FeatureEntry::Found(metadata),
                Err(e) => FeatureEntry::Malformed(e.to_string()),
            },
        }
    }
}

/// Audio features of one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub id: String,
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub valence: Option<f64>,
    pub tempo: Option<f64>,
    pub loudness: Option<f64>,
    pub speechiness: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub key: Option<i32>,
    pub mode: Option<i32>,
    pub duration_ms: Option<u64>,
    pub uri: Option<String>,
}

impl TrackMetadata {
    pub fn new(id: &str, danceability: f64) -> Self {
        Self {
            id: id.to_string(),
            danceability: Some(danceability),
            energy: None,
            valence: None,
            tempo: None,
            loudness: None,
            speechiness: None,
            acousticness: None,
            instrumentalness: None,
            liveness: None,
            key: None,
            mode: None,
            duration_ms: None,
            uri: None,
        }
    }
}

// --- playlist writes -------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistResponse {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistResponse {
    pub snapshot_id: String,
}

// --- pipeline --------------------------------------------------------------

/// A playlist of the current user, as needed by the fetch stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    #[serde(rename = "playlist_name")]
    pub name: String,
    #[serde(rename = "playlist_id")]
    pub id: String,
    #[serde(rename = "track_total")]
    pub item_count: u64,
    #[serde(rename = "playlist_href", default)]
    pub href: String,
}

/// One fetched page of a playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPlaylistPage {
    pub playlist_id: String,
    pub playlist_name: String,
    pub offset: u64,
    pub items: Vec<TrackRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRef {
    pub name: String,
    pub track_id: Option<String>,
    pub album_name: String,
    pub artist_name: String,
    pub source_playlist_name: String,
}

/// A track merged from its playlist reference and, once joined, its
/// danceability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub track_name: String,
    pub track_id: String,
    #[serde(rename = "track_album")]
    pub album: String,
    #[serde(rename = "track_artist")]
    pub artist: String,
    pub playlist_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub danceability: Option<f64>,
}

impl Song {
    pub fn uri(&self) -> String {
        format!("spotify:track:{}", self.track_id)
    }
}

#[derive(Tabled)]
pub struct SongTableRow {
    #[tabled(rename = "#")]
    pub rank: usize,
    pub name: String,
    pub artist: String,
    pub playlist: String,
    pub danceability: String,
}
