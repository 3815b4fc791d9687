use crate::types::{
    AddTrackToPlaylistRequest, AddTrackToPlaylistResponse, CreatePlaylistRequest,
    CreatePlaylistResponse, GetPlaylistItemsResponse, GetUserPlaylistsResponse,
};

use super::{FetchError, SpotifyClient};

/// Items per playlist page; the API maximum for playlist tracks.
pub const PAGE_SIZE: u64 = 50;

/// Playlists requested from `/me/playlists`. Only the first page is read.
pub const PLAYLIST_LIST_LIMIT: u64 = 50;

/// Projection applied to playlist item requests so only the fields the
/// ranking needs travel over the wire.
pub const PLAYLIST_ITEM_FIELDS: &str = "name,items(track(id,name,album(name),artists(name)))";

pub const PLAYLIST_DESCRIPTION: &str = "My top dance songs ;)";

impl SpotifyClient {
    /// First page of the current user's playlists.
    pub async fn list_playlists(&self, token: &str) -> Result<GetUserPlaylistsResponse, FetchError> {
        let url = self.endpoint("me/playlists");
        self.execute(|http| {
            http.get(&url)
                .bearer_auth(token)
                .query(&[("limit", PLAYLIST_LIST_LIMIT)])
        })
        .await
    }

    /// One page of [`PAGE_SIZE`] items of a playlist, starting at `offset`.
    pub async fn list_playlist_items(
        &self,
        token: &str,
        playlist_id: &str,
        offset: u64,
    ) -> Result<GetPlaylistItemsResponse, FetchError> {
        let url = self.endpoint(&format!("playlists/{}/tracks", playlist_id));
        let limit = PAGE_SIZE.to_string();
        let offset = offset.to_string();
        self.execute(|http| {
            http.get(&url).bearer_auth(token).query(&[
                ("fields", PLAYLIST_ITEM_FIELDS),
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
            ])
        })
        .await
    }

    /// Creates a private playlist owned by `user_id`.
    pub async fn create_playlist(
        &self,
        token: &str,
        user_id: &str,
        name: &str,
    ) -> Result<CreatePlaylistResponse, FetchError> {
        let url = self.endpoint(&format!("users/{}/playlists", user_id));
        let body = CreatePlaylistRequest {
            name: name.to_string(),
            description: PLAYLIST_DESCRIPTION.to_string(),
            public: false,
        };
        self.execute(|http| http.post(&url).bearer_auth(token).json(&body))
            .await
    }

    /// Appends `uris` to the playlist in the given order.
    pub async fn add_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        uris: Vec<String>,
    ) -> Result<AddTrackToPlaylistResponse, FetchError> {
        let url = self.endpoint(&format!("playlists/{}/tracks", playlist_id));
        let body = AddTrackToPlaylistRequest { uris };
        self.execute(|http| http.post(&url).bearer_auth(token).json(&body))
            .await
    }
}
