use std::sync::Arc;

use crate::{
    config::Config,
    error, info,
    pipeline::{self, WriteError, WriteOutcome},
    spotify::SpotifyClient,
    success, warning,
};

use super::{auth::access_token, rank::ranking};

/// Writes the ranking into a new playlist called `name`.
pub async fn playlist(config: Arc<Config>, name: String, refresh: bool) {
    if name.trim().is_empty() {
        error!("Playlist name must not be empty.");
    }

    let client = SpotifyClient::new(config);
    let token = access_token(&client).await;

    let existing_names = match client.list_playlists(&token).await {
        Ok(listing) => pipeline::playlist_names(&listing),
        Err(e) => error!("Failed to list playlists: {}", e),
    };

    if pipeline::name_exists(&name, &existing_names) {
        info!("Playlist {} already exists", name);
        return;
    }

    let user = match client.get_user(&token).await {
        Ok(user) => user,
        Err(e) => error!("Failed to load user profile: {}", e),
    };

    let ranking = ranking(&client, &token, &user.id, refresh).await;
    if ranking.songs.is_empty() {
        warning!("No rankable tracks found, the playlist will be empty.");
    }

    match pipeline::write_playlist(
        &client,
        &token,
        &user.id,
        &name,
        &ranking.songs,
        &existing_names,
    )
    .await
    {
        Ok(WriteOutcome::Created {
            playlist_url,
            tracks_added,
            ..
        }) => success!(
            "Playlist {} created with {} tracks: {}",
            name,
            tracks_added,
            playlist_url.unwrap_or_default()
        ),
        Ok(WriteOutcome::AlreadyExists { name }) => info!("Playlist {} already exists", name),
        Err(WriteError::AddTracks {
            playlist_url,
            source,
            ..
        }) => error!(
            "Playlist {} was created but is empty ({}): {}",
            name,
            playlist_url.unwrap_or_default(),
            source
        ),
        Err(e) => error!("{}", e),
    }
}
