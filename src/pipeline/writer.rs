use serde::Serialize;
use thiserror::Error;

use crate::{info, spotify::FetchError, spotify::SpotifyClient, success, warning};

use super::RankedPlaylist;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WriteOutcome {
    Created {
        playlist_id: String,
        playlist_url: Option<String>,
        tracks_added: usize,
    },
    /// A playlist with the requested name already exists; nothing was written.
    AlreadyExists { name: String },
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create playlist {name}: {source}")]
    Create {
        name: String,
        #[source]
        source: FetchError,
    },

    /// The playlist exists remotely but is empty. It is not rolled back.
    #[error("playlist {playlist_id} was created but adding tracks failed: {source}")]
    AddTracks {
        playlist_id: String,
        playlist_url: Option<String>,
        #[source]
        source: FetchError,
    },
}

/// Exact, case-sensitive comparison against the user's playlist names.
pub fn name_exists(name: &str, existing_names: &[String]) -> bool {
    existing_names.iter().any(|existing| existing == name)
}

/// Creates playlist `name` for `user_id` and fills it with `ranked`, in order,
/// with a single add-tracks call.
///
/// If `name` is already taken nothing is sent and
/// [`WriteOutcome::AlreadyExists`] is returned.
pub async fn write_playlist(
    client: &SpotifyClient,
    token: &str,
    user_id: &str,
    name: &str,
    ranked: &RankedPlaylist,
    existing_names: &[String],
) -> Result<WriteOutcome, WriteError> {
    if name_exists(name, existing_names) {
        info!("Playlist {} already exists, not creating it", name);
        return Ok(WriteOutcome::AlreadyExists {
            name: name.to_string(),
        });
    }

    let created = client
        .create_playlist(token, user_id, name)
        .await
        .map_err(|source| WriteError::Create {
            name: name.to_string(),
            source,
        })?;
    let playlist_url = created.external_urls.spotify.clone();

    let uris = ranked.uris();
    let tracks_added = uris.len();
    if !uris.is_empty() {
        if let Err(source) = client.add_tracks(token, &created.id, uris).await {
            warning!(
                "Playlist {} was created but adding tracks failed: {}",
                created.id,
                source
            );
            return Err(WriteError::AddTracks {
                playlist_id: created.id,
                playlist_url,
                source,
            });
        }
    }

    success!(
        "Created playlist {} with {} tracks",
        playlist_url.as_deref().unwrap_or(&created.id),
        tracks_added
    );

    Ok(WriteOutcome::Created {
        playlist_id: created.id,
        playlist_url,
        tracks_added,
    })
}
