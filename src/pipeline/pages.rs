use futures::{StreamExt, stream};

use crate::{
    info,
    spotify::{PAGE_SIZE, SpotifyClient},
    types::{GetPlaylistItemsResponse, Playlist, PlaylistItem, RawPlaylistPage, TrackRef},
    warning,
};

use super::MAX_IN_FLIGHT;

/// Result of fetching every page of every playlist.
#[derive(Debug, Clone, Default)]
pub struct PageFetch {
    /// One page per request, ordered by playlist (input order) then offset.
    pub pages: Vec<RawPlaylistPage>,
    pub requested: usize,
    pub failed: usize,
}

/// Offsets of the pages needed to cover `item_count` items.
pub fn page_offsets(item_count: u64) -> Vec<u64> {
    (0..item_count).step_by(PAGE_SIZE as usize).collect()
}

/// Fetches all pages of all playlists with at most [`MAX_IN_FLIGHT`] requests
/// in flight.
///
/// Pages complete in any order; they are put back in (playlist, offset) order
/// before returning. A failed page is logged and kept as an empty page, so
/// siblings are never affected by one failure.
pub async fn fetch_playlist_pages(
    client: &SpotifyClient,
    token: &str,
    playlists: &[Playlist],
) -> PageFetch {
    let requests: Vec<(usize, Playlist, u64)> = playlists
        .iter()
        .enumerate()
        .flat_map(|(index, playlist)| {
            page_offsets(playlist.item_count)
                .into_iter()
                .map(move |offset| (index, playlist.clone(), offset))
        })
        .collect();
    let requested = requests.len();

    info!(
        "Fetching {} pages across {} playlists",
        requested,
        playlists.len()
    );

    let client = client.clone();
    let token = token.to_string();
    let completed = stream::iter(requests)
        .map(move |(index, playlist, offset)| {
            let client = client.clone();
            let token = token.clone();
            async move {
                let result = client
                    .list_playlist_items(&token, &playlist.id, offset)
                    .await;
                (index, playlist, offset, result)
            }
        })
        .buffer_unordered(MAX_IN_FLIGHT)
        .collect::<Vec<_>>()
        .await;

    let mut failed = 0;
    let mut keyed = Vec::with_capacity(completed.len());
    for (index, playlist, offset, result) in completed {
        let items = match result {
            Ok(response) => track_refs_from_page(&playlist.name, response),
            Err(e) => {
                failed += 1;
                warning!(
                    "Failed to fetch items of playlist {} at offset {}: {}",
                    playlist.name,
                    offset,
                    e
                );
                Vec::new()
            }
        };

        keyed.push((
            index,
            RawPlaylistPage {
                playlist_id: playlist.id,
                playlist_name: playlist.name,
                offset,
                items,
            },
        ));
    }

    keyed.sort_by_key(|(index, page)| (*index, page.offset));

    PageFetch {
        pages: keyed.into_iter().map(|(_, page)| page).collect(),
        requested,
        failed,
    }
}

/// Converts one API page into track references tagged with the playlist name.
///
/// Items without a track, or whose track lacks a name, album or artist, are
/// dropped. Tracks without an id (local files) are kept; aggregation drops
/// them later.
pub fn track_refs_from_page(playlist_name: &str, response: GetPlaylistItemsResponse) -> Vec<TrackRef> {
    let total = response.items.len();
    let refs: Vec<TrackRef> = response
        .items
        .into_iter()
        .filter_map(|item| track_ref(playlist_name, item))
        .collect();

    if refs.len() < total {
        warning!(
            "Dropped {} malformed items from playlist {}",
            total - refs.len(),
            playlist_name
        );
    }

    refs
}

fn track_ref(playlist_name: &str, item: PlaylistItem) -> Option<TrackRef> {
    let track = item.track?;
    let artist_name = track.artists?.into_iter().next()?.name?;

    Some(TrackRef {
        name: track.name?,
        track_id: track.id,
        album_name: track.album?.name?,
        artist_name,
        source_playlist_name: playlist_name.to_string(),
    })
}
