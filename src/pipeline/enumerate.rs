use crate::{
    types::{GetUserPlaylistsResponse, Playlist, PlaylistEntry},
    warning,
};

/// Extracts name, id, item count and href for every playlist in the listing.
///
/// Entries missing any of those fields are dropped and logged.
pub fn enumerate_playlists(listing: &GetUserPlaylistsResponse) -> Vec<Playlist> {
    listing
        .items
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match playlist_from_entry(entry) {
            Some(playlist) => Some(playlist),
            None => {
                warning!(
                    "Skipping playlist entry #{} ({}): missing name, id, href or track total",
                    index,
                    entry.name.as_deref().unwrap_or("unnamed")
                );
                None
            }
        })
        .collect()
}

fn playlist_from_entry(entry: &PlaylistEntry) -> Option<Playlist> {
    Some(Playlist {
        name: entry.name.clone()?,
        id: entry.id.clone()?,
        item_count: entry.tracks.as_ref()?.total?,
        href: entry.href.clone()?,
    })
}

/// Names of the user's playlists, used for the duplicate-name check.
pub fn playlist_names(listing: &GetUserPlaylistsResponse) -> Vec<String> {
    listing
        .items
        .iter()
        .filter_map(|entry| entry.name.clone())
        .collect()
}
