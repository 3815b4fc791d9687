use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    types::{RawPlaylistPage, Song, TrackMetadata},
    warning,
};

/// Length of the final ranking.
pub const TOP_N: usize = 30;

/// Songs keyed by track id, in first-seen order. The first occurrence of an id
/// wins; later ones are ignored.
#[derive(Debug, Clone, Default)]
pub struct SongCatalog {
    songs: Vec<Song>,
    index: HashMap<String, usize>,
}

impl SongCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `song` unless its track id is already present. Returns whether it
    /// was added.
    pub fn insert(&mut self, song: Song) -> bool {
        if self.index.contains_key(&song.track_id) {
            return false;
        }
        self.index.insert(song.track_id.clone(), self.songs.len());
        self.songs.push(song);
        true
    }

    pub fn get(&self, track_id: &str) -> Option<&Song> {
        self.index.get(track_id).map(|&i| &self.songs[i])
    }

    pub fn track_ids(&self) -> Vec<String> {
        self.songs.iter().map(|s| s.track_id.clone()).collect()
    }

    /// Sets danceability on every song that has matching features. Features
    /// for unknown ids or without a danceability value are ignored. Returns the
    /// number of songs updated.
    pub fn attach_features(&mut self, features: &[TrackMetadata]) -> usize {
        let mut attached = 0;
        for metadata in features {
            let (Some(&i), Some(danceability)) = (self.index.get(&metadata.id), metadata.danceability)
            else {
                continue;
            };
            self.songs[i].danceability = Some(danceability);
            attached += 1;
        }
        attached
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn into_songs(self) -> Vec<Song> {
        self.songs
    }
}

impl FromIterator<Song> for SongCatalog {
    fn from_iter<I: IntoIterator<Item = Song>>(iter: I) -> Self {
        let mut catalog = SongCatalog::new();
        for song in iter {
            catalog.insert(song);
        }
        catalog
    }
}

/// Flattens fetched pages into a catalog. Track references without an id are
/// dropped.
pub fn collect_songs(pages: &[RawPlaylistPage]) -> SongCatalog {
    pages
        .iter()
        .flat_map(|page| page.items.iter())
        .filter_map(|track| {
            let track_id = track.track_id.clone()?;
            Some(Song {
                track_name: track.name.clone(),
                track_id,
                album: track.album_name.clone(),
                artist: track.artist_name.clone(),
                playlist_name: track.source_playlist_name.clone(),
                danceability: None,
            })
        })
        .collect()
}

/// Keeps the first song for every distinct track name.
pub fn dedup_by_name(songs: Vec<Song>) -> Vec<Song> {
    let mut seen = HashSet::new();
    songs
        .into_iter()
        .filter(|song| seen.insert(song.track_name.clone()))
        .collect()
}

/// Top songs by danceability, most danceable first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankedPlaylist(Vec<Song>);

impl RankedPlaylist {
    pub fn songs(&self) -> &[Song] {
        &self.0
    }

    pub fn into_songs(self) -> Vec<Song> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Track URIs in ranked order.
    pub fn uris(&self) -> Vec<String> {
        self.0.iter().map(Song::uri).collect()
    }
}

/// Ranks songs: songs without danceability are left out, duplicate names are
/// collapsed to their first occurrence, the rest is sorted by danceability
/// (descending, stable) and cut to [`TOP_N`].
pub fn rank_songs(songs: Vec<Song>) -> RankedPlaylist {
    let total = songs.len();
    let rankable: Vec<Song> = songs
        .into_iter()
        .filter(|song| song.danceability.is_some())
        .collect();

    let unrankable = total - rankable.len();
    if unrankable > 0 {
        warning!("{} songs have no danceability and were left out", unrankable);
    }

    let mut ranked = dedup_by_name(rankable);
    ranked.sort_by(|a, b| {
        let a = a.danceability.unwrap_or_default();
        let b = b.danceability.unwrap_or_default();
        b.total_cmp(&a)
    });
    ranked.truncate(TOP_N);

    RankedPlaylist(ranked)
}
