//! # Dance Ranking Pipeline
//!
//! Turns the current user's playlists into the 30 most danceable tracks and
//! optionally writes them to a new playlist.
//!
//! ```text
//! enumerate ─► pages (fan-out, 50 items/page) ─► collect (dedup by id)
//!                                                   │
//!           rank ◄─ attach ◄─ features (fan-out, 100 ids/batch)
//!             │
//!             └─► writer (create + add tracks)
//! ```
//!
//! Both fan-out stages run at most [`MAX_IN_FLIGHT`] requests at a time, each
//! through its own stream so the stages never compete. Results are reassembled
//! by key, never by completion order. A failing request only empties its own
//! slot; the report carries the counts needed to tell a partial result from a
//! complete one.

mod enumerate;
mod features;
mod pages;
mod rank;
mod writer;

use serde::{Deserialize, Serialize};

use crate::{
    info,
    spotify::{FetchError, SpotifyClient},
    types::Playlist,
};

pub use enumerate::{enumerate_playlists, playlist_names};
pub use features::{FeatureFetch, batch_track_ids, fetch_audio_features};
pub use pages::{PageFetch, fetch_playlist_pages, page_offsets, track_refs_from_page};
pub use rank::{RankedPlaylist, SongCatalog, TOP_N, collect_songs, dedup_by_name, rank_songs};
pub use writer::{WriteError, WriteOutcome, name_exists, write_playlist};

/// Concurrent requests allowed within one fan-out stage.
pub const MAX_IN_FLIGHT: usize = 20;

/// Counts gathered along one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub playlists: usize,
    pub pages_requested: usize,
    pub pages_failed: usize,
    pub track_refs: usize,
    pub unique_tracks: usize,
    pub feature_batches: usize,
    pub feature_batches_failed: usize,
    pub features_missing: usize,
    pub features_malformed: usize,
    pub unrankable: usize,
    pub ranked: usize,
}

impl PipelineReport {
    /// Whether any remote call failed along the way.
    pub fn is_partial(&self) -> bool {
        self.pages_failed > 0 || self.feature_batches_failed > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DanceRanking {
    pub songs: RankedPlaylist,
    pub report: PipelineReport,
    /// Served from the ranking cache instead of a fresh pipeline run.
    #[serde(default)]
    pub cached: bool,
}

/// Runs fetch, collect, features, attach and rank for `playlists`.
pub async fn rank_user_songs(
    client: &SpotifyClient,
    token: &str,
    playlists: &[Playlist],
) -> DanceRanking {
    let mut report = PipelineReport {
        playlists: playlists.len(),
        ..PipelineReport::default()
    };

    let page_fetch = fetch_playlist_pages(client, token, playlists).await;
    report.pages_requested = page_fetch.requested;
    report.pages_failed = page_fetch.failed;
    report.track_refs = page_fetch.pages.iter().map(|p| p.items.len()).sum();

    let mut catalog = collect_songs(&page_fetch.pages);
    report.unique_tracks = catalog.len();

    let feature_fetch = fetch_audio_features(client, token, &catalog.track_ids()).await;
    report.feature_batches = feature_fetch.batches;
    report.feature_batches_failed = feature_fetch.failed_batches;
    report.features_missing = feature_fetch.missing;
    report.features_malformed = feature_fetch.malformed;

    catalog.attach_features(&feature_fetch.features);
    report.unrankable = catalog
        .songs()
        .iter()
        .filter(|song| song.danceability.is_none())
        .count();

    let songs = rank_songs(catalog.into_songs());
    report.ranked = songs.len();

    info!(
        "Ranked {} of {} unique tracks from {} playlists",
        report.ranked, report.unique_tracks, report.playlists
    );

    DanceRanking {
        songs,
        report,
        cached: false,
    }
}

/// Lists the user's playlists and ranks their tracks.
pub async fn rank_library(client: &SpotifyClient, token: &str) -> Result<DanceRanking, FetchError> {
    let listing = client.list_playlists(token).await?;
    let playlists = enumerate_playlists(&listing);
    info!("Found {} playlists for user", playlists.len());
    Ok(rank_user_songs(client, token, &playlists).await)
}
