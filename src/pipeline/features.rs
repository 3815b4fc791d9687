use std::collections::HashSet;

use futures::{StreamExt, stream};

use crate::{
    info,
    spotify::{AUDIO_FEATURES_MAX_IDS, SpotifyClient},
    types::{FeatureEntry, TrackMetadata},
    warning,
};

use super::MAX_IN_FLIGHT;

/// Result of fetching audio features for a set of track ids.
#[derive(Debug, Clone, Default)]
pub struct FeatureFetch {
    /// Non-null features; order within a batch is kept, order across batches
    /// is not meaningful.
    pub features: Vec<TrackMetadata>,
    pub batches: usize,
    pub failed_batches: usize,
    /// Ids the API answered with `null` for.
    pub missing: usize,
    /// Entries dropped because they could not be decoded.
    pub malformed: usize,
}

/// Splits `track_ids` into batches of at most [`AUDIO_FEATURES_MAX_IDS`].
///
/// Duplicates are collapsed (first occurrence kept) because the quota is
/// spent per requested id.
pub fn batch_track_ids(track_ids: &[String]) -> Vec<Vec<String>> {
    let mut seen = HashSet::new();
    let unique: Vec<String> = track_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect();

    unique
        .chunks(AUDIO_FEATURES_MAX_IDS)
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// Fetches audio features for `track_ids`, one request per batch with at most
/// [`MAX_IN_FLIGHT`] batches in flight.
///
/// A failed batch is logged and contributes nothing. `null` entries and
/// entries that do not decode are filtered out and counted separately.
pub async fn fetch_audio_features(
    client: &SpotifyClient,
    token: &str,
    track_ids: &[String],
) -> FeatureFetch {
    let batches = batch_track_ids(track_ids);
    let batch_count = batches.len();

    info!(
        "Fetching audio features for {} tracks in {} batches",
        batches.iter().map(Vec::len).sum::<usize>(),
        batch_count
    );

    let client = client.clone();
    let token = token.to_string();
    let completed = stream::iter(batches)
        .map(move |batch| {
            let client = client.clone();
            let token = token.clone();
            async move {
                let result = client.get_audio_features(&token, &batch).await;
                (batch.len(), result)
            }
        })
        .buffer_unordered(MAX_IN_FLIGHT)
        .collect::<Vec<_>>()
        .await;

    let mut fetch = FeatureFetch {
        batches: batch_count,
        ..FeatureFetch::default()
    };

    for (size, result) in completed {
        match result {
            Ok(entries) => {
                let received = entries.len();
                for entry in entries {
                    match entry {
                        FeatureEntry::Found(metadata) => fetch.features.push(metadata),
                        FeatureEntry::Missing => fetch.missing += 1,
                        FeatureEntry::Malformed(reason) => {
                            fetch.malformed += 1;
                            warning!("Dropped malformed audio features entry: {}", reason);
                        }
                    }
                }
                fetch.missing += size.saturating_sub(received);
            }
            Err(e) => {
                fetch.failed_batches += 1;
                warning!("Failed to fetch audio features for {} tracks: {}", size, e);
            }
        }
    }

    if fetch.missing > 0 {
        warning!(
            "{} tracks have no audio features and will not be ranked",
            fetch.missing
        );
    }

    fetch
}
