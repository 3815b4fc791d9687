use std::path::{Path, PathBuf};

use crate::{
    info,
    pipeline::{self, DanceRanking},
    spotify::{FetchError, SpotifyClient},
    utils, warning,
};

/// Per-user copy of the last complete ranking.
///
/// Only spares the remote calls; a cached ranking is the same value, report
/// included, that the pipeline produced when it was stored.
pub struct RankingCache {
    path: PathBuf,
}

impl RankingCache {
    pub fn new(cache_dir: &Path, user_id: &str) -> Self {
        Self {
            path: cache_dir.join(format!("{}_dance_songs.json", utils::cache_key(user_id))),
        }
    }

    pub async fn load(&self) -> Result<DanceRanking, String> {
        let content = async_fs::read_to_string(&self.path)
            .await
            .map_err(|e| e.to_string())?;
        serde_json::from_str(&content).map_err(|e| e.to_string())
    }

    pub async fn persist(&self, ranking: &DanceRanking) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(ranking).map_err(|e| e.to_string())?;
        async_fs::write(&self.path, json)
            .await
            .map_err(|e| e.to_string())
    }

    pub async fn clear(&self) -> Result<(), String> {
        match async_fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Returns the cached ranking when `cache` is given and holds one, otherwise
/// runs the pipeline over the user's library.
///
/// Only complete runs are stored; a partial ranking is returned but never
/// cached.
pub async fn load_or_rank(
    cache: Option<&RankingCache>,
    client: &SpotifyClient,
    token: &str,
) -> Result<DanceRanking, FetchError> {
    if let Some(cache) = cache {
        if let Ok(mut ranking) = cache.load().await {
            info!("Using cached ranking from {}", cache.path().display());
            ranking.cached = true;
            return Ok(ranking);
        }
    }

    let ranking = pipeline::rank_library(client, token).await?;

    if let Some(cache) = cache {
        if ranking.report.is_partial() {
            warning!("Ranking is partial, not caching it");
        } else if let Err(e) = cache.persist(&ranking).await {
            warning!("Failed to cache ranking: {}", e);
        }
    }

    Ok(ranking)
}
