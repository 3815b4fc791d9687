use std::{sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    config::Config,
    error, info,
    management::{self, RankingCache},
    pipeline::{DanceRanking, RankedPlaylist},
    spotify::SpotifyClient,
    success,
    types::SongTableRow,
    warning,
};

use super::auth::access_token;

/// Prints the user's 30 most danceable tracks.
pub async fn rank(config: Arc<Config>, refresh: bool) {
    let client = SpotifyClient::new(config);
    let token = access_token(&client).await;
    let user = match client.get_user(&token).await {
        Ok(user) => user,
        Err(e) => error!("Failed to load user profile: {}", e),
    };

    let ranking = ranking(&client, &token, &user.id, refresh).await;
    print_ranking(&ranking.songs);

    let report = &ranking.report;
    if ranking.cached {
        info!("Served from cache, run with --refresh to recompute");
    } else if report.is_partial() {
        warning!(
            "Partial result: {} of {} pages and {} of {} feature batches failed",
            report.pages_failed,
            report.pages_requested,
            report.feature_batches_failed,
            report.feature_batches
        );
    }
}

/// Ranking for `user_id`, through the on-disk cache.
pub(crate) async fn ranking(
    client: &SpotifyClient,
    token: &str,
    user_id: &str,
    refresh: bool,
) -> DanceRanking {
    let cache = RankingCache::new(&client.config().cache_dir(), user_id);
    if refresh {
        if let Err(e) = cache.clear().await {
            warning!("Failed to clear ranking cache: {}", e);
        }
    }

    let pb = spinner("Ranking tracks of all playlists...");
    let result = management::load_or_rank(Some(&cache), client, token).await;
    pb.finish_and_clear();

    match result {
        Ok(ranking) => {
            success!("Ranked {} tracks", ranking.songs.len());
            ranking
        }
        Err(e) => error!("Failed to rank tracks: {}", e),
    }
}

fn print_ranking(ranked: &RankedPlaylist) {
    if ranked.is_empty() {
        warning!("No rankable tracks found.");
        return;
    }

    let rows: Vec<SongTableRow> = ranked
        .songs()
        .iter()
        .enumerate()
        .map(|(i, song)| SongTableRow {
            rank: i + 1,
            name: song.track_name.clone(),
            artist: song.artist.clone(),
            playlist: song.playlist_name.clone(),
            danceability: song
                .danceability
                .map(|d| format!("{:.3}", d))
                .unwrap_or_default(),
        })
        .collect();

    println!("{}", Table::new(rows));
}

pub(crate) fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
