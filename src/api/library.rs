use axum::{Json, extract::State, http::HeaderMap};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    management::{self, RankingCache},
    pipeline::{self, DanceRanking, RankedPlaylist, SongCatalog},
    server::AppState,
    types::{Playlist, RawPlaylistPage, Song, Token, TrackMetadata},
};

use super::{ApiError, session};

/// The user's playlists with their item counts.
pub async fn user_playlists(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Playlist>>, ApiError> {
    let (_, token) = session::authorize(&state, &headers).await?;

    let listing = state.client.list_playlists(&token.access_token).await?;
    Ok(Json(pipeline::enumerate_playlists(&listing)))
}

/// Validates a client-supplied batch of playlists. Anything but a non-empty
/// list of playlist objects is rejected.
pub fn parse_playlist_batch(body: Value) -> Result<Vec<Playlist>, ApiError> {
    match body {
        Value::Array(items) if !items.is_empty() => {
            serde_json::from_value(Value::Array(items))
                .map_err(|e| ApiError::BadRequest(format!("Invalid input data: {}", e)))
        }
        _ => Err(ApiError::BadRequest("Invalid input data".to_string())),
    }
}

/// Every page of every playlist in the request body.
pub async fn playlist_items(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Vec<RawPlaylistPage>>, ApiError> {
    let playlists = parse_playlist_batch(body)?;
    let (_, token) = session::authorize(&state, &headers).await?;

    let fetch = pipeline::fetch_playlist_pages(&state.client, &token.access_token, &playlists).await;
    Ok(Json(fetch.pages))
}

/// Unique songs (by track id) found in the given pages.
pub async fn song_list(Json(pages): Json<Vec<RawPlaylistPage>>) -> Json<Vec<Song>> {
    Json(pipeline::collect_songs(&pages).into_songs())
}

/// Non-null audio features for the given songs.
pub async fn song_data(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(songs): Json<Vec<Song>>,
) -> Result<Json<Vec<TrackMetadata>>, ApiError> {
    let (_, token) = session::authorize(&state, &headers).await?;

    let track_ids: Vec<String> = songs.into_iter().map(|song| song.track_id).collect();
    let fetch = pipeline::fetch_audio_features(&state.client, &token.access_token, &track_ids).await;
    Ok(Json(fetch.features))
}

#[derive(Debug, Deserialize)]
pub struct DanceSongsRequest {
    pub songs: Vec<Song>,
    pub song_data: Vec<TrackMetadata>,
}

/// Joins songs with their features and returns the top ranking.
pub async fn dance_songs(Json(request): Json<DanceSongsRequest>) -> Json<RankedPlaylist> {
    let mut catalog: SongCatalog = request.songs.into_iter().collect();
    catalog.attach_features(&request.song_data);
    Json(pipeline::rank_songs(catalog.into_songs()))
}

/// Full pipeline over the user's library.
pub async fn dance_rankings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DanceRanking>, ApiError> {
    let (id, token) = session::authorize(&state, &headers).await?;
    let cache = ranking_cache(&state, &id, &token).await?;

    let ranking = management::load_or_rank(cache.as_ref(), &state.client, &token.access_token).await?;
    Ok(Json(ranking))
}

/// The per-user ranking cache, when caching is switched on.
pub(crate) async fn ranking_cache(
    state: &AppState,
    id: &str,
    token: &Token,
) -> Result<Option<RankingCache>, ApiError> {
    let config = state.client.config();
    if !config.cache_rankings {
        return Ok(None);
    }

    let user = session::session_user(state, id, token).await?;
    Ok(Some(RankingCache::new(&config.cache_dir(), &user.id)))
}
