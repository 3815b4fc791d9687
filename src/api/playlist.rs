use axum::{Json, extract::State, http::HeaderMap};
use serde::Deserialize;

use crate::{
    info, management,
    pipeline::{self, WriteOutcome},
    server::AppState,
};

use super::{ApiError, library::ranking_cache, session};

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistForm {
    pub playlist_name: String,
}

/// Ranks the user's library and writes the result to a new playlist.
///
/// A name that is already taken is not an error: the response carries
/// `"outcome": "already_exists"` and nothing is written.
pub async fn create_dance_playlist(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<CreatePlaylistForm>,
) -> Result<Json<WriteOutcome>, ApiError> {
    let name = form.playlist_name;
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("playlist_name must not be empty".to_string()));
    }

    let (id, token) = session::authorize(&state, &headers).await?;
    let user = session::session_user(&state, &id, &token).await?;
    let cache = ranking_cache(&state, &id, &token).await?;

    let listing = state.client.list_playlists(&token.access_token).await?;
    let existing_names = pipeline::playlist_names(&listing);

    if pipeline::name_exists(&name, &existing_names) {
        info!("User {} already has a playlist named {}", user.id, name);
        return Ok(Json(WriteOutcome::AlreadyExists { name }));
    }

    let ranking = management::load_or_rank(cache.as_ref(), &state.client, &token.access_token).await?;
    let outcome = pipeline::write_playlist(
        &state.client,
        &token.access_token,
        &user.id,
        &name,
        &ranking.songs,
        &existing_names,
    )
    .await?;

    Ok(Json(outcome))
}
