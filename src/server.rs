use axum::{
    Router,
    routing::{get, post},
};
use std::{net::SocketAddr, str::FromStr, sync::Arc};

use crate::{
    Res, api,
    api::SessionStore,
    config::Config,
    info,
    spotify::SpotifyClient,
};

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub client: SpotifyClient,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            client: SpotifyClient::new(config),
            sessions: SessionStore::new(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/login", get(api::login))
        .route("/callback", get(api::callback))
        .route("/welcome", get(api::welcome))
        .route("/logout", get(api::logout))
        .route("/user-playlists", get(api::user_playlists))
        .route("/playlist-items", post(api::playlist_items))
        .route("/song-list", post(api::song_list))
        .route("/song-data", post(api::song_data))
        .route("/dance-songs", post(api::dance_songs))
        .route("/dance-rankings", get(api::dance_rankings))
        .route("/create-dance-playlist", post(api::create_dance_playlist))
        .route("/request-beta", post(api::request_beta))
        .with_state(state)
}

pub async fn start_api_server(state: AppState) -> Res<()> {
    let addr = SocketAddr::from_str(&state.client.config().server_addr)?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
