use std::{sync::Arc, time::Duration};

use crate::{
    api::SessionStore,
    config::Config,
    error,
    management::TokenManager,
    server::{AppState, start_api_server},
    spotify::SpotifyClient,
    success,
    types::Token,
    warning,
};

/// Runs the browser login against a local instance of the web app and stores
/// the resulting token for the other commands.
///
/// Starts the server in the background, opens `/login` in the default browser
/// and waits up to 60 seconds for the callback to put a token into a session.
pub async fn auth(config: Arc<Config>) {
    let state = AppState::new(Arc::clone(&config));

    let server_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = start_api_server(server_state).await {
            warning!("Login server stopped: {}", e);
        }
    });

    let login_url = format!("http://{}/login", config.server_addr);
    if webbrowser::open(&login_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            login_url
        )
    }

    match wait_for_token(&state.sessions).await {
        Some(token) => {
            let token_manager = TokenManager::new(token, &config.cache_dir());
            if let Err(e) = token_manager.persist().await {
                error!("Failed to save token to cache: {}", e);
            }

            success!("Authentication successful!");
        }
        None => {
            error!("Authentication failed or timed out.");
        }
    }
}

async fn wait_for_token(sessions: &SessionStore) -> Option<Token> {
    use std::time::Instant;

    let max_wait = Duration::from_secs(60);
    let start = Instant::now();

    while start.elapsed() < max_wait {
        if let Some(token) = sessions.any_token().await {
            return Some(token);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}

/// Access token from the persisted token, refreshed if needed. Exits with a
/// hint to run `dancefloor auth` when there is none.
pub(crate) async fn access_token(client: &SpotifyClient) -> String {
    let cache_dir = client.config().cache_dir();
    let mut token_mgr = match TokenManager::load(&cache_dir).await {
        Ok(manager) => manager,
        Err(e) => {
            error!(
                "Failed to load token. Please run dancefloor auth\n Error: {}",
                e
            );
        }
    };

    match token_mgr.get_valid_token(client).await {
        Ok(token) => token,
        Err(e) => {
            error!(
                "Token is no longer valid. Please run dancefloor auth\n Error: {}",
                e
            );
        }
    }
}
