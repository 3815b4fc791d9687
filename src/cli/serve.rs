use std::sync::Arc;

use crate::{
    config::Config,
    error,
    server::{AppState, start_api_server},
};

/// Runs the web app until the process is stopped.
pub async fn serve(config: Arc<Config>) {
    if let Err(e) = start_api_server(AppState::new(config)).await {
        error!("Server stopped: {}", e);
    }
}
