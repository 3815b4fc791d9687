use std::path::{Path, PathBuf};

use crate::{
    spotify::{FetchError, SpotifyClient},
    types::Token,
    utils, warning,
};

/// Token used by the command-line commands, persisted between runs.
pub struct TokenManager {
    token: Token,
    path: PathBuf,
}

impl TokenManager {
    pub fn new(token: Token, cache_dir: &Path) -> Self {
        TokenManager {
            token,
            path: Self::token_path(cache_dir),
        }
    }

    pub async fn load(cache_dir: &Path) -> Result<Self, String> {
        let path = Self::token_path(cache_dir);
        let content = async_fs::read_to_string(&path)
            .await
            .map_err(|e| e.to_string())?;
        let token: Token = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        Ok(Self { token, path })
    }

    pub async fn persist(&self) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(&self.token).map_err(|e| e.to_string())?;
        async_fs::write(&self.path, json)
            .await
            .map_err(|e| e.to_string())
    }

    /// Returns an access token valid right now, refreshing and persisting it
    /// first if it is about to expire.
    pub async fn get_valid_token(&mut self, client: &SpotifyClient) -> Result<String, FetchError> {
        let (token, refreshed) = client
            .ensure_valid(self.token.clone(), utils::now_timestamp())
            .await?;

        if refreshed {
            self.token = token;
            if let Err(e) = self.persist().await {
                warning!("Failed to save refreshed token to {}: {}", self.path.display(), e);
            }
        }

        Ok(self.token.access_token.clone())
    }

    pub fn current_token(&self) -> &Token {
        &self.token
    }

    fn token_path(cache_dir: &Path) -> PathBuf {
        cache_dir.join("token.json")
    }
}
