//! Configuration management for dancefloor.
//!
//! Configuration is read once at startup into an explicit [`Config`] value that
//! is handed to the Spotify client and the web server. Values come from:
//! 1. Environment variables (highest priority)
//! 2. `.env` in the local data directory, then `.env` in the working directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf, time::Duration};

use thiserror::Error;

const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8080";
const DEFAULT_SCOPE: &str =
    "user-top-read playlist-modify-public playlist-modify-private playlist-read-private";
const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime configuration shared by the client, the pipeline and the server.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    /// Attempts per remote call, including the first one.
    pub max_attempts: u32,
    pub retry_delay: Duration,
    /// Longest `Retry-After` we are willing to sleep through before giving up.
    pub max_retry_after: Duration,
    pub request_timeout: Duration,
    pub cache_rankings: bool,
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_SERVER_ADDRESS.to_string(),
            client_id: String::new(),
            client_secret: None,
            redirect_uri: format!("http://{}/callback", DEFAULT_SERVER_ADDRESS),
            scope: DEFAULT_SCOPE.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            max_attempts: 3,
            retry_delay: Duration::from_millis(1000),
            max_retry_after: Duration::from_secs(120),
            request_timeout: Duration::from_secs(30),
            cache_rankings: false,
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Builds the configuration from the process environment.
    ///
    /// Call [`load_env`] first so values from `.env` files are visible.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `SPOTIFY_API_AUTH_CLIENT_ID` is not
    /// set and [`ConfigError::Invalid`] when a numeric or boolean key cannot be
    /// parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let server_addr = get("SERVER_ADDRESS").unwrap_or(defaults.server_addr);
        let client_id =
            get("SPOTIFY_API_AUTH_CLIENT_ID").ok_or(ConfigError::Missing("SPOTIFY_API_AUTH_CLIENT_ID"))?;
        let redirect_uri = get("SPOTIFY_API_REDIRECT_URI")
            .unwrap_or_else(|| format!("http://{}/callback", server_addr));

        Ok(Self {
            client_id,
            client_secret: get("SPOTIFY_API_AUTH_CLIENT_SECRET"),
            redirect_uri,
            scope: get("SPOTIFY_API_AUTH_SCOPE").unwrap_or(defaults.scope),
            auth_url: get("SPOTIFY_API_AUTH_URL").unwrap_or(defaults.auth_url),
            token_url: get("SPOTIFY_API_TOKEN_URL").unwrap_or(defaults.token_url),
            api_url: get("SPOTIFY_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            max_attempts: parse_attempts(get("DANCEFLOOR_MAX_ATTEMPTS"))?
                .unwrap_or(defaults.max_attempts),
            retry_delay: parse_number("DANCEFLOOR_RETRY_DELAY_MS", get("DANCEFLOOR_RETRY_DELAY_MS"))?
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
            max_retry_after: parse_number(
                "DANCEFLOOR_MAX_RETRY_AFTER_SECS",
                get("DANCEFLOOR_MAX_RETRY_AFTER_SECS"),
            )?
            .map(Duration::from_secs)
            .unwrap_or(defaults.max_retry_after),
            request_timeout: parse_number(
                "DANCEFLOOR_REQUEST_TIMEOUT_SECS",
                get("DANCEFLOOR_REQUEST_TIMEOUT_SECS"),
            )?
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout),
            cache_rankings: parse_bool("DANCEFLOOR_CACHE_RANKINGS", get("DANCEFLOOR_CACHE_RANKINGS"))?
                .unwrap_or(defaults.cache_rankings),
            data_dir: get("DANCEFLOOR_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            server_addr,
        })
    }

    /// Directory holding the persisted token and ranking caches.
    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }
}

/// Loads environment variables from `.env` files.
///
/// Looks in the platform-specific local data directory first
/// (`~/.local/share/dancefloor/.env` on Linux) and then in the working
/// directory. Already-set variables are never overwritten and a missing file
/// is not an error.
///
/// # Errors
///
/// Returns an error string if the data directory cannot be created.
pub async fn load_env() -> Result<(), String> {
    let path = default_data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    dotenv::dotenv().ok();
    Ok(())
}

fn default_data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("dancefloor");
    path
}

fn parse_number(key: &'static str, value: Option<String>) -> Result<Option<u64>, ConfigError> {
    value
        .map(|v| {
            v.trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid { key, value: v })
        })
        .transpose()
}

/// At least one attempt; values beyond `u32` are rejected rather than wrapped.
fn parse_attempts(value: Option<String>) -> Result<Option<u32>, ConfigError> {
    const KEY: &str = "DANCEFLOOR_MAX_ATTEMPTS";
    let Some(raw) = value else {
        return Ok(None);
    };

    let n = parse_number(KEY, Some(raw.clone()))?.unwrap_or_default();
    u32::try_from(n.max(1))
        .map(Some)
        .map_err(|_| ConfigError::Invalid { key: KEY, value: raw })
}

fn parse_bool(key: &'static str, value: Option<String>) -> Result<Option<bool>, ConfigError> {
    value
        .map(|v| match v.trim().to_lowercase().as_str() {
            "true" | "1" | "t" | "yes" => Ok(true),
            "false" | "0" | "f" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value: v }),
        })
        .transpose()
}
