//! # Spotify Integration Module
//!
//! Request wrappers for the parts of the Spotify Web API that dancefloor needs:
//! the OAuth token endpoints, the current user's profile and playlists,
//! playlist items, audio features and playlist writes.
//!
//! ## Architecture
//!
//! ```text
//! Pipeline / HTTP handlers / CLI
//!          ↓
//! SpotifyClient (this module)
//!     ├── auth       authorize URL, code exchange, refresh, ensure_valid
//!     ├── user       GET  /me
//!     ├── playlists  GET  /me/playlists, GET /playlists/{id}/tracks,
//!     │              POST /users/{id}/playlists, POST /playlists/{id}/tracks
//!     └── tracks     GET  /audio-features
//!          ↓
//! reqwest (JSON, bearer auth)
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns `Result<T, FetchError>`. Network failures, non-2xx
//! statuses, bodies that are not JSON and JSON `null` bodies all end up as an
//! `Err`, so "the call failed" is never confused with "the call returned an
//! empty list". Nothing here panics on remote data.
//!
//! Transient failures are retried per call:
//! - **Network errors and 5xx**: retried after `retry_delay`
//! - **429 Too Many Requests**: retried after `Retry-After` seconds, unless that
//!   exceeds `max_retry_after`
//! - **Other 4xx**: returned immediately
//!
//! ## Configuration
//!
//! The client owns an `Arc<Config>` passed in by the caller; base URLs,
//! credentials and retry tuning come from there rather than from globals.
//!
//! ## Concurrency
//!
//! `SpotifyClient` is `Clone` and shares one connection pool. The access token
//! is passed per call and only read, so any number of tasks may use the same
//! client and token at once.

mod auth;
mod client;
mod error;
mod playlists;
mod tracks;
mod user;

pub use auth::token_from_response;
pub use client::SpotifyClient;
pub use error::FetchError;
pub use playlists::{PAGE_SIZE, PLAYLIST_DESCRIPTION, PLAYLIST_ITEM_FIELDS, PLAYLIST_LIST_LIMIT};
pub use tracks::AUDIO_FEATURES_MAX_IDS;
