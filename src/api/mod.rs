//! # API Module
//!
//! HTTP endpoints of the dancefloor web app. Every endpoint answers with JSON
//! (the OAuth callback answers with a redirect or a short HTML notice); there is
//! no UI beyond that.
//!
//! ## Endpoints
//!
//! ### Authentication
//!
//! - [`login`] - Opens a session and redirects to Spotify's consent page
//! - [`callback`] - Completes the authorization code + PKCE exchange
//! - [`welcome`] - Returns the logged-in user's profile
//! - [`logout`] - Drops the session
//!
//! ### Library and Ranking
//!
//! - [`user_playlists`] - The user's playlists with item counts
//! - [`playlist_items`] - All pages of a client-supplied list of playlists
//! - [`song_list`] - Unique songs found in a set of pages
//! - [`song_data`] - Audio features for a set of songs
//! - [`dance_songs`] - Ranks songs joined with their audio features
//! - [`dance_rankings`] - The whole pipeline in one call
//! - [`create_dance_playlist`] - Ranks and writes a new playlist
//!
//! ### Misc
//!
//! - [`request_beta`] - Validates and records a beta access request
//! - [`health`] - Status and version for monitoring
//!
//! ## Sessions
//!
//! Sessions live in memory in a [`SessionStore`] and are found through the
//! `dancefloor_session` cookie. Each authorized endpoint validates (and if
//! needed refreshes) the session token once before calling Spotify.
//!
//! ## Errors
//!
//! Failures are reported through [`ApiError`]: 401 without a usable session,
//! 400 for malformed input (always before any remote call), 502 when Spotify
//! calls fail.

mod beta;
mod callback;
mod error;
mod health;
mod library;
mod playlist;
mod session;

pub use beta::request_beta;
pub use callback::{callback, login, logout, welcome};
pub use error::ApiError;
pub use health::health;
pub use library::{
    dance_rankings, dance_songs, parse_playlist_batch, playlist_items, song_data, song_list,
    user_playlists,
};
pub use playlist::create_dance_playlist;
pub use session::{
    SESSION_COOKIE, Session, SessionStore, removal_cookie, session_cookie, session_id,
};
