//! # CLI Module
//!
//! Command implementations behind the `dancefloor` binary. Each command
//! delegates to the pipeline, the Spotify client and the management layer and
//! only adds user interaction: spinners, tables and coloured status lines.
//!
//! ## Commands
//!
//! - [`serve`] - Runs the JSON web app
//! - [`auth`] - Logs in through the browser and persists the token
//! - [`rank`] - Prints the 30 most danceable tracks across all playlists
//! - [`playlist`] - Writes that ranking into a new playlist
//!
//! ## Usage Patterns
//!
//! ```bash
//! dancefloor auth                       # Authenticate with Spotify
//! dancefloor rank                       # Show the ranking (cached after the first run)
//! dancefloor rank --refresh             # Recompute it
//! dancefloor playlist --name "My Mix"   # Create the playlist
//! dancefloor serve                      # Run the web app
//! ```
//!
//! ## Errors
//!
//! Commands are the only place allowed to terminate the process: an unusable
//! token, a failed playlist listing or a failed write ends the command with the
//! `error!` macro. Partial pipeline results are reported as warnings.

mod auth;
mod playlist;
mod rank;
mod serve;

pub use auth::auth;
pub use playlist::playlist;
pub use rank::rank;
pub use serve::serve;
