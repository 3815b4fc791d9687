mod auth;
mod ranking;

pub use auth::TokenManager;
pub use ranking::{RankingCache, load_or_rank};
