use crate::types::UserProfile;

use super::{FetchError, SpotifyClient};

impl SpotifyClient {
    /// Profile of the user owning `token`.
    pub async fn get_user(&self, token: &str) -> Result<UserProfile, FetchError> {
        let url = self.endpoint("me");
        self.execute(|http| http.get(&url).bearer_auth(token)).await
    }
}
