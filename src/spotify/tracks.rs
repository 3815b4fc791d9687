use crate::types::{AudioFeaturesResponse, FeatureEntry};

use super::{FetchError, SpotifyClient};

/// Most track ids the audio-features endpoint accepts per request.
pub const AUDIO_FEATURES_MAX_IDS: usize = 100;

impl SpotifyClient {
    /// Audio features for up to [`AUDIO_FEATURES_MAX_IDS`] tracks.
    ///
    /// The result is positionally aligned with `track_ids`; ids unknown to the
    /// API (podcast episodes, removed tracks) come back as
    /// [`FeatureEntry::Missing`].
    pub async fn get_audio_features(
        &self,
        token: &str,
        track_ids: &[String],
    ) -> Result<Vec<FeatureEntry>, FetchError> {
        let url = self.endpoint("audio-features");
        let ids = track_ids.join(",");
        let response: AudioFeaturesResponse = self
            .execute(|http| http.get(&url).bearer_auth(token).query(&[("ids", ids.as_str())]))
            .await?;

        Ok(response
            .audio_features
            .into_iter()
            .map(FeatureEntry::from)
            .collect())
    }
}
