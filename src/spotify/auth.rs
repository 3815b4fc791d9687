use reqwest::{RequestBuilder, Url};

use crate::{
    types::{Token, TokenResponse},
    utils,
};

use super::{FetchError, SpotifyClient};

impl SpotifyClient {
    /// Builds the URL the user is redirected to for granting access.
    ///
    /// Uses the authorization code flow with a PKCE S256 challenge; `state` is
    /// echoed back on the callback and must be checked there.
    pub fn authorize_url(&self, state: &str, code_challenge: &str) -> Result<String, String> {
        let config = self.config();
        let url = Url::parse_with_params(
            &config.auth_url,
            &[
                ("client_id", config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", config.redirect_uri.as_str()),
                ("code_challenge_method", "S256"),
                ("code_challenge", code_challenge),
                ("scope", config.scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| e.to_string())?;

        Ok(url.to_string())
    }

    /// Exchanges an authorization code (plus the PKCE verifier that produced
    /// the challenge) for a token.
    pub async fn exchange_code(&self, code: &str, verifier: &str) -> Result<Token, FetchError> {
        let config = self.config();
        let response: TokenResponse = self
            .execute(|http| {
                let request = http.post(&config.token_url).form(&[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("redirect_uri", config.redirect_uri.as_str()),
                    ("client_id", config.client_id.as_str()),
                    ("code_verifier", verifier),
                ]);
                self.with_client_auth(request)
            })
            .await?;

        Ok(token_from_response(response, None, utils::now_timestamp()))
    }

    /// Trades a refresh token for a new access token. The old refresh token is
    /// kept when the response does not rotate it.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Token, FetchError> {
        let config = self.config();
        let response: TokenResponse = self
            .execute(|http| {
                let request = http.post(&config.token_url).form(&[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                    ("client_id", config.client_id.as_str()),
                ]);
                self.with_client_auth(request)
            })
            .await?;

        Ok(token_from_response(
            response,
            Some(refresh_token.to_string()),
            utils::now_timestamp(),
        ))
    }

    /// Returns a token that is usable at `now`, refreshing it if it is about to
    /// expire. The flag tells the caller whether the token changed and has to
    /// be stored again.
    ///
    /// Call this once before fanning out requests; in-flight requests never
    /// race against a refresh.
    pub async fn ensure_valid(&self, token: Token, now: u64) -> Result<(Token, bool), FetchError> {
        if !token.needs_refresh(now) {
            return Ok((token, false));
        }

        let Some(refresh_token) = token.refresh_token.as_deref() else {
            return Err(FetchError::Unauthorized(
                "token expired and no refresh token is available".to_string(),
            ));
        };

        let fresh = self.refresh(refresh_token).await?;
        Ok((fresh, true))
    }

    fn with_client_auth(&self, request: RequestBuilder) -> RequestBuilder {
        let config = self.config();
        match &config.client_secret {
            Some(secret) => request.basic_auth(&config.client_id, Some(secret)),
            None => request,
        }
    }
}

pub fn token_from_response(response: TokenResponse, previous_refresh: Option<String>, now: u64) -> Token {
    Token {
        access_token: response.access_token,
        refresh_token: response.refresh_token.or(previous_refresh),
        scope: response.scope,
        expires_at: now + response.expires_in,
    }
}
