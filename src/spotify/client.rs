use std::{sync::Arc, time::Duration};

use reqwest::{Client, RequestBuilder, Response, StatusCode, header::RETRY_AFTER};
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::{config::Config, warning};

use super::FetchError;

/// Stateless wrapper around the Spotify Web API.
///
/// Holds the HTTP connection pool and the explicit [`Config`]; clones are cheap
/// and share both, so a single client can be handed to every concurrent task.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    config: Arc<Config>,
}

impl SpotifyClient {
    pub fn new(config: Arc<Config>) -> Self {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|e| {
                warning!(
                    "Failed to build HTTP client ({}), continuing without the {:?} request timeout",
                    e,
                    config.request_timeout
                );
                Client::new()
            });
        Self { http, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{base}/{path}",
            base = self.config.api_url.trim_end_matches('/'),
            path = path.trim_start_matches('/')
        )
    }

    /// Sends the request built by `build` and decodes a JSON body into `T`.
    ///
    /// Transient failures (network errors, 5xx, 429 with an acceptable
    /// `Retry-After`) are retried up to `max_attempts` times. A `null` or empty
    /// body is reported as [`FetchError::EmptyBody`], never as a default value.
    pub(crate) async fn execute<T, F>(&self, build: F) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt = 1;

        loop {
            let result = match build(&self.http).send().await {
                Ok(response) => read_response(response).await,
                Err(err) => Err(FetchError::from(err)),
            };

            match result {
                Err(err) if attempt < self.config.max_attempts => match self.retry_wait(&err) {
                    Some(wait) => {
                        sleep(wait).await;
                        attempt += 1;
                    }
                    None => return Err(err),
                },
                other => return other,
            }
        }
    }

    fn retry_wait(&self, err: &FetchError) -> Option<Duration> {
        match err {
            FetchError::RateLimited { retry_after_secs } => {
                if *retry_after_secs <= self.config.max_retry_after.as_secs() {
                    Some(Duration::from_secs(*retry_after_secs))
                } else {
                    warning!(
                        "Retry after has reached an abnormal high of {} seconds, giving up on this request.",
                        retry_after_secs
                    );
                    None
                }
            }
            err if err.is_transient() => Some(self.config.retry_delay),
            _ => None,
        }
    }
}

async fn read_response<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(1);
        return Err(FetchError::RateLimited { retry_after_secs });
    }

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(FetchError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let body = response.bytes().await?;
    decode_body(&body)
}

pub(crate) fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, FetchError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(FetchError::EmptyBody);
    }

    match serde_json::from_slice::<Option<T>>(body) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(FetchError::EmptyBody),
        Err(e) => Err(FetchError::Decode(e.to_string())),
    }
}
