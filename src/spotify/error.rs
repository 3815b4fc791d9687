use thiserror::Error;

/// Why a single remote call produced no data.
///
/// Every variant means "fetch failed"; callers that only need to know whether
/// data arrived can treat them alike, while logs keep the detail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("network failure: {0}")]
    Network(String),

    #[error("remote returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("rate limited, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("malformed response body: {0}")]
    Decode(String),

    #[error("remote returned an empty body")]
    EmptyBody,

    #[error("not authorized: {0}")]
    Unauthorized(String),
}

impl FetchError {
    /// Whether repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::RateLimited { .. } => true,
            FetchError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}
