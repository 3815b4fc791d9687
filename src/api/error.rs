use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{pipeline::WriteError, spotify::FetchError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not logged in")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] FetchError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(FetchError::Unauthorized(_)) => StatusCode::UNAUTHORIZED,
            ApiError::Upstream(_) | ApiError::Write(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
