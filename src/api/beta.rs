use axum::{Json, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{info, utils};

use super::ApiError;

#[derive(Debug, Deserialize)]
pub struct BetaRequest {
    pub name: String,
    pub email: String,
}

/// Records a request for beta access after validating the email address.
pub async fn request_beta(
    Json(request): Json<BetaRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if !utils::is_valid_email(&request.email) {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }

    info!(
        "Beta access requested by {} <{}>",
        request.name.trim(),
        request.email.trim()
    );

    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "received" }))))
}
