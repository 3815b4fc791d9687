use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{server::AppState, success, utils, warning};

use super::{
    ApiError,
    session::{self, Session},
};

/// Starts a login: opens a fresh session holding the PKCE verifier and OAuth
/// state, then redirects to Spotify's consent page.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(previous) = session::session_id(&headers) {
        state.sessions.remove(&previous).await;
    }

    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);
    let oauth_state = utils::generate_oauth_state();

    let auth_url = state
        .client
        .authorize_url(&oauth_state, &code_challenge)
        .map_err(|e| ApiError::BadRequest(format!("Invalid authorization URL: {}", e)))?;

    let id = state
        .sessions
        .insert(Session {
            code_verifier: Some(code_verifier),
            oauth_state: Some(oauth_state),
            ..Session::default()
        })
        .await;

    Ok((
        [(SET_COOKIE, session::session_cookie(&id))],
        Redirect::to(&auth_url),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// OAuth redirect target: checks the state, exchanges the code and stores the
/// token in the session.
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(id) = session::session_id(&headers) else {
        return (StatusCode::BAD_REQUEST, Html("<h4>Missing session.</h4>")).into_response();
    };

    if let Some(error) = params.error {
        warning!("Authorization was denied: {}", error);
        return (StatusCode::UNAUTHORIZED, Html("<h4>Login failed.</h4>")).into_response();
    }

    let Some(code) = params.code else {
        return (
            StatusCode::BAD_REQUEST,
            Html("<h4>Missing authorization code.</h4>"),
        )
            .into_response();
    };

    let Some(session) = state.sessions.get(&id).await else {
        return (StatusCode::BAD_REQUEST, Html("<h4>Unknown session.</h4>")).into_response();
    };

    if params.state.is_none() || session.oauth_state != params.state {
        warning!("OAuth state mismatch for session {}", id);
        return (StatusCode::BAD_REQUEST, Html("<h4>State mismatch.</h4>")).into_response();
    }

    let Some(verifier) = session.code_verifier else {
        return (
            StatusCode::BAD_REQUEST,
            Html("<h4>Missing PKCE code verifier.</h4>"),
        )
            .into_response();
    };

    match state.client.exchange_code(&code, &verifier).await {
        Ok(token) => {
            state
                .sessions
                .update(&id, move |session| {
                    session.token = Some(token);
                    session.code_verifier = None;
                    session.oauth_state = None;
                })
                .await;
            success!("Session {} authenticated", id);
            Redirect::to("/welcome").into_response()
        }
        Err(e) => {
            warning!("Token exchange failed: {}", e);
            (StatusCode::UNAUTHORIZED, Html("<h4>Login failed.</h4>")).into_response()
        }
    }
}

/// Landing route after login; returns the user's profile.
pub async fn welcome(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let (id, token) = session::authorize(&state, &headers).await?;
    let user = session::session_user(&state, &id, &token).await?;
    Ok(Json(user).into_response())
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(id) = session::session_id(&headers) {
        state.sessions.remove(&id).await;
    }

    (
        [(SET_COOKIE, session::removal_cookie())],
        Json(json!({ "status": "logged_out" })),
    )
        .into_response()
}
