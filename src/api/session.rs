use std::{collections::HashMap, sync::Arc};

use axum::http::{HeaderMap, header::COOKIE};
use cookie::{Cookie, SameSite};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    info,
    server::AppState,
    spotify::FetchError,
    types::{Token, UserProfile},
    utils,
};

use super::ApiError;

pub const SESSION_COOKIE: &str = "dancefloor_session";

/// Server-side state of one browser session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub code_verifier: Option<String>,
    pub oauth_state: Option<String>,
    pub token: Option<Token>,
    pub user: Option<UserProfile>,
}

/// In-memory sessions keyed by the id stored in the session cookie.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `session` under a fresh random id and returns the id.
    pub async fn insert(&self, session: Session) -> String {
        let id = Uuid::new_v4().to_string();
        self.inner.lock().await.insert(id.clone(), session);
        id
    }

    pub async fn get(&self, id: &str) -> Option<Session> {
        self.inner.lock().await.get(id).cloned()
    }

    /// Applies `f` to the session. Returns `false` if there is no such session.
    pub async fn update<F>(&self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut Session),
    {
        match self.inner.lock().await.get_mut(id) {
            Some(session) => {
                f(session);
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, id: &str) -> Option<Session> {
        self.inner.lock().await.remove(id)
    }

    /// Token of any session that finished the login.
    pub async fn any_token(&self) -> Option<Token> {
        self.inner
            .lock()
            .await
            .values()
            .find_map(|session| session.token.clone())
    }
}

/// Session id carried by the request's cookies, if any.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

/// `Set-Cookie` value binding the browser to session `id`.
pub fn session_cookie(id: &str) -> String {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
        .to_string()
}

/// `Set-Cookie` value that makes the browser forget its session.
pub fn removal_cookie() -> String {
    let mut cookie = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    cookie.make_removal();
    cookie.to_string()
}

/// Resolves the request's session and returns its id plus a token that is
/// valid right now.
///
/// A token close to expiry is refreshed here, before any other remote call of
/// the request, and written back to the session.
pub(crate) async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(String, Token), ApiError> {
    let id = session_id(headers).ok_or(ApiError::Unauthorized)?;
    let session = state.sessions.get(&id).await.ok_or(ApiError::Unauthorized)?;
    let token = session.token.ok_or(ApiError::Unauthorized)?;

    let (token, refreshed) = state
        .client
        .ensure_valid(token, utils::now_timestamp())
        .await
        .map_err(|e| match e {
            FetchError::Unauthorized(_) => ApiError::Unauthorized,
            other => ApiError::Upstream(other),
        })?;

    if refreshed {
        info!("Token is about to expire, refreshed it");
        let stored = token.clone();
        state
            .sessions
            .update(&id, move |session| session.token = Some(stored))
            .await;
    }

    Ok((id, token))
}

/// Profile of the session's user, fetched once and then served from the
/// session.
pub(crate) async fn session_user(
    state: &AppState,
    id: &str,
    token: &Token,
) -> Result<UserProfile, ApiError> {
    if let Some(user) = state.sessions.get(id).await.and_then(|s| s.user) {
        return Ok(user);
    }

    let user = state.client.get_user(&token.access_token).await?;
    let stored = user.clone();
    state
        .sessions
        .update(id, move |session| session.user = Some(stored))
        .await;
    Ok(user)
}
