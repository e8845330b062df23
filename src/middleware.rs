use crate::auth::{token_from_cookie_header, validate_token};
use crate::errors::AppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header::COOKIE, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: u64,
    pub username: String,
}

pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = session_user(&state, request.headers())
        .await
        .ok_or_else(|| AppError::unauthorized("Unauthorized"))?;

    debug!(user = %user.username, "session accepted");
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Resolves the session cookie to a user that still exists in the store.
pub async fn session_user(state: &AppState, headers: &HeaderMap) -> Option<SessionUser> {
    let token = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(token_from_cookie_header)?;

    let claims = match validate_token(token, &state.config.session_secret) {
        Ok(claims) => claims,
        Err(err) => {
            debug!("session rejected: {err}");
            return None;
        }
    };

    let data = state.data.lock().await;
    let user = data.user_by_id(claims.uid)?;
    (user.username == claims.sub).then(|| SessionUser {
        id: user.id,
        username: user.username.clone(),
    })
}
