//! Handlers for the `/auth` resource (OAuth login and callback).

use axum::extract::{Query, State};
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use dex_core::session::{SESSION_COOKIE, SESSION_COOKIE_MAX_AGE_SECS};
use serde::Deserialize;

use crate::auth::oauth::exchange_code;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
}

/// GET /api/v1/auth/login
///
/// 302 to the identity provider's authorize page.
pub async fn login(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let target = state
        .config
        .oauth
        .authorize_redirect()
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    Ok((StatusCode::FOUND, [(LOCATION, target)]))
}

/// GET /api/v1/auth/callback
///
/// Exchange the code, start a session, set the `sid` cookie and go home.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> AppResult<impl IntoResponse> {
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".into()))?;

    let user_id = exchange_code(&state.http, &state.config.oauth, &code)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;
    let token = state.store.identity().create_session(user_id).await?;

    tracing::info!(user_id, "User logged in");
    Ok((
        StatusCode::FOUND,
        [
            (LOCATION, "/".to_string()),
            (SET_COOKIE, session_cookie(&token)),
        ],
    ))
}

fn session_cookie(token: &str) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Max-Age={SESSION_COOKIE_MAX_AGE_SECS}; Path=/; HttpOnly; SameSite=Lax"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_lasts_a_year() {
        let cookie = session_cookie("tok");
        assert!(cookie.starts_with("sid=tok;"));
        assert!(cookie.contains("Max-Age=31557600"));
        assert!(cookie.contains("HttpOnly"));
    }
}
