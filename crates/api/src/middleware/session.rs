//! Cookie session extractors.

use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use dex_core::error::CoreError;
use dex_core::session::SESSION_COOKIE;
use dex_core::types::UserId;

use crate::error::AppError;
use crate::state::AppState;

/// A user authenticated through the `sid` session cookie.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: UserId,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match session_user(parts, state).await? {
            Some(user) => Ok(user),
            None => Err(AppError::Core(CoreError::Unauthorized(
                "Login required".into(),
            ))),
        }
    }
}

/// The requesting user, if logged in. Never rejects for a missing or
/// unknown session.
#[derive(Debug, Clone, Copy)]
pub struct Viewer(pub Option<AuthUser>);

impl Viewer {
    pub fn user_id(&self) -> Option<UserId> {
        self.0.map(|user| user.user_id)
    }
}

impl FromRequestParts<AppState> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Viewer(session_user(parts, state).await?))
    }
}

async fn session_user(parts: &Parts, state: &AppState) -> Result<Option<AuthUser>, AppError> {
    let Some(token) = session_token(parts) else {
        return Ok(None);
    };
    let user_id = state.store.identity().resolve_session(token).await?;
    Ok(user_id.map(|user_id| AuthUser { user_id }))
}

/// Pull the session token out of the `Cookie` header(s).
fn session_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_cookie(cookie: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(COOKIE, cookie)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn finds_sid_among_other_cookies() {
        let parts = parts_with_cookie("theme=dark; sid=abc123; lang=en");
        assert_eq!(session_token(&parts), Some("abc123"));
    }

    #[test]
    fn ignores_similarly_named_cookies() {
        let parts = parts_with_cookie("xsid=nope; sidebar=open");
        assert_eq!(session_token(&parts), None);
    }

    #[test]
    fn empty_sid_is_no_session() {
        let parts = parts_with_cookie("sid=");
        assert_eq!(session_token(&parts), None);
    }
}
