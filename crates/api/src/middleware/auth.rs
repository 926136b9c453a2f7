//! Cookie-session extractors for Axum handlers.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use shortlink_core::error::CoreError;
use shortlink_core::session::{SessionRecord, SessionRejection, SessionState};
use shortlink_core::types::DbId;

use crate::auth::cookie::{read_cookie, CookieSigner, SESSION_COOKIE};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from the `session` cookie.
///
/// Use this as an extractor parameter in any handler that requires authentication:
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
///
/// No cookie yields 401. A cookie that fails validation yields 401 and a
/// `Set-Cookie` that clears it.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    /// The stored record the cookie was checked against.
    pub session: SessionRecord,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_session(&parts.headers, state).await {
            SessionState::Authenticated(record) => Ok(AuthUser {
                user_id: record.user_id,
                session: record,
            }),
            SessionState::Anonymous => Err(AppError::Core(CoreError::Unauthenticated(
                "Login required".into(),
            ))),
            SessionState::Invalidated(rejection) => {
                Err(AppError::InvalidSession {
                    reason: rejection.to_string(),
                    secure_cookies: state.config.session.secure_cookies,
                })
            }
        }
    }
}

/// The request's settled session state. Never rejects.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub SessionState);

impl CurrentSession {
    /// The authenticated user id, if any.
    pub fn user_id(&self) -> Option<DbId> {
        match &self.0 {
            SessionState::Authenticated(record) => Some(record.user_id),
            _ => None,
        }
    }
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(CurrentSession(resolve_session(&parts.headers, state).await))
    }
}

/// Return the signature-checked cookie payload, or `None` when no session
/// cookie is present.
pub fn signed_payload(
    headers: &HeaderMap,
    signer: &CookieSigner,
) -> Result<Option<String>, SessionRejection> {
    match read_cookie(headers, SESSION_COOKIE) {
        None | Some("") => Ok(None),
        Some(value) => signer
            .verify(value)
            .map(Some)
            .map_err(|e| SessionRejection::Malformed(e.to_string())),
    }
}

/// Verify the cookie signature and validate the payload against the store.
pub async fn resolve_session(headers: &HeaderMap, state: &AppState) -> SessionState {
    match signed_payload(headers, &state.cookies) {
        Ok(None) => SessionState::Anonymous,
        Ok(Some(payload)) => state.sessions.resolve(Some(&payload)).await,
        Err(rejection) => {
            tracing::info!(reason = %rejection, "Session cookie failed signature check");
            SessionState::Invalidated(rejection)
        }
    }
}
