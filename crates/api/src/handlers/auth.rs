//! Handlers for the `/auth` resource (register, login, logout, session).

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use shortlink_core::accounts::{normalize_email, username_from_email, DEFAULT_PERMISSIONS};
use shortlink_core::error::CoreError;
use shortlink_core::session::{SessionState, SessionToken};
use shortlink_core::types::{DbId, UnixTime};
use shortlink_db::models::user::{CreateUser, UserResponse};
use shortlink_db::repositories::UserRepo;

use crate::auth::cookie::{clear_session_cookie, session_cookie};
use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, CredentialError,
};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{signed_payload, CurrentSession};
use crate::response::DataResponse;
use crate::state::AppState;

/// Message shared by every failed login so callers cannot probe for accounts.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register` and `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Successful login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    /// Unix time at which the new session expires.
    pub expires_at: UnixTime,
}

/// Body of `GET /auth/session`.
#[derive(Debug, Serialize)]
pub struct SessionStatus {
    /// `anonymous`, `authenticated` or `invalidated`.
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<UnixTime>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create an account. The username is the local part of the email.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<CredentialsRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    let email = normalize_email(&input.email);
    let username = username_from_email(&email)?;

    validate_password_strength(&input.password, state.config.password_min_length)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    // Fast path for the common case; the unique index still decides races.
    if UserRepo::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(
            "Email is already registered".into(),
        )));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            email,
            username,
            password_hash,
            permissions: DEFAULT_PERMISSIONS.to_string(),
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "Registered user");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserResponse::from(user),
        }),
    ))
}

/// POST /api/v1/auth/login
///
/// Check credentials, start a session and set the signed cookie. A request
/// that already carries a valid session is rejected with 409.
pub async fn login(
    State(state): State<AppState>,
    current: CurrentSession,
    Json(input): Json<CredentialsRequest>,
) -> AppResult<Response> {
    if current.user_id().is_some() {
        return Err(AppError::Core(CoreError::Conflict("Already logged in".into())));
    }

    let email = normalize_email(&input.email);
    let user = UserRepo::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized(INVALID_CREDENTIALS.into())))?;

    match verify_password(&input.password, &user.password_hash) {
        Ok(()) => {}
        Err(CredentialError::Mismatch) => {
            tracing::info!(user_id = user.id, "Login failed: wrong password");
            return Err(AppError::Core(CoreError::Unauthorized(
                INVALID_CREDENTIALS.into(),
            )));
        }
        Err(e) => return Err(AppError::InternalError(e.to_string())),
    }

    let token = state.sessions.issue(user.id).await?;
    let cookie = state.cookies.sign(&token.to_payload()?);
    let set_cookie = session_cookie(
        &cookie,
        state.sessions.max_age_secs(),
        state.config.session.secure_cookies,
    );

    let body = DataResponse {
        data: LoginResponse {
            user: UserResponse::from(user),
            expires_at: token.expiry_time_unix,
        },
    };
    Ok((StatusCode::OK, [(SET_COOKIE, set_cookie)], Json(body)).into_response())
}

/// POST /api/v1/auth/logout
///
/// Always clears the cookie. The stored session is deleted when the cookie
/// carries a correctly signed, well-formed token, whether or not it is
/// still valid. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    if let Ok(Some(payload)) = signed_payload(&headers, &state.cookies) {
        if let Ok(token) = SessionToken::from_payload(&payload) {
            state.sessions.revoke(&token).await?;
        }
    }

    let clear = clear_session_cookie(state.config.session.secure_cookies);
    Ok((StatusCode::NO_CONTENT, [(SET_COOKIE, clear)]).into_response())
}

/// GET /api/v1/auth/session
///
/// Report the caller's session state. An invalidated cookie is cleared.
pub async fn session(
    State(state): State<AppState>,
    CurrentSession(current): CurrentSession,
) -> Response {
    let status = SessionStatus {
        state: current.as_str(),
        user_id: None,
        expires_at: None,
    };

    match current {
        SessionState::Authenticated(record) => Json(DataResponse {
            data: SessionStatus {
                user_id: Some(record.user_id),
                expires_at: Some(record.expiry_instant),
                ..status
            },
        })
        .into_response(),
        SessionState::Anonymous => Json(DataResponse { data: status }).into_response(),
        SessionState::Invalidated(_) => {
            let clear = clear_session_cookie(state.config.session.secure_cookies);
            ([(SET_COOKIE, clear)], Json(DataResponse { data: status })).into_response()
        }
    }
}
