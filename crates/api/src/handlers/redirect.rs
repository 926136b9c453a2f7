//! Shortcode redirect.

use axum::extract::{Path, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use shortlink_core::error::CoreError;
use shortlink_core::links::resolve_shortcode;
use shortlink_db::repositories::LinkRepo;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /{shortcode}
///
/// Count the visit and answer 301 to the stored URL.
pub async fn follow(
    State(state): State<AppState>,
    Path(shortcode): Path<String>,
) -> AppResult<Response> {
    let id = resolve_shortcode(&shortcode, &state.config.id_space)?;

    let link = LinkRepo::increment_clicks(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Link",
                key: shortcode.clone(),
            })
        })?;

    let location = HeaderValue::from_str(&link.url)
        .map_err(|e| AppError::InternalError(format!("stored URL is not a valid header: {e}")))?;

    tracing::debug!(link_id = link.id, clicks = link.clicks, "Redirecting");
    Ok((StatusCode::MOVED_PERMANENTLY, [(LOCATION, location)]).into_response())
}
