//! Handlers for creating, listing and deleting links.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use shortlink_core::error::CoreError;
use shortlink_core::links::create_link;
use shortlink_core::types::{DbId, ANONYMOUS_OWNER};
use shortlink_db::models::link::Link;
use shortlink_db::repositories::LinkRepo;
use shortlink_db::stores::DbLinkStore;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, CurrentSession};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /links`.
#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub url: String,
}

/// POST /api/v1/links
///
/// Shorten a URL. The link belongs to the caller when a valid session is
/// present and is anonymous otherwise.
pub async fn create(
    State(state): State<AppState>,
    current: CurrentSession,
    Json(input): Json<CreateLinkRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Link>>)> {
    let owner = current.user_id().unwrap_or(ANONYMOUS_OWNER);
    let store = DbLinkStore::new(state.pool.clone());

    let created = create_link(&store, &state.config.id_space, &input.url, owner).await?;

    let link = LinkRepo::find_by_id(&state.pool, created.id)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("link {} vanished after insert", created.id)))?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: link })))
}

/// GET /api/v1/user/links
pub async fn list_mine(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Link>>>> {
    let links = LinkRepo::list_by_owner(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse { data: links }))
}

/// DELETE /api/v1/user/links/{id}
///
/// Only the owner may delete a link. Returns 204 No Content.
pub async fn delete_mine(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let link = LinkRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Link",
            key: id.to_string(),
        }))?;

    if link.owner_user_id != user.user_id {
        tracing::warn!(link_id = id, user_id = user.user_id, "Refused to delete another user's link");
        return Err(AppError::Core(CoreError::Forbidden(
            "You do not own this link".into(),
        )));
    }

    LinkRepo::delete(&state.pool, id).await?;
    tracing::info!(link_id = id, user_id = user.user_id, "Deleted link");
    Ok(StatusCode::NO_CONTENT)
}
