//! Route definitions for links.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::links;
use crate::state::AppState;

/// ```text
/// POST   /links            -> create
/// GET    /user/links       -> list_mine
/// DELETE /user/links/{id}  -> delete_mine
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/links", post(links::create))
        .route("/user/links", get(links::list_mine))
        .route("/user/links/{id}", delete(links::delete_mine))
}
