pub mod auth;
pub mod health;
pub mod links;
pub mod redirect;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/register                 register (public)
/// /auth/login                    login (public)
/// /auth/logout                   logout (cookie optional)
/// /auth/session                  session state (cookie optional)
///
/// /links                         create (cookie optional)
/// /user/links                    list own links (requires session)
/// /user/links/{id}               delete own link (requires session)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .merge(links::router())
}
