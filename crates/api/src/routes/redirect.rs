use axum::routing::get;
use axum::Router;

use crate::handlers::redirect;
use crate::state::AppState;

/// Mount the shortcode redirect at the root. Static routes such as
/// `/health` take priority over the capture.
pub fn router() -> Router<AppState> {
    Router::new().route("/{shortcode}", get(redirect::follow))
}
