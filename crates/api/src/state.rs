use std::sync::Arc;

use shortlink_core::session::SessionManager;
use shortlink_db::stores::DbSessionStore;

use crate::auth::cookie::CookieSigner;
use crate::config::ServerConfig;

/// Session manager backed by the `sessions` table.
pub type Sessions = SessionManager<DbSessionStore>;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: shortlink_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Issues and validates sessions.
    pub sessions: Arc<Sessions>,
    /// Signs the outward session cookie.
    pub cookies: Arc<CookieSigner>,
}

impl AppState {
    pub fn new(pool: shortlink_db::DbPool, config: ServerConfig) -> Self {
        let sessions = SessionManager::new(
            DbSessionStore::new(pool.clone()),
            config.session.max_age_secs(),
        );
        let cookies = CookieSigner::new(&config.session.cookie_secret);

        Self {
            pool,
            config: Arc::new(config),
            sessions: Arc::new(sessions),
            cookies: Arc::new(cookies),
        }
    }
}
