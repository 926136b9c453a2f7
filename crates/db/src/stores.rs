//! sqlx-backed implementations of the core storage traits.

use async_trait::async_trait;
use shortlink_core::error::CoreError;
use shortlink_core::idgen::IdLookup;
use shortlink_core::links::{LinkStore, NewLink};
use shortlink_core::session::{SessionRecord, SessionStore};
use shortlink_core::types::{DbId, UnixTime};

use crate::repositories::{LinkRepo, SessionRepo};
use crate::DbPool;

/// Convert a sqlx error into the core taxonomy.
///
/// Unique and primary-key violations become [`CoreError::Conflict`] so the
/// retry loops in the core can recognise them; everything else is internal.
pub fn map_sqlx_error(err: sqlx::Error) -> CoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            CoreError::Conflict(db_err.message().to_string())
        }
        _ => CoreError::Internal(err.to_string()),
    }
}

/// [`SessionStore`] over the `sessions` table.
#[derive(Debug, Clone)]
pub struct DbSessionStore {
    pool: DbPool,
}

impl DbSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for DbSessionStore {
    async fn create(&self, record: &SessionRecord) -> Result<(), CoreError> {
        SessionRepo::create(&self.pool, record)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn fetch_by_id(&self, session_id: i64) -> Result<SessionRecord, CoreError> {
        SessionRepo::find_by_id(&self.pool, session_id)
            .await
            .map_err(map_sqlx_error)?
            .map(SessionRecord::from)
            .ok_or_else(|| CoreError::NotFound {
                entity: "Session",
                key: session_id.to_string(),
            })
    }

    async fn delete(&self, session_id: i64) -> Result<(), CoreError> {
        SessionRepo::delete(&self.pool, session_id)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn purge_expired(&self, now: UnixTime) -> Result<u64, CoreError> {
        SessionRepo::delete_expired(&self.pool, now)
            .await
            .map_err(map_sqlx_error)
    }
}

/// [`LinkStore`] over the `links` table.
#[derive(Debug, Clone)]
pub struct DbLinkStore {
    pool: DbPool,
}

impl DbLinkStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdLookup for DbLinkStore {
    async fn id_exists(&self, id: DbId) -> Result<bool, CoreError> {
        LinkRepo::exists(&self.pool, id)
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl LinkStore for DbLinkStore {
    async fn insert_link(&self, link: &NewLink) -> Result<(), CoreError> {
        LinkRepo::create(&self.pool, link)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
