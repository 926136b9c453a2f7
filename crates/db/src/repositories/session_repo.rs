//! Repository for the `sessions` table.

use shortlink_core::session::SessionRecord;
use shortlink_core::types::UnixTime;
use sqlx::SqlitePool;

use crate::models::session::SessionRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "session_id, expiry_instant, user_id";

/// Provides CRUD operations for server-side sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a session record. A duplicate `session_id` fails on the primary key.
    pub async fn create(
        pool: &SqlitePool,
        record: &SessionRecord,
    ) -> Result<SessionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (session_id, expiry_instant, user_id)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SessionRow>(&query)
            .bind(record.session_id)
            .bind(record.expiry_instant)
            .bind(record.user_id)
            .fetch_one(pool)
            .await
    }

    /// Find a session by id, expired or not.
    pub async fn find_by_id(
        pool: &SqlitePool,
        session_id: i64,
    ) -> Result<Option<SessionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE session_id = $1");
        sqlx::query_as::<_, SessionRow>(&query)
            .bind(session_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a session. Returns `true` if a row was removed.
    pub async fn delete(pool: &SqlitePool, session_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete sessions whose expiry is at or before `now`. Returns the count.
    pub async fn delete_expired(pool: &SqlitePool, now: UnixTime) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expiry_instant <= $1")
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
