//! Repository for the `links` table.

use shortlink_core::links::NewLink;
use shortlink_core::types::DbId;
use sqlx::SqlitePool;

use crate::models::link::Link;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, shortcode, url, owner_user_id, clicks, created_at";

/// Provides CRUD operations for links.
pub struct LinkRepo;

impl LinkRepo {
    /// Insert a link with a caller-chosen id, returning the created row.
    ///
    /// A taken id or shortcode fails on the primary key or `uq_links_shortcode`.
    pub async fn create(pool: &SqlitePool, input: &NewLink) -> Result<Link, sqlx::Error> {
        let query = format!(
            "INSERT INTO links (id, shortcode, url, owner_user_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Link>(&query)
            .bind(input.id)
            .bind(&input.shortcode)
            .bind(&input.url)
            .bind(input.owner_user_id)
            .fetch_one(pool)
            .await
    }

    /// Find a link by id.
    pub async fn find_by_id(pool: &SqlitePool, id: DbId) -> Result<Option<Link>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM links WHERE id = $1");
        sqlx::query_as::<_, Link>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether a link with this id exists.
    pub async fn exists(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM links WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Count one visit and return the updated row.
    ///
    /// A single UPDATE, so concurrent visits never lose increments. Returns
    /// `None` if no link has this id.
    pub async fn increment_clicks(
        pool: &SqlitePool,
        id: DbId,
    ) -> Result<Option<Link>, sqlx::Error> {
        let query = format!(
            "UPDATE links SET clicks = clicks + 1 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Link>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's links, newest first.
    pub async fn list_by_owner(
        pool: &SqlitePool,
        owner_user_id: DbId,
    ) -> Result<Vec<Link>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM links
             WHERE owner_user_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Link>(&query)
            .bind(owner_user_id)
            .fetch_all(pool)
            .await
    }

    /// Delete a link. Returns `true` if a row was removed.
    pub async fn delete(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM links WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
