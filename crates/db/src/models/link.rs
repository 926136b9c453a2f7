//! Link entity model.

use serde::Serialize;
use shortlink_core::types::{DbId, UnixTime};
use sqlx::FromRow;

/// A row from the `links` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Link {
    pub id: DbId,
    pub shortcode: String,
    pub url: String,
    pub owner_user_id: DbId,
    pub clicks: i64,
    pub created_at: UnixTime,
}
