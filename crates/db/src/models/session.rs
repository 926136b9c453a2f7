//! Session row model.

use shortlink_core::session::SessionRecord;
use shortlink_core::types::{DbId, UnixTime};
use sqlx::FromRow;

/// A row from the `sessions` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct SessionRow {
    pub session_id: i64,
    pub expiry_instant: UnixTime,
    pub user_id: DbId,
}

impl From<SessionRow> for SessionRecord {
    fn from(row: SessionRow) -> Self {
        Self {
            session_id: row.session_id,
            expiry_instant: row.expiry_instant,
            user_id: row.user_id,
        }
    }
}
