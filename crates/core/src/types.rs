/// All database primary keys are SQLite 64-bit integers.
pub type DbId = i64;

/// Seconds since the unix epoch (UTC).
pub type UnixTime = i64;

/// Owner id recorded on links created without an authenticated session.
pub const ANONYMOUS_OWNER: DbId = -1;

/// Current time as unix seconds.
pub fn now_unix() -> UnixTime {
    chrono::Utc::now().timestamp()
}
