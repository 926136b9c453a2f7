//! Server-side session lifecycle.
//!
//! A session lives in two places: the client holds a [`SessionToken`] in a
//! cookie, and the server holds the authoritative [`SessionRecord`] in the
//! `sessions` table. A request is authenticated only when the token's three
//! fields match the stored record exactly and the record has not expired.
//!
//! Per-browser states:
//!
//! ```text
//! Anonymous ──token present──> Pending-Validation ──all checks pass──> Authenticated
//!                                      │                                   │
//!                                      └──any check fails──> Invalidated <─┘ logout
//! ```
//!
//! Pending-Validation only exists for the duration of
//! [`SessionManager::validate`]; [`SessionState`] models the settled outcomes.

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{now_unix, DbId, UnixTime};

/// How many fresh session ids [`SessionManager::issue`] tries when the store
/// reports a primary-key collision.
pub const SESSION_ID_ATTEMPTS: u32 = 3;

/// Seconds in one day, for converting the configured max age.
pub const SECS_PER_DAY: i64 = 86_400;

// ---------------------------------------------------------------------------
// Records and tokens
// ---------------------------------------------------------------------------

/// The authoritative row in the `sessions` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRecord {
    pub session_id: i64,
    pub expiry_instant: UnixTime,
    pub user_id: DbId,
}

impl SessionRecord {
    /// Build a record expiring `max_age_secs` after `now`.
    pub fn new(session_id: i64, user_id: DbId, max_age_secs: i64, now: UnixTime) -> Self {
        Self {
            session_id,
            expiry_instant: now.saturating_add(max_age_secs),
            user_id,
        }
    }

    /// Whether the record is still valid at `now`.
    pub fn is_live_at(&self, now: UnixTime) -> bool {
        now < self.expiry_instant
    }

    /// The outward copy handed to the client.
    pub fn token(&self) -> SessionToken {
        SessionToken {
            sess_id: self.session_id,
            expiry_time_unix: self.expiry_instant,
            user_id: self.user_id,
        }
    }
}

/// The three session fields carried in the client's cookie.
///
/// Serialized as `{"sessId":..,"expiryTimeUnix":..,"userId":..}`. Parsing is
/// the single structural and type check: a missing field, an extra nesting
/// level or a non-integer value all fail with
/// [`SessionRejection::Malformed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    pub sess_id: i64,
    pub expiry_time_unix: UnixTime,
    pub user_id: DbId,
}

impl SessionToken {
    /// Serialize to the JSON payload stored in the cookie.
    pub fn to_payload(&self) -> Result<String, CoreError> {
        serde_json::to_string(self)
            .map_err(|e| CoreError::Internal(format!("session token serialization: {e}")))
    }

    /// Parse a cookie payload. Empty input counts as absent.
    pub fn from_payload(raw: &str) -> Result<Self, SessionRejection> {
        if raw.trim().is_empty() {
            return Err(SessionRejection::Absent);
        }
        serde_json::from_str(raw).map_err(|e| SessionRejection::Malformed(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Validation outcomes
// ---------------------------------------------------------------------------

/// Why a session token was not accepted.
///
/// Callers collapse every variant into [`CoreError::Unauthenticated`]; the
/// variant itself is kept for logging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionRejection {
    #[error("no session token")]
    Absent,

    #[error("malformed session token: {0}")]
    Malformed(String),

    #[error("session not found")]
    NotFound,

    #[error("session field {field} does not match the stored record")]
    Mismatched { field: &'static str },

    #[error("session expired")]
    Expired,

    #[error("session store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<SessionRejection> for CoreError {
    fn from(rejection: SessionRejection) -> Self {
        CoreError::Unauthenticated(rejection.to_string())
    }
}

/// Settled session state for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No token was presented.
    Anonymous,
    /// The token matched a live record.
    Authenticated(SessionRecord),
    /// A token was presented but failed validation.
    Invalidated(SessionRejection),
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Anonymous => "anonymous",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::Invalidated(_) => "invalidated",
        }
    }
}

// ---------------------------------------------------------------------------
// Store seam
// ---------------------------------------------------------------------------

/// Persistence for [`SessionRecord`]s.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a record. A duplicate `session_id` must yield
    /// [`CoreError::Conflict`], detected by the primary key.
    async fn create(&self, record: &SessionRecord) -> Result<(), CoreError>;

    /// Point lookup. A missing row must yield [`CoreError::NotFound`].
    async fn fetch_by_id(&self, session_id: i64) -> Result<SessionRecord, CoreError>;

    /// Remove a record. Removing a missing id is not an error.
    async fn delete(&self, session_id: i64) -> Result<(), CoreError>;

    /// Remove every record with `expiry_instant <= now`, returning the count.
    async fn purge_expired(&self, now: UnixTime) -> Result<u64, CoreError>;
}

/// Draw a fresh session id: a positive 63-bit integer.
///
/// `rand::rng()` is a CSPRNG reseeded from the operating system and is
/// independent of the link id generator.
pub fn mint_session_id() -> i64 {
    rand::rng().random_range(1..=i64::MAX)
}

// ---------------------------------------------------------------------------
// Lifecycle manager
// ---------------------------------------------------------------------------

/// Issues, validates and revokes sessions against a [`SessionStore`].
pub struct SessionManager<S> {
    store: S,
    max_age_secs: i64,
}

impl<S: SessionStore> SessionManager<S> {
    pub fn new(store: S, max_age_secs: i64) -> Self {
        Self {
            store,
            max_age_secs,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Session lifetime in seconds.
    pub fn max_age_secs(&self) -> i64 {
        self.max_age_secs
    }

    /// Start a new session for `user_id`.
    pub async fn issue(&self, user_id: DbId) -> Result<SessionToken, CoreError> {
        self.issue_at(user_id, now_unix()).await
    }

    /// Start a new session for `user_id` as of `now`.
    pub async fn issue_at(&self, user_id: DbId, now: UnixTime) -> Result<SessionToken, CoreError> {
        for attempt in 1..=SESSION_ID_ATTEMPTS {
            let record = SessionRecord::new(mint_session_id(), user_id, self.max_age_secs, now);
            match self.store.create(&record).await {
                Ok(()) => {
                    tracing::info!(
                        user_id,
                        expiry_instant = record.expiry_instant,
                        "Issued session"
                    );
                    return Ok(record.token());
                }
                Err(CoreError::Conflict(_)) => {
                    tracing::warn!(attempt, user_id, "Session id collision, minting another");
                }
                Err(e) => return Err(e),
            }
        }

        Err(CoreError::Internal(format!(
            "no unique session id after {SESSION_ID_ATTEMPTS} attempts"
        )))
    }

    /// Validate a raw cookie payload against the store.
    pub async fn validate(&self, raw: Option<&str>) -> Result<SessionRecord, SessionRejection> {
        self.validate_at(raw, now_unix()).await
    }

    /// Validate a raw cookie payload against the store as of `now`.
    pub async fn validate_at(
        &self,
        raw: Option<&str>,
        now: UnixTime,
    ) -> Result<SessionRecord, SessionRejection> {
        let token = SessionToken::from_payload(raw.unwrap_or_default())?;
        self.validate_token_at(&token, now).await
    }

    /// Cross-check a parsed token against its stored record.
    ///
    /// All three fields must equal the stored values, then `now` must be
    /// before the stored expiry.
    pub async fn validate_token_at(
        &self,
        token: &SessionToken,
        now: UnixTime,
    ) -> Result<SessionRecord, SessionRejection> {
        let record = match self.store.fetch_by_id(token.sess_id).await {
            Ok(record) => record,
            Err(CoreError::NotFound { .. }) => return Err(SessionRejection::NotFound),
            Err(e) => return Err(SessionRejection::StoreUnavailable(e.to_string())),
        };

        if record.user_id != token.user_id {
            return Err(SessionRejection::Mismatched { field: "userId" });
        }
        if record.expiry_instant != token.expiry_time_unix {
            return Err(SessionRejection::Mismatched {
                field: "expiryTimeUnix",
            });
        }
        if record.session_id != token.sess_id {
            return Err(SessionRejection::Mismatched { field: "sessId" });
        }
        if !record.is_live_at(now) {
            return Err(SessionRejection::Expired);
        }

        Ok(record)
    }

    /// Classify a request's session without failing.
    pub async fn resolve(&self, raw: Option<&str>) -> SessionState {
        match self.validate(raw).await {
            Ok(record) => SessionState::Authenticated(record),
            Err(SessionRejection::Absent) => SessionState::Anonymous,
            Err(rejection) => {
                tracing::info!(reason = %rejection, "Session rejected");
                SessionState::Invalidated(rejection)
            }
        }
    }

    /// End the session named by `token`. Idempotent.
    pub async fn revoke(&self, token: &SessionToken) -> Result<(), CoreError> {
        self.store.delete(token.sess_id).await?;
        tracing::info!(user_id = token.user_id, "Revoked session");
        Ok(())
    }

    /// Delete every expired record. Returns the number removed.
    pub async fn purge_expired(&self) -> Result<u64, CoreError> {
        self.store.purge_expired(now_unix()).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use assert_matches::assert_matches;

    use super::*;

    const DAY: i64 = SECS_PER_DAY;
    const NOW: UnixTime = 1_700_000_000;

    /// In-memory `sessions` table.
    #[derive(Default)]
    struct MemorySessions {
        rows: Mutex<HashMap<i64, SessionRecord>>,
        offline: bool,
        forced_conflicts: Mutex<u32>,
    }

    #[async_trait]
    impl SessionStore for MemorySessions {
        async fn create(&self, record: &SessionRecord) -> Result<(), CoreError> {
            let mut forced = self.forced_conflicts.lock().unwrap();
            if *forced > 0 {
                *forced -= 1;
                return Err(CoreError::Conflict("sessions.session_id".into()));
            }
            let mut rows = self.rows.lock().unwrap();
            if rows.contains_key(&record.session_id) {
                return Err(CoreError::Conflict("sessions.session_id".into()));
            }
            rows.insert(record.session_id, *record);
            Ok(())
        }

        async fn fetch_by_id(&self, session_id: i64) -> Result<SessionRecord, CoreError> {
            if self.offline {
                return Err(CoreError::Internal("connection refused".into()));
            }
            self.rows
                .lock()
                .unwrap()
                .get(&session_id)
                .copied()
                .ok_or_else(|| CoreError::NotFound {
                    entity: "Session",
                    key: session_id.to_string(),
                })
        }

        async fn delete(&self, session_id: i64) -> Result<(), CoreError> {
            self.rows.lock().unwrap().remove(&session_id);
            Ok(())
        }

        async fn purge_expired(&self, now: UnixTime) -> Result<u64, CoreError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|_, r| r.expiry_instant > now);
            Ok((before - rows.len()) as u64)
        }
    }

    fn manager() -> SessionManager<MemorySessions> {
        SessionManager::new(MemorySessions::default(), 7 * DAY)
    }

    fn payload(token: &SessionToken) -> String {
        token.to_payload().unwrap()
    }

    // -- Issue / validate --------------------------------------------------

    #[tokio::test]
    async fn issue_then_validate_round_trip() {
        let mgr = manager();
        let token = mgr.issue_at(42, NOW).await.unwrap();

        assert!(token.sess_id > 0);
        assert_eq!(token.expiry_time_unix, NOW + 7 * DAY);

        let record = mgr
            .validate_at(Some(&payload(&token)), NOW + 1)
            .await
            .expect("freshly issued session must validate");
        assert_eq!(record.user_id, 42);
        assert_eq!(record.session_id, token.sess_id);
    }

    #[tokio::test]
    async fn issue_with_wall_clock_validates_now() {
        let mgr = manager();
        let token = mgr.issue(5).await.unwrap();
        let record = mgr.validate(Some(&payload(&token))).await.unwrap();
        assert_eq!(record.user_id, 5);
    }

    #[tokio::test]
    async fn issue_retries_on_id_collision() {
        let mgr = manager();
        *mgr.store().forced_conflicts.lock().unwrap() = SESSION_ID_ATTEMPTS - 1;

        let token = mgr.issue_at(1, NOW).await.unwrap();
        assert!(mgr.store().rows.lock().unwrap().contains_key(&token.sess_id));
    }

    #[tokio::test]
    async fn issue_gives_up_after_repeated_collisions() {
        let mgr = manager();
        *mgr.store().forced_conflicts.lock().unwrap() = SESSION_ID_ATTEMPTS;

        assert_matches!(mgr.issue_at(1, NOW).await, Err(CoreError::Internal(_)));
    }

    #[tokio::test]
    async fn sessions_get_distinct_ids() {
        let mgr = manager();
        let a = mgr.issue_at(1, NOW).await.unwrap();
        let b = mgr.issue_at(1, NOW).await.unwrap();
        assert_ne!(a.sess_id, b.sess_id);
    }

    // -- Rejections --------------------------------------------------------

    #[tokio::test]
    async fn expired_session_rejected_even_when_fields_match() {
        let mgr = manager();
        let token = mgr.issue_at(42, NOW).await.unwrap();

        let at_expiry = mgr
            .validate_at(Some(&payload(&token)), token.expiry_time_unix)
            .await;
        assert_matches!(at_expiry, Err(SessionRejection::Expired));

        let after = mgr
            .validate_at(Some(&payload(&token)), token.expiry_time_unix + 60)
            .await;
        assert_matches!(after, Err(SessionRejection::Expired));
    }

    #[tokio::test]
    async fn unknown_session_id_rejected() {
        let mgr = manager();
        let token = SessionToken {
            sess_id: 12345,
            expiry_time_unix: NOW + DAY,
            user_id: 1,
        };
        let result = mgr.validate_at(Some(&payload(&token)), NOW).await;
        assert_matches!(result, Err(SessionRejection::NotFound));
    }

    #[tokio::test]
    async fn tampered_user_id_rejected() {
        let mgr = manager();
        let mut token = mgr.issue_at(42, NOW).await.unwrap();
        token.user_id = 1;

        let result = mgr.validate_at(Some(&payload(&token)), NOW).await;
        assert_matches!(result, Err(SessionRejection::Mismatched { field: "userId" }));
    }

    #[tokio::test]
    async fn extended_expiry_rejected() {
        let mgr = manager();
        let mut token = mgr.issue_at(42, NOW).await.unwrap();
        token.expiry_time_unix += 365 * DAY;

        let result = mgr.validate_at(Some(&payload(&token)), NOW).await;
        assert_matches!(
            result,
            Err(SessionRejection::Mismatched {
                field: "expiryTimeUnix"
            })
        );
    }

    #[tokio::test]
    async fn absent_and_malformed_payloads() {
        let mgr = manager();

        assert_matches!(mgr.validate_at(None, NOW).await, Err(SessionRejection::Absent));
        assert_matches!(
            mgr.validate_at(Some(""), NOW).await,
            Err(SessionRejection::Absent)
        );

        for raw in [
            "not json",
            r#"{"sessId":1,"expiryTimeUnix":2}"#,
            r#"{"sessId":"1","expiryTimeUnix":2,"userId":3}"#,
            r#"{"sessId":1.5,"expiryTimeUnix":2,"userId":3}"#,
            r#"[1,2,3]"#,
        ] {
            assert_matches!(
                mgr.validate_at(Some(raw), NOW).await,
                Err(SessionRejection::Malformed(_)),
                "payload {raw}"
            );
        }
    }

    #[tokio::test]
    async fn store_failure_rejects() {
        let mgr = SessionManager::new(
            MemorySessions {
                offline: true,
                ..Default::default()
            },
            DAY,
        );
        let token = SessionToken {
            sess_id: 1,
            expiry_time_unix: NOW + DAY,
            user_id: 1,
        };
        let result = mgr.validate_at(Some(&payload(&token)), NOW).await;
        assert_matches!(result, Err(SessionRejection::StoreUnavailable(_)));
    }

    #[test]
    fn rejection_collapses_to_unauthenticated() {
        let err: CoreError = SessionRejection::Expired.into();
        assert_matches!(err, CoreError::Unauthenticated(msg) if msg == "session expired");
    }

    // -- Logout / resolve --------------------------------------------------

    #[tokio::test]
    async fn revoked_session_no_longer_validates() {
        let mgr = manager();
        let token = mgr.issue_at(42, NOW).await.unwrap();
        let raw = payload(&token);

        assert!(mgr.validate_at(Some(&raw), NOW).await.is_ok());
        mgr.revoke(&token).await.unwrap();
        assert_matches!(
            mgr.validate_at(Some(&raw), NOW).await,
            Err(SessionRejection::NotFound)
        );

        // A second logout is harmless.
        mgr.revoke(&token).await.unwrap();
    }

    #[tokio::test]
    async fn resolve_reports_each_state() {
        let mgr = manager();
        assert_eq!(mgr.resolve(None).await, SessionState::Anonymous);

        let token = mgr.issue(9).await.unwrap();
        let state = mgr.resolve(Some(&payload(&token))).await;
        assert_matches!(state, SessionState::Authenticated(r) if r.user_id == 9);

        mgr.revoke(&token).await.unwrap();
        let state = mgr.resolve(Some(&payload(&token))).await;
        assert_eq!(state, SessionState::Invalidated(SessionRejection::NotFound));
        assert_eq!(state.as_str(), "invalidated");
    }

    #[tokio::test]
    async fn purge_removes_only_expired_records() {
        let store = MemorySessions::default();
        let live = SessionRecord::new(1, 1, DAY, now_unix());
        let dead = SessionRecord::new(2, 1, -DAY, now_unix());
        store.create(&live).await.unwrap();
        store.create(&dead).await.unwrap();

        let mgr = SessionManager::new(store, DAY);
        assert_eq!(mgr.purge_expired().await.unwrap(), 1);
        assert!(mgr.store().rows.lock().unwrap().contains_key(&1));
    }

    #[test]
    fn token_payload_uses_cookie_field_names() {
        let token = SessionToken {
            sess_id: 1,
            expiry_time_unix: 2,
            user_id: 3,
        };
        let json: serde_json::Value = serde_json::from_str(&payload(&token)).unwrap();
        assert_eq!(json["sessId"], 1);
        assert_eq!(json["expiryTimeUnix"], 2);
        assert_eq!(json["userId"], 3);
    }
}
