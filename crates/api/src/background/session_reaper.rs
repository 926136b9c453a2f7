//! Periodic deletion of expired session records.
//!
//! Validation already rejects expired sessions; this job only keeps the
//! `sessions` table from growing without bound.

use std::sync::Arc;
use std::time::Duration;

use shortlink_core::session::{SessionManager, SessionStore};
use tokio_util::sync::CancellationToken;

/// Run one purge pass and log the outcome. Returns the number removed.
pub async fn purge_once<S: SessionStore>(sessions: &SessionManager<S>) -> u64 {
    match sessions.purge_expired().await {
        Ok(deleted) => {
            if deleted > 0 {
                tracing::info!(deleted, "Session reaper: purged expired sessions");
            } else {
                tracing::debug!("Session reaper: nothing to purge");
            }
            deleted
        }
        Err(e) => {
            tracing::error!(error = %e, "Session reaper: purge failed");
            0
        }
    }
}

/// Run the reaper loop until `cancel` is triggered.
///
/// The first pass runs immediately on start.
pub async fn run<S: SessionStore>(
    sessions: Arc<SessionManager<S>>,
    every: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = every.as_secs(), "Session reaper started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session reaper stopping");
                break;
            }
            _ = interval.tick() => {
                purge_once(&sessions).await;
            }
        }
    }
}
