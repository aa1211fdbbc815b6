//! Background maintenance tasks.
//!
//! Expired sessions are rejected on read and otherwise left in place; this
//! task deletes them periodically so the table does not grow without bound.

use drive_school::auth::SessionManager;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::metrics;

/// Spawn a task that purges expired sessions every `interval`.
///
/// The first purge happens one full interval after startup. Failures are
/// logged and the loop keeps going.
pub fn spawn_session_purger(sessions: SessionManager, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match sessions.purge_expired().await {
                Ok(0) => tracing::debug!("No expired sessions to purge"),
                Ok(purged) => {
                    metrics::sessions_purged_total(purged);
                    tracing::info!(purged = purged, "Purged expired sessions");
                }
                Err(e) => tracing::warn!("Expired session purge failed: {}", e),
            }
        }
    })
}
