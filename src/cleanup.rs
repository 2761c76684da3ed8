//! Scheduled cleanup of expired web sessions.

use std::time::Duration;
use tracing::{debug, info};

use crate::web::SessionStore;

/// Interval between cleanup runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60); // 1 hour

/// Run all cleanup tasks once. Returns the number of sessions removed.
pub async fn run_cleanup(sessions: &SessionStore) -> usize {
    let count = sessions.prune_expired().await;
    if count > 0 {
        info!("Cleaned up {} expired sessions", count);
    } else {
        debug!("No expired sessions to clean up");
    }
    count
}

/// Spawn a background task that runs cleanup periodically.
/// Returns a handle that can be used to abort the task.
pub fn spawn_cleanup_scheduler(sessions: SessionStore) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

        loop {
            interval.tick().await;
            run_cleanup(&sessions).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_cleanup_removes_expired() {
        let expired = SessionStore::new(Duration::ZERO);
        expired.create(1, "10.0.0.1").await;
        assert_eq!(run_cleanup(&expired).await, 1);

        let live = SessionStore::default();
        live.create(1, "10.0.0.1").await;
        assert_eq!(run_cleanup(&live).await, 0);
        assert_eq!(live.len().await, 1);
    }
}
