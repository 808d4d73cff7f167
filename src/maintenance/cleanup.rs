use chrono::Utc;
use tokio::time::{Duration, sleep};
use tracing::info;

use crate::web::AppState;

const CLEANUP_INTERVAL_MINUTES: u64 = 5;

/// Periodically drops expired sessions and stale rate-limit history.
pub fn spawn(state: AppState) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(CLEANUP_INTERVAL_MINUTES * 60);
        loop {
            sleep(interval).await;
            run_cleanup_cycle(&state).await;
        }
    });
}

pub async fn run_cleanup_cycle(state: &AppState) -> (usize, usize) {
    let now = Utc::now();

    let sessions_removed = state.write().await.sessions.purge_expired(now);
    let filter_keys_removed = state.filter().lock().await.prune(now);

    if sessions_removed > 0 || filter_keys_removed > 0 {
        info!(sessions_removed, filter_keys_removed, "in-memory cleanup completed");
    }

    (sessions_removed, filter_keys_removed)
}
