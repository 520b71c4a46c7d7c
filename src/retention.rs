use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::store::{Store, StoreError};

/// Delete every attempt log older than `max_age`. Returns the number removed.
pub async fn sweep(store: &dyn Store, max_age: chrono::Duration) -> Result<u64, StoreError> {
    let cutoff = Utc::now() - max_age;
    let removed = store.delete_attempts_before(cutoff).await?;
    if removed > 0 {
        tracing::info!("Retention sweep removed {removed} attempt logs older than {cutoff}");
    }
    Ok(removed)
}

/// Run [`sweep`] immediately and then every `interval` until shutdown.
pub fn spawn_sweeper(
    store: Arc<dyn Store>,
    max_age: chrono::Duration,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            if *shutdown.borrow() {
                break;
            }

            if let Err(e) = sweep(store.as_ref(), max_age).await {
                tracing::error!("Retention sweep failed: {e}");
            }
        }

        tracing::debug!("Retention sweeper stopped");
    })
}
