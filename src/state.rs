use std::sync::Arc;

use crate::actions::{ActionRouter, WebhookDelivery};
use crate::config::Config;
use crate::dispatch::DispatchEngine;
use crate::store::Store;
use crate::worker::{JobQueue, JobReceiver};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
    pub engine: DispatchEngine,
    pub jobs: JobQueue,
}

impl AppState {
    /// Wire the dispatch engine to the store. The returned receiver feeds the worker pool.
    pub fn new(store: Arc<dyn Store>, config: Config) -> Result<(SharedState, JobReceiver), String> {
        let delivery = WebhookDelivery::new(
            store.clone(),
            config.webhook.retry_policy(),
            config.webhook.timeout,
        )
        .map_err(|e| format!("Failed to build webhook client: {e}"))?;

        let engine = DispatchEngine::new(store.clone(), ActionRouter::new(delivery));
        let (jobs, receiver) = JobQueue::channel(config.queue_capacity);

        let state = Arc::new(AppState {
            store,
            config,
            engine,
            jobs,
        });

        Ok((state, receiver))
    }
}
