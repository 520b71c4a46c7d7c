use std::collections::HashSet;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::dispatch::DispatchRequest;
use crate::state::SharedState;

/// Trigger for one dispatch run. Delivered at least once per submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchJob {
    pub submission_id: Uuid,
}

pub type JobReceiver = mpsc::Receiver<DispatchJob>;

#[derive(Debug)]
pub enum EnqueueError {
    /// The queue is at capacity. The submission stays unprocessed until a requeue pass.
    Full(Uuid),
    Closed(Uuid),
}

impl std::fmt::Display for EnqueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnqueueError::Full(id) => write!(f, "Dispatch queue full, submission {id} not queued"),
            EnqueueError::Closed(id) => {
                write!(f, "Dispatch queue closed, submission {id} not queued")
            }
        }
    }
}

impl std::error::Error for EnqueueError {}

/// Bounded job queue that tracks which submissions are queued or running, so a submission
/// is never handed to two workers at once.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<DispatchJob>,
    pending: Arc<std::sync::Mutex<HashSet<Uuid>>>,
}

impl JobQueue {
    pub fn channel(capacity: usize) -> (Self, JobReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let queue = Self {
            tx,
            pending: Arc::default(),
        };
        (queue, rx)
    }

    /// Never waits for room. Returns `Ok(false)` when the submission is already queued or
    /// being dispatched.
    pub fn enqueue(&self, job: DispatchJob) -> Result<bool, EnqueueError> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if !pending.insert(job.submission_id) {
            return Ok(false);
        }

        match self.tx.try_send(job) {
            Ok(()) => Ok(true),
            Err(e) => {
                pending.remove(&job.submission_id);
                Err(match e {
                    TrySendError::Full(_) => EnqueueError::Full(job.submission_id),
                    TrySendError::Closed(_) => EnqueueError::Closed(job.submission_id),
                })
            }
        }
    }

    /// Release a submission once its dispatch run is over.
    pub fn finish(&self, submission_id: Uuid) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&submission_id);
    }
}

/// Spawn `worker_count` workers on the current runtime, all pulling from one queue.
pub fn run_pool(
    state: SharedState,
    jobs: JobReceiver,
    shutdown: watch::Receiver<bool>,
    worker_count: usize,
) -> Vec<JoinHandle<()>> {
    let jobs = Arc::new(Mutex::new(jobs));

    let handles = (0..worker_count.max(1))
        .map(|id| tokio::spawn(run(id, state.clone(), jobs.clone(), shutdown.clone())))
        .collect();

    tracing::info!("Dispatch worker pool started ({worker_count} workers)");
    handles
}

/// A single worker loop. Finishes the job in hand before honouring shutdown.
async fn run(
    id: usize,
    state: SharedState,
    jobs: Arc<Mutex<JobReceiver>>,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::debug!("Worker {id} started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let job = {
            let mut rx = jobs.lock().await;
            tokio::select! {
                job = rx.recv() => job,
                _ = shutdown.changed() => None,
            }
        };

        let Some(job) = job else { break };

        if let Err(e) = process(&state, job).await {
            tracing::error!("Worker {id} error: {e}");
        }
        state.jobs.finish(job.submission_id);
    }

    tracing::debug!("Worker {id} stopped");
}

/// Load the submission and its form's actions, then hand both to the engine.
pub async fn process(state: &SharedState, job: DispatchJob) -> Result<(), String> {
    let submission = state
        .store
        .find_submission(job.submission_id)
        .await
        .map_err(|e| format!("Failed to load submission: {e}"))?;

    let submission = match submission {
        Some(s) => s,
        None => {
            tracing::debug!("Submission {} gone before dispatch", job.submission_id);
            return Ok(());
        }
    };

    if submission.processed {
        tracing::debug!("Submission {} already processed", submission.id);
        return Ok(());
    }

    let form = state
        .store
        .find_form(submission.form_id)
        .await
        .map_err(|e| format!("Failed to load form: {e}"))?;

    let actions = form.map(|f| f.actions).unwrap_or_default();

    tracing::debug!(
        "Dispatching submission {} ({} actions)",
        submission.id,
        actions.len()
    );

    let request = DispatchRequest {
        submission_id: submission.id,
        actions,
        payload: submission.payload,
        title: submission.title,
    };

    state
        .engine
        .dispatch(&request)
        .await
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// Queue every submission that was recorded but never finished: left over from a restart,
/// or turned away by a full queue at intake. Stops early when the queue fills up.
pub async fn requeue_unprocessed(state: &SharedState) -> Result<usize, String> {
    let unprocessed = state
        .store
        .list_unprocessed()
        .await
        .map_err(|e| format!("Failed to list unprocessed submissions: {e}"))?;

    let mut queued = 0;
    for submission in unprocessed {
        let job = DispatchJob {
            submission_id: submission.id,
        };
        match state.jobs.enqueue(job) {
            Ok(true) => queued += 1,
            Ok(false) => {}
            Err(EnqueueError::Full(_)) => {
                tracing::debug!("Dispatch queue full, deferring the rest to the next pass");
                break;
            }
            Err(e) => return Err(e.to_string()),
        }
    }

    if queued > 0 {
        tracing::info!("Re-queued {queued} unprocessed submissions");
    }
    Ok(queued)
}

/// Run [`requeue_unprocessed`] every `interval` until shutdown. The first pass waits one
/// interval; start-up recovery is the caller's job.
pub fn spawn_requeuer(
    state: SharedState,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            if *shutdown.borrow() {
                break;
            }

            if let Err(e) = requeue_unprocessed(&state).await {
                tracing::error!("Requeue pass failed: {e}");
            }
        }

        tracing::debug!("Requeuer stopped");
    })
}
