//! The dispatch engine: runs every action configured for one submission, then marks the
//! submission processed.
//!
//! Actions run strictly one after another in configured order, so each webhook finishes its
//! retries before the next action starts. Individual failures never stop the walk and never
//! fail the invocation; they live in the returned results and in the attempt log. The only
//! error this engine returns is a failure to mark the submission processed.
//!
//! Invocation is idempotent. A submission that is already processed (or no longer exists)
//! is left alone, which makes at-least-once triggering safe.

use std::sync::Arc;

use uuid::Uuid;

use crate::actions::{ActionResult, ActionRouter, SubmissionContext};
use crate::models::Action;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub submission_id: Uuid,
    pub actions: Vec<Action>,
    pub payload: serde_json::Value,
    pub title: String,
}

#[derive(Debug)]
pub enum DispatchError {
    /// The submission could not be marked processed and would be left unprocessed.
    Finalize {
        submission_id: Uuid,
        source: StoreError,
    },
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::Finalize {
                submission_id,
                source,
            } => write!(f, "failed to mark submission {submission_id} processed: {source}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Finalize { source, .. } => Some(source),
        }
    }
}

pub struct DispatchEngine {
    store: Arc<dyn Store>,
    router: ActionRouter,
}

impl DispatchEngine {
    pub fn new(store: Arc<dyn Store>, router: ActionRouter) -> Self {
        Self { store, router }
    }

    pub async fn dispatch(
        &self,
        request: &DispatchRequest,
    ) -> Result<Vec<ActionResult>, DispatchError> {
        let submission_id = request.submission_id;

        match self.store.find_submission(submission_id).await {
            Ok(Some(submission)) if submission.processed => {
                tracing::debug!("Submission {submission_id} already processed, nothing to do");
                return Ok(Vec::new());
            }
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::warn!("Submission {submission_id} no longer exists, skipping dispatch");
                return Ok(Vec::new());
            }
            Err(e) => {
                tracing::warn!("Could not check state of submission {submission_id}: {e}");
            }
        }

        if !request.actions.iter().any(|action| action.enabled) {
            self.finalize(submission_id).await?;
            return Ok(Vec::new());
        }

        let ctx = SubmissionContext {
            submission_id,
            title: &request.title,
            payload: &request.payload,
        };

        let mut results = Vec::with_capacity(request.actions.len());
        for action in &request.actions {
            if let Some(result) = self.router.route(&ctx, action).await {
                results.push(result);
            }
        }

        let failed = results.iter().filter(|r| !r.success).count();
        if failed > 0 {
            tracing::warn!(
                "Submission {submission_id}: {failed} of {} actions failed",
                results.len()
            );
        } else {
            tracing::info!(
                "Submission {submission_id}: {} actions completed",
                results.len()
            );
        }

        self.finalize(submission_id).await?;
        Ok(results)
    }

    async fn finalize(&self, submission_id: Uuid) -> Result<(), DispatchError> {
        match self.store.mark_processed(submission_id).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::warn!("Submission {submission_id} was deleted during dispatch");
                Ok(())
            }
            Err(source) => Err(DispatchError::Finalize {
                submission_id,
                source,
            }),
        }
    }
}
