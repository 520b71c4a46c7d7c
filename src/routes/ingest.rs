use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::actions::router::directives;
use crate::error::AppError;
use crate::state::SharedState;
use crate::worker::{DispatchJob, EnqueueError};

use super::parse_json;

/// Record a submission and schedule its dispatch. Returns immediately with the form's
/// client-side directives; webhooks run in the background.
pub async fn ingest(
    State(state): State<SharedState>,
    Path(form_id): Path<Uuid>,
    body: Bytes,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let payload: serde_json::Value = parse_json(&body)?;
    if !payload.is_object() {
        return Err(AppError::BadRequest(
            "Submission body must be a JSON object".to_string(),
        ));
    }

    let form = state
        .store
        .find_form(form_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Form not found".to_string()))?;

    let submission = state
        .store
        .create_submission(form.id, &form.title, &payload)
        .await?;

    let job = DispatchJob {
        submission_id: submission.id,
    };
    match state.jobs.enqueue(job) {
        Ok(_) => {}
        Err(EnqueueError::Full(id)) => {
            tracing::warn!("Dispatch queue full, submission {id} left for the next requeue pass");
        }
        Err(e) => tracing::error!("{e}"),
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "created",
            "submission_id": submission.id,
            "directives": directives(&form.actions),
        })),
    ))
}
