use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{AttemptLog, Submission};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn list(
    State(state): State<SharedState>,
    Path(form_id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .store
        .find_form(form_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Form not found".to_string()))?;

    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);
    let offset = page.saturating_sub(1).saturating_mul(per_page);

    let submissions = state.store.list_submissions(form_id, per_page, offset).await?;
    let total = state.store.count_submissions(form_id).await?;

    Ok(Json(serde_json::json!({
        "submissions": submissions,
        "total": total,
        "page": page,
        "per_page": per_page,
        "total_pages": (total + per_page - 1) / per_page,
    })))
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Submission>, AppError> {
    let submission = state
        .store
        .find_submission(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;
    Ok(Json(submission))
}

pub async fn delete(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.store.delete_submission(id).await? {
        return Err(AppError::NotFound("Submission not found".to_string()));
    }
    tracing::info!("Submission {id} deleted with its attempt log");
    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

pub async fn attempts(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AttemptLog>>, AppError> {
    state
        .store
        .find_submission(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;
    Ok(Json(state.store.list_attempts(id).await?))
}
