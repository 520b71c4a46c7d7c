use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Action, Form};
use crate::state::SharedState;

use super::parse_json;

#[derive(Deserialize)]
pub struct FormRequest {
    pub title: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl FormRequest {
    fn parse(body: &Bytes) -> Result<Self, AppError> {
        let req: FormRequest = parse_json(body)?;
        if req.title.trim().is_empty() {
            return Err(AppError::BadRequest("title is required".to_string()));
        }
        Ok(req)
    }
}

pub async fn list(State(state): State<SharedState>) -> Result<Json<Vec<Form>>, AppError> {
    Ok(Json(state.store.list_forms().await?))
}

pub async fn create(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<Form>, AppError> {
    let req = FormRequest::parse(&body)?;
    let form = state.store.create_form(req.title.trim(), &req.actions).await?;
    tracing::info!("Form {} created with {} actions", form.id, form.actions.len());
    Ok(Json(form))
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Form>, AppError> {
    let form = state
        .store
        .find_form(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Form not found".to_string()))?;
    Ok(Json(form))
}

pub async fn update(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<Form>, AppError> {
    let req = FormRequest::parse(&body)?;
    let form = state
        .store
        .update_form(id, req.title.trim(), &req.actions)
        .await?
        .ok_or_else(|| AppError::NotFound("Form not found".to_string()))?;
    Ok(Json(form))
}

pub async fn delete(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.store.delete_form(id).await? {
        return Err(AppError::NotFound("Form not found".to_string()));
    }
    tracing::info!("Form {id} deleted");
    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
