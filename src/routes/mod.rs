pub mod forms;
pub mod ingest;
pub mod submissions;

use axum::body::Bytes;
use axum::routing::{get, post};
use axum::Router;
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Forms
        .route("/api/v1/forms", get(forms::list).post(forms::create))
        .route(
            "/api/v1/forms/{id}",
            get(forms::get).put(forms::update).delete(forms::delete),
        )
        // Submissions
        .route("/api/v1/forms/{id}/submissions", get(submissions::list))
        .route(
            "/api/v1/submissions/{id}",
            get(submissions::get).delete(submissions::delete),
        )
        .route("/api/v1/submissions/{id}/attempts", get(submissions::attempts))
}

pub fn ingest_routes() -> Router<SharedState> {
    Router::new().route("/v1/f/{form_id}", post(ingest::ingest))
}

/// Parse a JSON request body, answering 400 with our own error shape on failure.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))
}
