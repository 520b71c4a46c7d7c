use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One webhook delivery attempt, successful or not.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AttemptLog {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub url: String,
    pub method: String,
    pub status: Option<i32>,
    pub success: bool,
    pub error: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAttemptLog {
    pub submission_id: Uuid,
    pub url: String,
    pub method: String,
    pub status: Option<u16>,
    pub success: bool,
    pub error: Option<String>,
    pub attempted_at: DateTime<Utc>,
}
