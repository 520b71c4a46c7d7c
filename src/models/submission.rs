use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub form_id: Uuid,
    /// Form title captured at intake.
    pub title: String,
    pub payload: serde_json::Value,
    pub submitted_at: DateTime<Utc>,
    pub processed: bool,
}
