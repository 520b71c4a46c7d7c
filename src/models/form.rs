use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Action;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Form {
    pub id: Uuid,
    pub title: String,
    #[sqlx(json)]
    pub actions: Vec<Action>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
