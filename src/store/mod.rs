//! Storage seam for forms, submissions and the attempt log.
//!
//! [`PgStore`] is the production backend. [`MemoryStore`] keeps everything in process and is
//! used when no database is configured and throughout the test suite.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Action, AttemptLog, Form, NewAttemptLog, Submission};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug)]
pub enum StoreError {
    Database(sqlx::Error),
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(err) => write!(f, "database error: {err}"),
            StoreError::Backend(msg) => write!(f, "storage error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(err) => Some(err),
            StoreError::Backend(_) => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err)
    }
}

/// Every call is its own atomic operation; nothing spans a whole dispatch.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_form(&self, title: &str, actions: &[Action]) -> Result<Form, StoreError>;
    async fn find_form(&self, id: Uuid) -> Result<Option<Form>, StoreError>;
    async fn list_forms(&self) -> Result<Vec<Form>, StoreError>;
    async fn update_form(
        &self,
        id: Uuid,
        title: &str,
        actions: &[Action],
    ) -> Result<Option<Form>, StoreError>;
    /// Removes the form with its submissions and their attempt logs.
    async fn delete_form(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn create_submission(
        &self,
        form_id: Uuid,
        title: &str,
        payload: &serde_json::Value,
    ) -> Result<Submission, StoreError>;
    async fn find_submission(&self, id: Uuid) -> Result<Option<Submission>, StoreError>;
    /// Newest first.
    async fn list_submissions(
        &self,
        form_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Submission>, StoreError>;
    async fn count_submissions(&self, form_id: Uuid) -> Result<i64, StoreError>;
    /// Oldest first.
    async fn list_unprocessed(&self) -> Result<Vec<Submission>, StoreError>;
    /// Returns false when the submission does not exist.
    async fn mark_processed(&self, id: Uuid) -> Result<bool, StoreError>;
    /// Removes the submission and every attempt log that references it.
    async fn delete_submission(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn append_attempt(&self, attempt: &NewAttemptLog) -> Result<AttemptLog, StoreError>;
    /// Oldest first.
    async fn list_attempts(&self, submission_id: Uuid) -> Result<Vec<AttemptLog>, StoreError>;
    async fn delete_attempts_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}
