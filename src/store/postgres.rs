use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::db;
use crate::models::{Action, AttemptLog, Form, NewAttemptLog, Submission};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_form(&self, title: &str, actions: &[Action]) -> Result<Form, StoreError> {
        Ok(db::forms::create(&self.pool, title, actions).await?)
    }

    async fn find_form(&self, id: Uuid) -> Result<Option<Form>, StoreError> {
        Ok(db::forms::find_by_id(&self.pool, id).await?)
    }

    async fn list_forms(&self) -> Result<Vec<Form>, StoreError> {
        Ok(db::forms::list(&self.pool).await?)
    }

    async fn update_form(
        &self,
        id: Uuid,
        title: &str,
        actions: &[Action],
    ) -> Result<Option<Form>, StoreError> {
        Ok(db::forms::update(&self.pool, id, title, actions).await?)
    }

    async fn delete_form(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(db::forms::delete(&self.pool, id).await?)
    }

    async fn create_submission(
        &self,
        form_id: Uuid,
        title: &str,
        payload: &serde_json::Value,
    ) -> Result<Submission, StoreError> {
        Ok(db::submissions::create(&self.pool, form_id, title, payload).await?)
    }

    async fn find_submission(&self, id: Uuid) -> Result<Option<Submission>, StoreError> {
        Ok(db::submissions::find_by_id(&self.pool, id).await?)
    }

    async fn list_submissions(
        &self,
        form_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Submission>, StoreError> {
        Ok(db::submissions::list_by_form(&self.pool, form_id, limit, offset).await?)
    }

    async fn count_submissions(&self, form_id: Uuid) -> Result<i64, StoreError> {
        Ok(db::submissions::count_by_form(&self.pool, form_id).await?)
    }

    async fn list_unprocessed(&self) -> Result<Vec<Submission>, StoreError> {
        Ok(db::submissions::list_unprocessed(&self.pool).await?)
    }

    async fn mark_processed(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(db::submissions::mark_processed(&self.pool, id).await?)
    }

    async fn delete_submission(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(db::submissions::delete(&self.pool, id).await?)
    }

    async fn append_attempt(&self, attempt: &NewAttemptLog) -> Result<AttemptLog, StoreError> {
        Ok(db::attempt_log::create(&self.pool, attempt).await?)
    }

    async fn list_attempts(&self, submission_id: Uuid) -> Result<Vec<AttemptLog>, StoreError> {
        Ok(db::attempt_log::list_by_submission(&self.pool, submission_id).await?)
    }

    async fn delete_attempts_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(db::attempt_log::delete_before(&self.pool, cutoff).await?)
    }
}
