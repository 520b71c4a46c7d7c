use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::{Action, AttemptLog, Form, NewAttemptLog, Submission};

/// In-process store. Mirrors the cascade rules of the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    forms: HashMap<Uuid, Form>,
    submissions: HashMap<Uuid, Submission>,
    attempts: Vec<AttemptLog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn remove_submission(&mut self, id: Uuid) -> bool {
        self.attempts.retain(|a| a.submission_id != id);
        self.submissions.remove(&id).is_some()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_form(&self, title: &str, actions: &[Action]) -> Result<Form, StoreError> {
        let now = Utc::now();
        let form = Form {
            id: Uuid::now_v7(),
            title: title.to_string(),
            actions: actions.to_vec(),
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.forms.insert(form.id, form.clone());
        Ok(form)
    }

    async fn find_form(&self, id: Uuid) -> Result<Option<Form>, StoreError> {
        Ok(self.inner.read().await.forms.get(&id).cloned())
    }

    async fn list_forms(&self) -> Result<Vec<Form>, StoreError> {
        let mut forms: Vec<Form> = self.inner.read().await.forms.values().cloned().collect();
        forms.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(forms)
    }

    async fn update_form(
        &self,
        id: Uuid,
        title: &str,
        actions: &[Action],
    ) -> Result<Option<Form>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.forms.get_mut(&id).map(|form| {
            form.title = title.to_string();
            form.actions = actions.to_vec();
            form.updated_at = Utc::now();
            form.clone()
        }))
    }

    async fn delete_form(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.forms.remove(&id).is_none() {
            return Ok(false);
        }
        let orphaned: Vec<Uuid> = inner
            .submissions
            .values()
            .filter(|s| s.form_id == id)
            .map(|s| s.id)
            .collect();
        for submission_id in orphaned {
            inner.remove_submission(submission_id);
        }
        Ok(true)
    }

    async fn create_submission(
        &self,
        form_id: Uuid,
        title: &str,
        payload: &serde_json::Value,
    ) -> Result<Submission, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.forms.contains_key(&form_id) {
            return Err(StoreError::Backend(format!("form {form_id} does not exist")));
        }
        let submission = Submission {
            id: Uuid::now_v7(),
            form_id,
            title: title.to_string(),
            payload: payload.clone(),
            submitted_at: Utc::now(),
            processed: false,
        };
        inner.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn find_submission(&self, id: Uuid) -> Result<Option<Submission>, StoreError> {
        Ok(self.inner.read().await.submissions.get(&id).cloned())
    }

    async fn list_submissions(
        &self,
        form_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Submission>, StoreError> {
        let inner = self.inner.read().await;
        let mut submissions: Vec<Submission> = inner
            .submissions
            .values()
            .filter(|s| s.form_id == form_id)
            .cloned()
            .collect();
        submissions.sort_by(|a, b| (b.submitted_at, b.id).cmp(&(a.submitted_at, a.id)));
        Ok(submissions
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_submissions(&self, form_id: Uuid) -> Result<i64, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .submissions
            .values()
            .filter(|s| s.form_id == form_id)
            .count() as i64)
    }

    async fn list_unprocessed(&self) -> Result<Vec<Submission>, StoreError> {
        let inner = self.inner.read().await;
        let mut pending: Vec<Submission> = inner
            .submissions
            .values()
            .filter(|s| !s.processed)
            .cloned()
            .collect();
        pending.sort_by(|a, b| (a.submitted_at, a.id).cmp(&(b.submitted_at, b.id)));
        Ok(pending)
    }

    async fn mark_processed(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(match inner.submissions.get_mut(&id) {
            Some(submission) => {
                submission.processed = true;
                true
            }
            None => false,
        })
    }

    async fn delete_submission(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.remove_submission(id))
    }

    async fn append_attempt(&self, attempt: &NewAttemptLog) -> Result<AttemptLog, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.submissions.contains_key(&attempt.submission_id) {
            return Err(StoreError::Backend(format!(
                "submission {} does not exist",
                attempt.submission_id
            )));
        }
        let log = AttemptLog {
            id: Uuid::now_v7(),
            submission_id: attempt.submission_id,
            url: attempt.url.clone(),
            method: attempt.method.clone(),
            status: attempt.status.map(i32::from),
            success: attempt.success,
            error: attempt.error.clone(),
            attempted_at: attempt.attempted_at,
        };
        inner.attempts.push(log.clone());
        Ok(log)
    }

    async fn list_attempts(&self, submission_id: Uuid) -> Result<Vec<AttemptLog>, StoreError> {
        let inner = self.inner.read().await;
        let mut attempts: Vec<AttemptLog> = inner
            .attempts
            .iter()
            .filter(|a| a.submission_id == submission_id)
            .cloned()
            .collect();
        attempts.sort_by_key(|a| a.attempted_at);
        Ok(attempts)
    }

    async fn delete_attempts_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.attempts.len();
        inner.attempts.retain(|a| a.attempted_at >= cutoff);
        Ok((before - inner.attempts.len()) as u64)
    }
}
