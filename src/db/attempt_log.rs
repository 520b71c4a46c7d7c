use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{AttemptLog, NewAttemptLog};

pub async fn create(pool: &PgPool, attempt: &NewAttemptLog) -> Result<AttemptLog, sqlx::Error> {
    sqlx::query_as::<_, AttemptLog>(
        "INSERT INTO attempt_log (submission_id, url, method, status, success, error, attempted_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(attempt.submission_id)
    .bind(&attempt.url)
    .bind(&attempt.method)
    .bind(attempt.status.map(i32::from))
    .bind(attempt.success)
    .bind(&attempt.error)
    .bind(attempt.attempted_at)
    .fetch_one(pool)
    .await
}

pub async fn list_by_submission(
    pool: &PgPool,
    submission_id: Uuid,
) -> Result<Vec<AttemptLog>, sqlx::Error> {
    sqlx::query_as::<_, AttemptLog>(
        "SELECT * FROM attempt_log WHERE submission_id = $1 ORDER BY attempted_at ASC",
    )
    .bind(submission_id)
    .fetch_all(pool)
    .await
}

/// Retention sweep: drop every entry attempted before `cutoff`.
pub async fn delete_before(pool: &PgPool, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM attempt_log WHERE attempted_at < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
