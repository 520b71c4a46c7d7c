use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Submission;

pub async fn create(
    pool: &PgPool,
    form_id: Uuid,
    title: &str,
    payload: &serde_json::Value,
) -> Result<Submission, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        "INSERT INTO submissions (form_id, title, payload)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(form_id)
    .bind(title)
    .bind(payload)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>("SELECT * FROM submissions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_by_form(
    pool: &PgPool,
    form_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        "SELECT * FROM submissions WHERE form_id = $1
         ORDER BY submitted_at DESC, id DESC LIMIT $2 OFFSET $3",
    )
    .bind(form_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_by_form(pool: &PgPool, form_id: Uuid) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM submissions WHERE form_id = $1")
        .bind(form_id)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

pub async fn list_unprocessed(pool: &PgPool) -> Result<Vec<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        "SELECT * FROM submissions WHERE NOT processed ORDER BY submitted_at ASC",
    )
    .fetch_all(pool)
    .await
}

/// Flip `processed` to true. Returns false if the submission no longer exists.
pub async fn mark_processed(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE submissions SET processed = true WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Remove a submission together with its attempt trail.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM attempt_log WHERE submission_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM submissions WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}
