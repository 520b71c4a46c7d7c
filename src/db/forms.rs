use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Action, Form};

pub async fn create(pool: &PgPool, title: &str, actions: &[Action]) -> Result<Form, sqlx::Error> {
    sqlx::query_as::<_, Form>(
        "INSERT INTO forms (title, actions) VALUES ($1, $2) RETURNING *",
    )
    .bind(title)
    .bind(Json(actions))
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Form>, sqlx::Error> {
    sqlx::query_as::<_, Form>("SELECT * FROM forms WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list(pool: &PgPool) -> Result<Vec<Form>, sqlx::Error> {
    sqlx::query_as::<_, Form>("SELECT * FROM forms ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    title: &str,
    actions: &[Action],
) -> Result<Option<Form>, sqlx::Error> {
    sqlx::query_as::<_, Form>(
        "UPDATE forms SET title = $2, actions = $3, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(title)
    .bind(Json(actions))
    .fetch_optional(pool)
    .await
}

/// Deleting a form cascades to its submissions and their attempt logs.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM forms WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
