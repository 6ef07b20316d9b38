use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::Task;

pub async fn fetch_tasks(db: &SqlitePool) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        r#"
        SELECT id, title, completed, created_at
        FROM tasks
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn insert_task(db: &SqlitePool, title: &str) -> Result<Task, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, Task>(
        r#"
        INSERT INTO tasks (title, completed, created_at)
        VALUES (?1, 0, ?2)
        RETURNING id, title, completed, created_at
        "#,
    )
    .bind(title)
    .bind(now)
    .fetch_one(db)
    .await
}

/// Writes whichever of `title` / `completed` is `Some` in one statement.
/// Returns `None` when no row has the given id.
pub async fn update_task(
    db: &SqlitePool,
    id: i64,
    title: Option<&str>,
    completed: Option<bool>,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        r#"
        UPDATE tasks
        SET title = COALESCE(?1, title),
            completed = COALESCE(?2, completed)
        WHERE id = ?3
        RETURNING id, title, completed, created_at
        "#,
    )
    .bind(title)
    .bind(completed)
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn delete_task(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn ping(db: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("select 1").execute(db).await?;
    Ok(())
}
