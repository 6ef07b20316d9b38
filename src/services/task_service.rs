use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::db::repository;
use crate::error::AppError;
use crate::models::{NewTaskRequest, Task, UpdateTaskRequest};

pub const MAX_TITLE_LEN: usize = 255;

#[derive(Clone)]
pub struct TaskService {
    db: SqlitePool,
}

impl TaskService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<Task>, AppError> {
        let tasks = repository::fetch_tasks(&self.db).await?;
        debug!("listed {} tasks", tasks.len());
        Ok(tasks)
    }

    pub async fn create(&self, req: NewTaskRequest) -> Result<Task, AppError> {
        let title = req
            .title
            .as_deref()
            .map(normalize_title)
            .transpose()?
            .ok_or_else(|| AppError::validation("Title is required"))?;

        let task = repository::insert_task(&self.db, title).await?;
        info!("created task {}", task.id);
        Ok(task)
    }

    pub async fn update(&self, id: i64, req: UpdateTaskRequest) -> Result<Task, AppError> {
        if req.is_empty() {
            return Err(AppError::validation("Either completed or title is required"));
        }

        let title = req.title.as_deref().map(normalize_title).transpose()?;

        let task = repository::update_task(&self.db, id, title, req.completed)
            .await?
            .ok_or(AppError::NotFound)?;
        info!("updated task {}", task.id);
        Ok(task)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if repository::delete_task(&self.db, id).await? {
            info!("deleted task {}", id);
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }
}

fn normalize_title(raw: &str) -> Result<&str, AppError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::validation("Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::validation(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(title)
}
