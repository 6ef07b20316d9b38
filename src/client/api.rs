use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::error;

use crate::models::{HealthReport, NewTaskRequest, Task, UpdateTaskRequest};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("HTTP error: {}", .0.as_u16())]
    Status(StatusCode),

    #[error("Invalid response body: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("Missing response body")]
    EmptyBody,
}

/// Coarse classification used to pick a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Server,
    Other,
}

impl ClientError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ClientError::Network(_) => ErrorCategory::Network,
            ClientError::Status(status) if status.is_server_error() => ErrorCategory::Server,
            _ => ErrorCategory::Other,
        }
    }
}

#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<Task>, ClientError>;
    async fn create_task(&self, title: &str) -> Result<Task, ClientError>;
    async fn update_task(&self, id: i64, changes: &UpdateTaskRequest) -> Result<Task, ClientError>;
    async fn delete_task(&self, id: i64) -> Result<(), ClientError>;
    async fn health(&self) -> Result<HealthReport, ClientError>;
}

pub struct HttpTaskApi {
    client: Client,
    base_url: String,
}

impl HttpTaskApi {
    /// `base_url` is the prefix the task routes hang off, e.g.
    /// `http://localhost:8080/api` behind a proxy or the server origin itself.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder().build().map_err(ClientError::Network)?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    async fn request<B, T>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<Option<T>, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut builder = self.client.request(method, &url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            error!("API error: {}", e);
            ClientError::Network(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("API error: {} returned {}", url, status);
            return Err(ClientError::Status(status));
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        response.json::<T>().await.map(Some).map_err(ClientError::Decode)
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
        self.request::<(), _>(Method::GET, "/tasks", None)
            .await?
            .ok_or(ClientError::EmptyBody)
    }

    async fn create_task(&self, title: &str) -> Result<Task, ClientError> {
        let body = NewTaskRequest {
            title: Some(title.to_string()),
        };
        self.request(Method::POST, "/tasks", Some(&body))
            .await?
            .ok_or(ClientError::EmptyBody)
    }

    async fn update_task(&self, id: i64, changes: &UpdateTaskRequest) -> Result<Task, ClientError> {
        self.request(Method::PUT, &format!("/tasks/{}", id), Some(changes))
            .await?
            .ok_or(ClientError::EmptyBody)
    }

    async fn delete_task(&self, id: i64) -> Result<(), ClientError> {
        self.request::<(), serde_json::Value>(Method::DELETE, &format!("/tasks/{}", id), None)
            .await?;
        Ok(())
    }

    async fn health(&self) -> Result<HealthReport, ClientError> {
        self.request::<(), _>(Method::GET, "/health", None)
            .await?
            .ok_or(ClientError::EmptyBody)
    }
}
