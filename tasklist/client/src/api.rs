//! HTTP access to the task endpoints.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tasklist_core::{NewTask, Task, TaskId, TaskPatch};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a usable response.
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The configured server address cannot carry API paths.
    #[error("Invalid server URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    /// The server answered with a non-success status.
    #[error("Server responded {status}: {message}")]
    Status { status: StatusCode, message: String },
}

/// Remote task collection as seen by the client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Task>, ApiError>;

    async fn add(&self, new_task: &NewTask) -> Result<Task, ApiError>;

    async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, ApiError>;

    async fn delete(&self, id: &TaskId) -> Result<(), ApiError>;

    async fn delete_all(&self) -> Result<(), ApiError>;
}

/// [`TaskApi`] over HTTP against `{base_url}/api/tasks`.
#[derive(Clone, Debug)]
pub struct HttpTaskApi {
    client: Client,
    base_url: Url,
}

impl HttpTaskApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, ApiError> {
        let invalid = |reason: String| ApiError::InvalidUrl {
            url: base_url.to_string(),
            reason,
        };
        let parsed = Url::parse(base_url).map_err(|err| invalid(err.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(invalid("not a hierarchical URL".to_string()));
        }
        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    fn tasks_url(&self) -> Url {
        self.endpoint(&["api", "tasks"])
    }

    fn task_url(&self, id: &TaskId) -> Url {
        self.endpoint(&["api", "tasks", id.as_str()])
    }

    /// Appends `segments` to the base path, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    #[tracing::instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Task>, ApiError> {
        let response = self.client.get(self.tasks_url()).send().await?;
        parse_response(response).await
    }

    #[tracing::instrument(skip(self))]
    async fn add(&self, new_task: &NewTask) -> Result<Task, ApiError> {
        let response = self
            .client
            .post(self.tasks_url())
            .json(new_task)
            .send()
            .await?;
        parse_response(response).await
    }

    #[tracing::instrument(skip(self))]
    async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, ApiError> {
        let response = self
            .client
            .put(self.task_url(id))
            .json(&patch)
            .send()
            .await?;
        parse_response(response).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: &TaskId) -> Result<(), ApiError> {
        let response = self.client.delete(self.task_url(id)).send().await?;
        check_status(response).await.map(drop)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_all(&self) -> Result<(), ApiError> {
        let response = self.client.delete(self.tasks_url()).send().await?;
        check_status(response).await.map(drop)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await?;
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(error) => error.message,
        Err(_) => body,
    };
    Err(ApiError::Status { status, message })
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = check_status(response).await?;
    Ok(response.json().await?)
}
