use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderValue, Method, StatusCode},
    middleware::from_fn,
    response::{IntoResponse, Response},
    routing::{MethodRouter, get, put},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tasklist_core::{NewTask, Task, TaskId, TaskPatch};

use crate::auth::api::v1::require_auth_middleware;
use crate::task::{TaskService, TaskServiceError};
use crate::web::api::{ErrorResponse, cors_layer};

/// Shared state for the task endpoints.
#[derive(Clone)]
pub struct TaskState {
    pub service: TaskService,
}

/// JSON response carrying a human-readable outcome.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error type for task handlers.
#[derive(Debug, thiserror::Error)]
pub enum TaskApiError {
    /// The request body is not JSON of the expected shape.
    #[error(transparent)]
    InvalidBody(#[from] JsonRejection),
    #[error(transparent)]
    Service(#[from] TaskServiceError),
}

impl IntoResponse for TaskApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            TaskApiError::InvalidBody(_)
            | TaskApiError::Service(TaskServiceError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            TaskApiError::Service(TaskServiceError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            TaskApiError::Service(TaskServiceError::Conflict) => (StatusCode::CONFLICT, "CONFLICT"),
            TaskApiError::Service(TaskServiceError::Storage(err)) => {
                tracing::error!("Task storage failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
            }
        };
        let message = match self {
            TaskApiError::InvalidBody(rejection) => rejection.body_text(),
            other => other.to_string(),
        };
        (status, Json(ErrorResponse::new(error, message))).into_response()
    }
}

/// Handler for GET /api/tasks. Returns the stored tasks in storage order.
#[tracing::instrument(skip(state))]
pub async fn list_tasks_handler(
    State(state): State<Arc<TaskState>>,
) -> Result<Json<Vec<Task>>, TaskApiError> {
    let tasks = state.service.list_tasks().await?;
    Ok(Json(tasks))
}

/// Handler for POST /api/tasks.
#[tracing::instrument(skip(state, payload))]
pub async fn add_task_handler(
    State(state): State<Arc<TaskState>>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), TaskApiError> {
    let Json(new_task) = payload?;
    let task = state.service.add_task(new_task).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Handler for PUT /api/tasks/{id}.
#[tracing::instrument(skip(state, payload))]
pub async fn update_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<TaskId>,
    payload: Result<Json<TaskPatch>, JsonRejection>,
) -> Result<Json<Task>, TaskApiError> {
    let Json(patch) = payload?;
    let task = state.service.update_task(&id, patch).await?;
    Ok(Json(task))
}

/// Handler for DELETE /api/tasks/{id}.
#[tracing::instrument(skip(state))]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<TaskId>,
) -> Result<Json<MessageResponse>, TaskApiError> {
    state.service.delete_task(&id).await?;
    Ok(Json(MessageResponse::new(format!("Task {id} deleted"))))
}

/// Handler for DELETE /api/tasks.
#[tracing::instrument(skip(state))]
pub async fn delete_all_tasks_handler(
    State(state): State<Arc<TaskState>>,
) -> Result<Json<MessageResponse>, TaskApiError> {
    state.service.delete_all_tasks().await?;
    Ok(Json(MessageResponse::new("All tasks deleted successfully")))
}

/// Creates and returns the tasks API router.
///
/// Each route answers its own CORS preflight for `origin`. With
/// `require_auth`, requests without a valid client principal get 401.
pub fn create_api_router(
    state: Arc<TaskState>,
    origin: &HeaderValue,
    require_auth: bool,
) -> Router {
    let guarded = |methods: MethodRouter<Arc<TaskState>>| {
        if require_auth {
            methods.route_layer(from_fn(require_auth_middleware))
        } else {
            methods
        }
    };

    Router::new()
        .route(
            "/tasks",
            guarded(
                get(list_tasks_handler)
                    .post(add_task_handler)
                    .delete(delete_all_tasks_handler),
            )
            .layer(cors_layer(
                origin,
                [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS],
            )),
        )
        .route(
            "/tasks/{id}",
            guarded(put(update_task_handler).delete(delete_task_handler)).layer(cors_layer(
                origin,
                [Method::PUT, Method::DELETE, Method::OPTIONS],
            )),
        )
        .with_state(state)
}
