use tasklist_core::{CreatedDate, NewTask, Task, TaskId, TaskPatch, ValidationError};
use uuid::Uuid;

pub mod api;
pub mod repository;

use repository::{RepositoryError, Snapshot, TaskRepository};

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    /// The request payload is missing required data.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// No task with the given ID exists.
    #[error("Task {0} not found")]
    NotFound(TaskId),
    /// The task list changed between load and save (conditional writes only).
    #[error("Task list was modified concurrently, please retry")]
    Conflict,
    /// The blob store failed or holds an unreadable document.
    #[error("{0}")]
    Storage(RepositoryError),
}

impl From<RepositoryError> for TaskServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict => TaskServiceError::Conflict,
            other => TaskServiceError::Storage(other),
        }
    }
}

/// Add/list/update/delete operations over the stored task list.
///
/// Each mutating operation is one load, change, save cycle against the
/// repository. Nothing is cached between calls.
#[derive(Clone)]
pub struct TaskService {
    repository: TaskRepository,
}

impl TaskService {
    pub fn new(repository: TaskRepository) -> Self {
        Self { repository }
    }

    /// Creates a task from `new_task`.
    ///
    /// # Returns
    ///
    /// The stored task with a fresh ID, `disabled = false`, `priority`
    /// defaulting to false and `created_date` defaulting to today (UTC).
    #[tracing::instrument(skip(self))]
    pub async fn add_task(&self, new_task: NewTask) -> Result<Task, TaskServiceError> {
        let text = new_task.validated_text()?.to_string();
        let created_date = new_task
            .created_date
            .unwrap_or_else(|| chrono::Utc::now().date_naive());

        let task = self
            .mutate(|tasks| {
                let mut id = new_task_id();
                while tasks.iter().any(|existing| existing.id == id) {
                    id = new_task_id();
                }
                let task = Task {
                    id,
                    text,
                    disabled: false,
                    priority: new_task.priority.unwrap_or(false),
                    created_date: Some(CreatedDate::from(created_date)),
                };
                tasks.push(task.clone());
                Ok(task)
            })
            .await?;
        tracing::info!("Added task {}", task.id);
        Ok(task)
    }

    /// Returns every stored task in storage order.
    #[tracing::instrument(skip(self))]
    pub async fn list_tasks(&self) -> Result<Vec<Task>, TaskServiceError> {
        Ok(self.repository.load_all().await?.tasks)
    }

    /// Applies the supplied fields of `patch` to the task with `id`.
    ///
    /// # Returns
    ///
    /// The updated task, or `NotFound` if no task has `id`. An empty patch is
    /// rejected before storage is touched.
    #[tracing::instrument(skip(self))]
    pub async fn update_task(
        &self,
        id: &TaskId,
        patch: TaskPatch,
    ) -> Result<Task, TaskServiceError> {
        patch.validate()?;
        self.mutate(|tasks| {
            let task = tasks
                .iter_mut()
                .find(|task| &task.id == id)
                .ok_or_else(|| TaskServiceError::NotFound(id.clone()))?;
            patch.apply(task);
            Ok(task.clone())
        })
        .await
    }

    /// Removes the task with `id` and returns it.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, id: &TaskId) -> Result<Task, TaskServiceError> {
        let removed = self
            .mutate(|tasks| {
                let index = tasks
                    .iter()
                    .position(|task| &task.id == id)
                    .ok_or_else(|| TaskServiceError::NotFound(id.clone()))?;
                Ok(tasks.remove(index))
            })
            .await?;
        tracing::info!("Deleted task {}", removed.id);
        Ok(removed)
    }

    /// Stores an empty task list, whatever was there before.
    #[tracing::instrument(skip(self))]
    pub async fn delete_all_tasks(&self) -> Result<(), TaskServiceError> {
        self.repository.replace_all(&[]).await?;
        tracing::info!("Cleared all tasks");
        Ok(())
    }

    /// Loads the collection, applies `change`, and saves the result.
    /// Nothing is written when `change` fails.
    async fn mutate<T, F>(&self, change: F) -> Result<T, TaskServiceError>
    where
        F: FnOnce(&mut Vec<Task>) -> Result<T, TaskServiceError>,
    {
        let Snapshot { mut tasks, version } = self.repository.load_all().await?;
        let outcome = change(&mut tasks)?;
        self.repository.save_all(&tasks, version).await?;
        Ok(outcome)
    }
}

fn new_task_id() -> TaskId {
    TaskId::new(Uuid::new_v4().to_string())
}
