//! Client-side mirror of the server's task collection.
//!
//! The controller only changes its local list after the server has confirmed
//! a change. Failed actions raise a notice and leave the list as it was.

use tasklist_core::{Arrangement, NewTask, Task, TaskId, TaskPatch, arrange};

use crate::api::TaskApi;
use crate::notifier::Notifier;

pub const EMPTY_INPUT_NOTICE: &str = "Please enter a task";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Loading,
    Ready,
}

pub struct SyncController<A, N> {
    api: A,
    notifier: N,
    tasks: Vec<Task>,
    state: SyncState,
}

impl<A: TaskApi, N: Notifier> SyncController<A, N> {
    pub fn new(api: A, notifier: N) -> Self {
        Self {
            api,
            notifier,
            tasks: Vec::new(),
            state: SyncState::Loading,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Tasks in the order the server returned them.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// The local list in display order.
    pub fn view(&self) -> Arrangement {
        arrange(&self.tasks)
    }

    /// Fetches the collection. A failed fetch leaves an empty list; the
    /// controller is `Ready` either way.
    #[tracing::instrument(skip(self))]
    pub async fn load(&mut self) {
        self.tasks = match self.api.list().await {
            Ok(tasks) => tasks,
            Err(err) => {
                tracing::warn!("Failed to fetch tasks: {}", err);
                Vec::new()
            }
        };
        self.state = SyncState::Ready;
    }

    /// Creates a task from trimmed `input`. Returns whether it was added.
    #[tracing::instrument(skip(self))]
    pub async fn add(&mut self, input: &str, priority: bool) -> bool {
        let text = input.trim();
        if text.is_empty() {
            self.notifier.alert(EMPTY_INPUT_NOTICE);
            return false;
        }

        let new_task = NewTask::new(text).with_priority(priority);
        match self.api.add(&new_task).await {
            Ok(task) => {
                self.tasks.push(task);
                true
            }
            Err(err) => {
                self.notifier.alert(&format!("Failed to add task: {err}"));
                false
            }
        }
    }

    /// Flips the completion flag of `id`.
    pub async fn toggle(&mut self, id: &TaskId) -> bool {
        let Some(task) = self.find(id) else {
            return false;
        };
        let patch = TaskPatch::disabled(!task.disabled);
        self.update(id, patch).await
    }

    /// Flips the priority flag of `id`.
    pub async fn toggle_priority(&mut self, id: &TaskId) -> bool {
        let Some(task) = self.find(id) else {
            return false;
        };
        let patch = TaskPatch::priority(!task.priority);
        self.update(id, patch).await
    }

    /// Removes `id`. Returns whether it was removed.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&mut self, id: &TaskId) -> bool {
        match self.api.delete(id).await {
            Ok(()) => {
                self.tasks.retain(|task| &task.id != id);
                true
            }
            Err(err) => {
                self.notifier.alert(&format!("Failed to delete task: {err}"));
                false
            }
        }
    }

    /// Removes every task. Returns whether the list was cleared.
    #[tracing::instrument(skip(self))]
    pub async fn delete_all(&mut self) -> bool {
        match self.api.delete_all().await {
            Ok(()) => {
                self.tasks.clear();
                true
            }
            Err(err) => {
                self.notifier
                    .alert(&format!("Failed to delete all tasks: {err}"));
                false
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn update(&mut self, id: &TaskId, patch: TaskPatch) -> bool {
        match self.api.update(id, patch).await {
            Ok(updated) => {
                if let Some(task) = self.tasks.iter_mut().find(|task| task.id == updated.id) {
                    *task = updated;
                }
                true
            }
            Err(err) => {
                self.notifier.alert(&format!("Failed to update task: {err}"));
                false
            }
        }
    }

    fn find(&self, id: &TaskId) -> Option<&Task> {
        let task = self.tasks.iter().find(|task| &task.id == id);
        if task.is_none() {
            self.notifier.alert(&format!("Task {id} not found"));
        }
        task
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, MockTaskApi};
    use crate::notifier::MockNotifier;
    use mockall::predicate::eq;
    use reqwest::StatusCode;
    use tasklist_core::CreatedDate;

    fn task(id: &str, text: &str) -> Task {
        Task {
            id: TaskId::from(id),
            text: text.to_string(),
            disabled: false,
            priority: false,
            created_date: Some(CreatedDate::parse("2024-01-01")),
        }
    }

    fn server_error() -> ApiError {
        ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Storage backend unavailable".to_string(),
        }
    }

    fn quiet_notifier() -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier.expect_alert().never();
        notifier
    }

    async fn ready_controller(
        mut api: MockTaskApi,
        notifier: MockNotifier,
        tasks: Vec<Task>,
    ) -> SyncController<MockTaskApi, MockNotifier> {
        api.expect_list().times(1).return_once(move || Ok(tasks));
        let mut controller = SyncController::new(api, notifier);
        controller.load().await;
        controller
    }

    #[tokio::test]
    async fn can_load_tasks() {
        let controller = ready_controller(
            MockTaskApi::new(),
            quiet_notifier(),
            vec![task("1", "buy milk")],
        )
        .await;

        assert_eq!(controller.state(), SyncState::Ready);
        assert_eq!(controller.tasks(), &[task("1", "buy milk")]);
    }

    #[tokio::test]
    async fn can_fall_back_to_empty_list_when_fetch_fails() {
        let mut api = MockTaskApi::new();
        api.expect_list().times(1).returning(|| Err(server_error()));
        let mut controller = SyncController::new(api, quiet_notifier());
        assert_eq!(controller.state(), SyncState::Loading);

        controller.load().await;

        assert_eq!(controller.state(), SyncState::Ready);
        assert!(controller.tasks().is_empty());
    }

    #[tokio::test]
    async fn can_add_trimmed_task_returned_by_server() {
        let mut api = MockTaskApi::new();
        api.expect_add()
            .withf(|new_task| {
                new_task.text.as_deref() == Some("buy milk") && new_task.priority == Some(true)
            })
            .times(1)
            .returning(|_| {
                Ok(Task {
                    priority: true,
                    ..task("server-id", "buy milk")
                })
            });
        let mut controller = ready_controller(api, quiet_notifier(), Vec::new()).await;

        let added = controller.add("  buy milk  ", true).await;

        assert!(added);
        assert_eq!(controller.tasks().len(), 1);
        assert_eq!(controller.tasks()[0].id, TaskId::from("server-id"));
        assert!(controller.tasks()[0].priority);
    }

    #[tokio::test]
    async fn can_refuse_blank_input_without_request() {
        let mut api = MockTaskApi::new();
        api.expect_add().never();
        let mut notifier = MockNotifier::new();
        notifier
            .expect_alert()
            .with(eq(EMPTY_INPUT_NOTICE))
            .times(1)
            .return_const(());
        let mut controller = ready_controller(api, notifier, Vec::new()).await;

        assert!(!controller.add("   ", false).await);
        assert!(controller.tasks().is_empty());
    }

    #[tokio::test]
    async fn can_keep_list_when_add_fails() {
        let mut api = MockTaskApi::new();
        api.expect_add().times(1).returning(|_| Err(server_error()));
        let mut notifier = MockNotifier::new();
        notifier
            .expect_alert()
            .withf(|message| message.starts_with("Failed to add task"))
            .times(1)
            .return_const(());
        let existing = vec![task("1", "walk the dog")];
        let mut controller = ready_controller(api, notifier, existing.clone()).await;

        assert!(!controller.add("buy milk", false).await);
        assert_eq!(controller.tasks(), existing.as_slice());
    }

    #[tokio::test]
    async fn can_toggle_completion_with_server_copy() {
        let mut api = MockTaskApi::new();
        api.expect_update()
            .withf(|id, patch| id.as_str() == "1" && *patch == TaskPatch::disabled(true))
            .times(1)
            .returning(|_, _| {
                Ok(Task {
                    disabled: true,
                    ..task("1", "buy milk")
                })
            });
        let mut controller =
            ready_controller(api, quiet_notifier(), vec![task("1", "buy milk")]).await;

        assert!(controller.toggle(&TaskId::from("1")).await);

        let view = controller.view();
        assert!(view.active.is_empty());
        assert_eq!(view.completed.len(), 1);
    }

    #[tokio::test]
    async fn can_toggle_priority() {
        let mut api = MockTaskApi::new();
        api.expect_update()
            .withf(|_, patch| *patch == TaskPatch::priority(true))
            .times(1)
            .returning(|_, _| {
                Ok(Task {
                    priority: true,
                    ..task("2", "file taxes")
                })
            });
        let mut controller = ready_controller(
            api,
            quiet_notifier(),
            vec![task("1", "buy milk"), task("2", "file taxes")],
        )
        .await;

        assert!(controller.toggle_priority(&TaskId::from("2")).await);

        let view = controller.view();
        assert_eq!(view.active[0].id, TaskId::from("2"));
    }

    #[tokio::test]
    async fn can_keep_task_when_update_fails() {
        let mut api = MockTaskApi::new();
        api.expect_update()
            .times(1)
            .returning(|_, _| Err(server_error()));
        let mut notifier = MockNotifier::new();
        notifier.expect_alert().times(1).return_const(());
        let mut controller = ready_controller(api, notifier, vec![task("1", "buy milk")]).await;

        assert!(!controller.toggle(&TaskId::from("1")).await);
        assert!(!controller.tasks()[0].disabled);
    }

    #[tokio::test]
    async fn can_report_unknown_task_without_request() {
        let mut api = MockTaskApi::new();
        api.expect_update().never();
        let mut notifier = MockNotifier::new();
        notifier
            .expect_alert()
            .with(eq("Task missing not found"))
            .times(1)
            .return_const(());
        let mut controller = ready_controller(api, notifier, Vec::new()).await;

        assert!(!controller.toggle(&TaskId::from("missing")).await);
    }

    #[tokio::test]
    async fn can_delete_after_confirmation() {
        let mut api = MockTaskApi::new();
        api.expect_delete()
            .withf(|id| id.as_str() == "1")
            .times(1)
            .returning(|_| Ok(()));
        let mut controller = ready_controller(
            api,
            quiet_notifier(),
            vec![task("1", "buy milk"), task("2", "file taxes")],
        )
        .await;

        assert!(controller.delete(&TaskId::from("1")).await);
        assert_eq!(controller.tasks(), &[task("2", "file taxes")]);
    }

    #[tokio::test]
    async fn can_keep_list_when_delete_all_fails() {
        let mut api = MockTaskApi::new();
        api.expect_delete_all()
            .times(1)
            .returning(|| Err(server_error()));
        let mut notifier = MockNotifier::new();
        notifier
            .expect_alert()
            .withf(|message| message.starts_with("Failed to delete all tasks"))
            .times(1)
            .return_const(());
        let mut controller = ready_controller(api, notifier, vec![task("1", "buy milk")]).await;

        assert!(!controller.delete_all().await);
        assert_eq!(controller.tasks().len(), 1);
    }

    #[tokio::test]
    async fn can_clear_list_after_delete_all() {
        let mut api = MockTaskApi::new();
        api.expect_delete_all().times(1).returning(|| Ok(()));
        let mut controller =
            ready_controller(api, quiet_notifier(), vec![task("1", "buy milk")]).await;

        assert!(controller.delete_all().await);
        assert!(controller.view().is_empty());
    }
}
