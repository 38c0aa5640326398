pub mod api;
pub mod notifier;
pub mod render;
pub mod sync;

pub use api::{ApiError, HttpTaskApi, TaskApi};
pub use notifier::{ConsoleNotifier, Notifier};
pub use render::render;
pub use sync::{SyncController, SyncState};
