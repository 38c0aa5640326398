//! Core domain models and list arrangement rules for the task list.
pub mod arrange;
pub mod task;

pub use arrange::{Arrangement, arrange, display_order};
pub use task::{CreatedDate, NewTask, Task, TaskId, TaskPatch, ValidationError};
