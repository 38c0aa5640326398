//! Display ordering of a task list.
//!
//! Active tasks are always shown before completed ones. Within each group,
//! priority tasks come first and older tasks come before newer ones. A task
//! without a readable creation date counts as the oldest possible task.

use crate::task::Task;
use std::cmp::Ordering;

/// A task list split into its display groups, each already sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arrangement {
    pub active: Vec<Task>,
    pub completed: Vec<Task>,
}

impl Arrangement {
    /// Iterates over every task in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.active.iter().chain(self.completed.iter())
    }

    /// Number of tasks still to do.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.completed.is_empty()
    }
}

/// Comparator used inside each group: priority first, then oldest first.
pub fn display_order(a: &Task, b: &Task) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.created_on().cmp(&b.created_on()))
}

/// Partitions `tasks` into active and completed groups and sorts each group.
///
/// The sort is stable, so tasks with equal keys keep their input order.
pub fn arrange(tasks: &[Task]) -> Arrangement {
    let (mut active, mut completed): (Vec<Task>, Vec<Task>) =
        tasks.iter().cloned().partition(Task::is_active);
    active.sort_by(display_order);
    completed.sort_by(display_order);
    Arrangement { active, completed }
}
