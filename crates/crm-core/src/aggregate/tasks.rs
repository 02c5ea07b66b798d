//! Task queries and completion.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::Result;
use crate::model::{EntityKind, RecordId, Task};
use crate::repository::Repository;

pub fn pending(tasks: &[Task]) -> Vec<Task> {
    tasks.iter().filter(|t| !t.completed).cloned().collect()
}

pub fn completed(tasks: &[Task]) -> Vec<Task> {
    tasks.iter().filter(|t| t.completed).cloned().collect()
}

/// Incomplete tasks due before `now`, oldest due date first.
pub fn overdue(tasks: &[Task], now: DateTime<Utc>) -> Vec<Task> {
    let mut late: Vec<Task> = tasks.iter().filter(|t| t.is_overdue(now)).cloned().collect();
    late.sort_by_key(|t| t.due_date);
    late
}

/// Tasks attached to one contact or lead.
pub fn for_entity(tasks: &[Task], kind: EntityKind, id: RecordId) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| t.entity_type == Some(kind) && t.entity_id == Some(id))
        .cloned()
        .collect()
}

/// Mark task `id` done at `now`.
pub fn mark_complete(repo: &dyn Repository<Task>, id: RecordId, now: DateTime<Utc>) -> Result<Task> {
    let mut task = repo.require(id)?;
    task.completed = true;
    task.completed_at = Some(now);
    let task = repo.update(task)?;
    info!(task_id = id, "Task completed");
    Ok(task)
}
