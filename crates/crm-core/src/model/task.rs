use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, EntityKind, RecordId};
use crate::utils::{option_timestamp, timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// A follow-up reminder, optionally attached to a contact or lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "Id", default)]
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "timestamp")]
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, with = "option_timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub entity_type: Option<EntityKind>,
    #[serde(default)]
    pub entity_id: Option<RecordId>,
    #[serde(default)]
    pub entity_name: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(title: impl Into<String>, due_date: DateTime<Utc>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: String::new(),
            due_date,
            priority: TaskPriority::default(),
            completed: false,
            completed_at: None,
            entity_type: None,
            entity_id: None,
            entity_name: None,
            created_at,
        }
    }

    /// Incomplete and due before `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date < now
    }
}

impl Entity for Task {
    const TABLE: &'static str = "tasks";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }
}
