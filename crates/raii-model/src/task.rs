use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle status of a [`Task`]. `pending -> in_progress -> {completed | abandoned}`;
/// the latter two are terminal and equivalent for eviction purposes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Abandoned,
}

impl TaskStatus {
    pub fn is_active(self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::InProgress)
    }

    /// True for `completed` and `abandoned` — the two terminal states
    /// the eviction engine treats identically.
    pub fn is_complete(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Abandoned)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Abandoned => "abandoned",
        }
    }
}

/// A host-declared unit of user-visible intent; the ownership root for
/// context chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub subject: String,
    pub status: TaskStatus,
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub metadata: Map<String, Value>,
}

impl Task {
    pub fn new(id: impl Into<String>, subject: impl Into<String>, parent_id: Option<String>) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            status: TaskStatus::Pending,
            parent_id,
            created_at: Utc::now(),
            completed_at: None,
            metadata: Map::new(),
        }
    }

    /// Applies a status transition, stamping `completed_at` on first
    /// entry into a terminal state. No-op on the timestamp if already
    /// terminal (spec §3: "set once on first transition").
    pub fn transition(&mut self, new_status: TaskStatus) {
        self.status = new_status;
        if new_status.is_complete() && self.completed_at.is_none() {
            self.completed_at = Some(Utc::now());
        }
    }
}

/// A directed task -> task edge: `dependent` still needs `dependency`'s
/// chunks to stay pinned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskDependency {
    pub dependent_task_id: String,
    pub dependency_task_id: String,
}
