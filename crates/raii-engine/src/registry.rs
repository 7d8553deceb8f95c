//! CRUD over tasks, lifecycle transitions, dependency edges, and
//! abandoned-task detection (spec §4.2).

use raii_model::{Task, TaskDependency, TaskStatus};
use raii_store::StoreTxn;

use crate::error::EngineError;

/// Default `abandon_stale_tasks` threshold; overridable by callers
/// (`raii-hooks` reads `RAII_ABANDON_THRESHOLD`).
pub const DEFAULT_ABANDON_THRESHOLD: usize = 50;

pub struct TaskRegistry<'t, 'env> {
    txn: &'t mut StoreTxn<'env>,
}

impl<'t, 'env> TaskRegistry<'t, 'env> {
    pub fn new(txn: &'t mut StoreTxn<'env>) -> Self {
        Self { txn }
    }

    /// Inserts a `pending` task. No-op (keeps existing row) if `id`
    /// already exists — upsert semantics are on `subject` only, never
    /// on `status`.
    pub fn create(&mut self, id: &str, subject: &str, parent_id: Option<String>) -> Result<Task, EngineError> {
        if let Some(existing) = self.txn.get_task(id)? {
            return Ok(existing);
        }
        let task = Task::new(id, subject, parent_id);
        self.txn.put_task(&task)?;
        Ok(task)
    }

    /// Sets status, stamping `completed_at` on first entry into a
    /// terminal state. No-op (returns `None`) if the task doesn't
    /// exist — the caller (post-tool interceptor) handles the "unknown
    /// task referenced" case per spec §7 by auto-creating first.
    pub fn update_status(&mut self, id: &str, new_status: TaskStatus) -> Result<Option<Task>, EngineError> {
        let Some(mut task) = self.txn.get_task(id)? else {
            return Ok(None);
        };
        task.transition(new_status);
        self.txn.put_task(&task)?;
        Ok(Some(task))
    }

    /// Auto-creates a `pending` task with a placeholder subject if `id`
    /// is unknown, then applies `new_status` — the spec §7 "unknown
    /// task referenced by a lifecycle tool" recovery path.
    pub fn update_status_or_create(&mut self, id: &str, new_status: TaskStatus) -> Result<Task, EngineError> {
        if self.txn.get_task(id)?.is_none() {
            self.create(id, "(untitled task — auto-created on first reference)", None)?;
        }
        Ok(self.update_status(id, new_status)?.expect("just created"))
    }

    /// The most recently created `in_progress` task, if any.
    pub fn get_current_active(&self) -> Result<Option<Task>, EngineError> {
        let mut in_progress: Vec<Task> = self
            .txn
            .list_tasks()?
            .into_iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .collect();
        in_progress.sort_by_key(|t| t.created_at);
        Ok(in_progress.pop())
    }

    /// Every `pending` or `in_progress` task, ascending by `created_at`
    /// (the original's `list_active`) — used by the advisor and the
    /// session-bootstrap summary, which report on all active tasks, not
    /// just the single most-recent in_progress one.
    pub fn list_active(&self) -> Result<Vec<Task>, EngineError> {
        let mut active: Vec<Task> = self.txn.list_tasks()?.into_iter().filter(|t| t.status.is_active()).collect();
        active.sort_by_key(|t| t.created_at);
        Ok(active)
    }

    pub fn tag_chunk(&mut self, task_id: &str, chunk_id: &str) -> Result<(), EngineError> {
        self.txn.tag_chunk(task_id, chunk_id)?;
        Ok(())
    }

    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) -> Result<(), EngineError> {
        self.txn.put_task_dependency(&TaskDependency {
            dependent_task_id: dependent.to_string(),
            dependency_task_id: dependency.to_string(),
        })?;
        Ok(())
    }

    /// True iff any task whose dependency edge points at `task` is
    /// itself active.
    pub fn has_active_dependents(&self, task: &str) -> Result<bool, EngineError> {
        for dependent_id in self.txn.dependents_of(task)? {
            if let Some(dependent) = self.txn.get_task(&dependent_id)? {
                if dependent.status.is_active() {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// For each `in_progress` task, counts chunks created after that
    /// task's `created_at`; transitions to `abandoned` at or above
    /// `threshold`. Returns the transitioned ids. Idempotent within a
    /// run — a task already abandoned is never revisited.
    pub fn abandon_stale_tasks(&mut self, threshold: usize) -> Result<Vec<String>, EngineError> {
        let in_progress: Vec<Task> = self
            .txn
            .list_tasks()?
            .into_iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .collect();
        if in_progress.is_empty() {
            return Ok(Vec::new());
        }

        let chunks = self.txn.list_chunks()?;
        let mut transitioned = Vec::new();
        for task in in_progress {
            let count = chunks.iter().filter(|c| c.created_at > task.created_at).count();
            if count >= threshold {
                self.update_status(&task.id, TaskStatus::Abandoned)?;
                tracing::info!(task_id = %task.id, chunks_since = count, threshold, "task abandoned");
                transitioned.push(task.id);
            }
        }
        Ok(transitioned)
    }
}
