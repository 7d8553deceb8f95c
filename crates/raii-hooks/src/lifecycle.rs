//! Task-lifecycle tool-input interpretation, shared by pre-tool (which
//! applies the mutation) and post-tool (which re-derives the same
//! fields to correct chunk attribution).

use raii_engine::TaskRegistry;
use raii_model::TaskStatus;
use serde_json::Value;

pub fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

pub fn parse_status(s: &str) -> Option<TaskStatus> {
    match s {
        "pending" => Some(TaskStatus::Pending),
        "in_progress" => Some(TaskStatus::InProgress),
        "completed" => Some(TaskStatus::Completed),
        "abandoned" => Some(TaskStatus::Abandoned),
        _ => None,
    }
}

/// Applies a `TaskCreate` / `TaskUpdate` / `TodoWrite` tool call to the
/// registry (spec §4.6 "Pre-tool": "on task-lifecycle tools it mutates
/// the registry accordingly").
pub fn apply_lifecycle_event(registry: &mut TaskRegistry<'_, '_>, tool_name: &str, tool_input: &Value) -> Result<(), raii_engine::EngineError> {
    match tool_name {
        "TaskCreate" => {
            let id = string_field(tool_input, "id").unwrap_or_else(|| string_field(tool_input, "subject").unwrap_or_default());
            let subject = string_field(tool_input, "subject").unwrap_or_else(|| id.clone());
            let parent_id = string_field(tool_input, "parent_id");
            registry.create(&id, &subject, parent_id)?;
        }
        "TaskUpdate" => {
            if let (Some(id), Some(status)) = (string_field(tool_input, "id"), string_field(tool_input, "status").as_deref().and_then(parse_status)) {
                registry.update_status_or_create(&id, status)?;
            }
        }
        "TodoWrite" => {
            if let Some(todos) = tool_input.get("todos").and_then(Value::as_array) {
                for todo in todos {
                    let Some(id) = string_field(todo, "id") else { continue };
                    match string_field(todo, "status").as_deref().and_then(parse_status) {
                        Some(status) => {
                            registry.update_status_or_create(&id, status)?;
                        }
                        None => {
                            let subject = string_field(todo, "subject").unwrap_or_else(|| id.clone());
                            registry.create(&id, &subject, None)?;
                        }
                    }
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Resolves the task a post-tool chunk should be attributed to: the
/// pending tag's snapshot, with the two corrections spec §4.6
/// describes — a task-create's own result goes to the just-created
/// task, and a task-update-to-in_progress's result goes to the task
/// being started.
pub fn resolve_attribution(tool_name: &str, tool_input: &Value, tagged_active_task_id: Option<String>) -> Option<String> {
    match tool_name {
        "TaskCreate" => string_field(tool_input, "id").or(tagged_active_task_id),
        "TaskUpdate" => {
            let id = string_field(tool_input, "id");
            let status = string_field(tool_input, "status").as_deref().and_then(parse_status);
            match (id, status) {
                (Some(id), Some(TaskStatus::InProgress)) => Some(id),
                _ => tagged_active_task_id,
            }
        }
        _ => tagged_active_task_id,
    }
}
