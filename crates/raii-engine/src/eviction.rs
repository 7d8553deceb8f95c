//! The five-rule eviction decision procedure (spec §4.4). This is the
//! part whose correctness decides whether the system is useful
//! (reclaims tokens) or harmful (a false eviction).

use std::collections::{HashMap, HashSet};

use raii_model::{ContextChunk, Task};
use raii_store::StoreTxn;

use crate::error::EngineError;
use crate::registry::TaskRegistry;

pub const REASON_SUPERSEDED: &str = "superseded_but_task_still_active";
pub const REASON_REFERENCED: &str = "referenced_by_active_task";
pub const REASON_OWNERSHIP: &str = "owning_task_not_complete";
pub const REASON_DEPENDENCY: &str = "active_dependent_task";
pub const REASON_ALL_CLEAR: &str = "all_tasks_complete_no_active_refs";
pub const REASON_PREVIOUSLY_EVICTABLE: &str = "previously_marked_evictable";

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkDecision {
    pub chunk_id: String,
    pub tool_name: String,
    pub size_tokens: u32,
    pub is_refetchable: bool,
    pub reason: &'static str,
    /// `tool_input.file_path` when `tool_name == "Read"`, for the
    /// compliance monitor's path lists.
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvictionReport {
    pub evictable: Vec<ChunkDecision>,
    pub preserved: Vec<ChunkDecision>,
    pub evictable_tokens: u64,
    pub preserved_tokens: u64,
}

pub struct EvictionEngine;

impl EvictionEngine {
    /// Runs the classification pass. When `update_db` is true, stale
    /// in_progress tasks are abandoned first (so their chunks stop
    /// pinning anything during this run) and newly-evictable chunks
    /// are persisted via `ContextTagger::mark_evictable`.
    pub fn run(txn: &mut StoreTxn<'_>, update_db: bool, abandon_threshold: usize) -> Result<EvictionReport, EngineError> {
        if update_db {
            TaskRegistry::new(&mut *txn).abandon_stale_tasks(abandon_threshold)?;
        }

        let tasks: HashMap<String, Task> = txn.list_tasks()?.into_iter().map(|t| (t.id.clone(), t)).collect();
        let chunks = txn.list_chunks()?; // ascending created_at

        let active_referenced = active_referenced_set(&mut *txn, &tasks)?;
        let supersession_index = supersession_index(&chunks);

        let mut report = EvictionReport::default();
        for chunk in &chunks {
            let decision = classify(&mut *txn, chunk, &tasks, &active_referenced, &supersession_index)?;
            let file_path = (chunk.tool_name == "Read")
                .then(|| chunk.tool_input.get("file_path").and_then(serde_json::Value::as_str).map(str::to_string))
                .flatten();
            let entry = ChunkDecision {
                chunk_id: chunk.id.clone(),
                tool_name: chunk.tool_name.clone(),
                size_tokens: chunk.size_tokens,
                is_refetchable: chunk.is_refetchable,
                reason: decision,
                file_path,
            };

            if decision == REASON_ALL_CLEAR || decision == REASON_PREVIOUSLY_EVICTABLE {
                report.evictable_tokens += u64::from(chunk.size_tokens);
                if decision == REASON_ALL_CLEAR && update_db {
                    crate::tagger::ContextTagger::new(&mut *txn).mark_evictable(&chunk.id)?;
                }
                report.evictable.push(entry);
            } else {
                report.preserved_tokens += u64::from(chunk.size_tokens);
                report.preserved.push(entry);
            }
        }

        tracing::debug!(
            evictable = report.evictable.len(),
            preserved = report.preserved.len(),
            evictable_tokens = report.evictable_tokens,
            "eviction pass complete"
        );
        Ok(report)
    }

    /// Fast aggregate: total estimated tokens already `evictable` or
    /// newly classified as such, without materializing a full report.
    /// Used by telemetry/benchmark callers (spec §7 supplement).
    pub fn evictable_token_count(txn: &mut StoreTxn<'_>, abandon_threshold: usize) -> Result<u64, EngineError> {
        Ok(Self::run(txn, false, abandon_threshold)?.evictable_tokens)
    }
}

fn active_referenced_set(txn: &mut StoreTxn<'_>, tasks: &HashMap<String, Task>) -> Result<HashSet<String>, EngineError> {
    let mut set = HashSet::new();
    for task in tasks.values().filter(|t| t.status.is_active()) {
        for edge in txn.reference_edges_from(&task.id)? {
            set.insert(edge.target_chunk_id);
        }
    }
    Ok(set)
}

/// Maps `signature -> latest chunk id`. Chunks must already be in
/// ascending `created_at` order so the final write per key is the most
/// recent chunk (spec §4.4).
fn supersession_index(chunks: &[ContextChunk]) -> HashMap<String, String> {
    let mut index = HashMap::new();
    for chunk in chunks {
        index.insert(chunk.signature(), chunk.id.clone());
    }
    index
}

fn classify(
    txn: &mut StoreTxn<'_>,
    chunk: &ContextChunk,
    tasks: &HashMap<String, Task>,
    active_referenced: &HashSet<String>,
    supersession_index: &HashMap<String, String>,
) -> Result<&'static str, EngineError> {
    if chunk.status == raii_model::ChunkStatus::Evictable {
        return Ok(REASON_PREVIOUSLY_EVICTABLE);
    }

    let owning_task_ids = txn.tasks_owning(&chunk.id)?;
    let owning_tasks: Vec<&Task> = owning_task_ids.iter().filter_map(|id| tasks.get(id)).collect();

    // Rule 1: supersession.
    if let Some(latest_id) = supersession_index.get(&chunk.signature()) {
        if latest_id != &chunk.id {
            let all_owning_complete = owning_tasks.iter().all(|t| t.status.is_complete());
            if !all_owning_complete {
                return Ok(REASON_SUPERSEDED);
            }
            // else: fall through to the remaining rules.
        }
    }

    // Rule 2: active reference.
    if active_referenced.contains(&chunk.id) {
        return Ok(REASON_REFERENCED);
    }

    // Rule 3: ownership / orphan.
    let orphan = owning_tasks.is_empty();
    let any_incomplete = owning_tasks.iter().any(|t| !t.status.is_complete());
    if orphan || any_incomplete {
        return Ok(REASON_OWNERSHIP);
    }

    // Rule 4: declared dependency.
    for owner_id in &owning_task_ids {
        if TaskRegistry::new(&mut *txn).has_active_dependents(owner_id)? {
            return Ok(REASON_DEPENDENCY);
        }
    }

    Ok(REASON_ALL_CLEAR)
}
