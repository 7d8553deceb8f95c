//! Ingests tool results, creates chunks, associates them with the
//! active task, and applies write-invalidation (spec §4.3).

use raii_model::{ChunkStatus, ContextChunk};
use raii_store::StoreTxn;
use serde_json::Value;

use crate::error::EngineError;
use crate::registry::TaskRegistry;

pub struct ContextTagger<'t, 'env> {
    txn: &'t mut StoreTxn<'env>,
}

impl<'t, 'env> ContextTagger<'t, 'env> {
    pub fn new(txn: &'t mut StoreTxn<'env>) -> Self {
        Self { txn }
    }

    /// Persists a fresh chunk for `invocation_id`. Resolves the owning
    /// task from `task_id`, falling back to the registry's current
    /// active task when absent. Duplicate `invocation_id` upserts: the
    /// chunk's size/hash are refreshed but its status never regresses
    /// (monotonic-toward-evictable invariant, spec §3).
    #[allow(clippy::too_many_arguments)]
    pub fn ingest(
        &mut self,
        invocation_id: &str,
        tool_name: &str,
        tool_input: Value,
        output_text: &str,
        session_id: Option<String>,
        task_id: Option<&str>,
    ) -> Result<ContextChunk, EngineError> {
        let resolved_task_id = match task_id {
            Some(id) => Some(id.to_string()),
            None => TaskRegistry::new(&mut *self.txn).get_current_active()?.map(|t| t.id),
        };

        let chunk = match self.txn.get_chunk(invocation_id)? {
            Some(mut existing) => {
                existing.tool_input = tool_input;
                existing.size_tokens = raii_model::estimate_tokens(output_text);
                existing.content_hash = raii_model::content_hash(output_text);
                existing
            }
            None => ContextChunk::new(invocation_id, tool_name, tool_input, output_text, session_id),
        };
        self.txn.put_chunk(&chunk)?;

        if let Some(task_id) = &resolved_task_id {
            self.txn.tag_chunk(task_id, &chunk.id)?;
        }

        Ok(chunk)
    }

    pub fn mark_evictable(&mut self, id: &str) -> Result<(), EngineError> {
        self.set_status(id, ChunkStatus::Evictable)
    }

    pub fn mark_integrated(&mut self, id: &str) -> Result<(), EngineError> {
        self.set_status(id, ChunkStatus::Integrated)
    }

    fn set_status(&mut self, id: &str, status: ChunkStatus) -> Result<(), EngineError> {
        if let Some(mut chunk) = self.txn.get_chunk(id)? {
            chunk.set_status(status);
            self.txn.put_chunk(&chunk)?;
        }
        Ok(())
    }

    /// Write-invalidation: marks every `fresh` file-read chunk whose
    /// canonical `file_path` equals `path` as `evictable`. Returns the
    /// count invalidated.
    pub fn invalidate_reads_for_path(&mut self, path: &str) -> Result<usize, EngineError> {
        let mut invalidated = 0;
        let stale: Vec<String> = self
            .txn
            .list_chunks()?
            .into_iter()
            .filter(|c| c.tool_name == "Read" && c.status == ChunkStatus::Fresh)
            .filter(|c| c.tool_input.get("file_path").and_then(Value::as_str) == Some(path))
            .map(|c| c.id)
            .collect();

        for id in stale {
            self.mark_evictable(&id)?;
            invalidated += 1;
        }
        Ok(invalidated)
    }

    pub fn list_evictable(&self) -> Result<Vec<ContextChunk>, EngineError> {
        Ok(self
            .txn
            .list_chunks()?
            .into_iter()
            .filter(|c| c.status == ChunkStatus::Evictable)
            .collect())
    }

    pub fn list_all(&self) -> Result<Vec<ContextChunk>, EngineError> {
        Ok(self.txn.list_chunks()?)
    }
}

/// Canonical form of a tool-input's `file_path`, for callers (the
/// post-tool interceptor) that need to read a path out of a mutator's
/// input before calling `invalidate_reads_for_path`.
pub fn canonical_file_path(tool_input: &Value) -> Option<String> {
    tool_input.get("file_path").and_then(Value::as_str).map(str::to_string)
}

/// Every `file_path` touched by a (possibly multi-target) mutator
/// input — `MultiEdit`-style payloads nest paths under `edits`, a
/// top-level `file_paths` array, or a single `file_path`.
pub fn mutated_paths(tool_input: &Value) -> Vec<String> {
    if let Some(paths) = tool_input.get("file_paths").and_then(Value::as_array) {
        return paths.iter().filter_map(Value::as_str).map(str::to_string).collect();
    }
    if let Some(path) = canonical_file_path(tool_input) {
        return vec![path];
    }
    Vec::new()
}
