//! Domain-level operations over one scoped transaction.
//!
//! `raii-engine` talks to these methods only — it never touches
//! `heed3` directly, mirroring how `storage_core` keeps `RocksDB`
//! details out of the traversal layer above it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use heed3::RwTxn;
use raii_model::{CompactionEvent, ContextChunk, ReferenceEdge, ReferenceType, Task, TaskDependency};

use crate::error::StoreError;
use crate::keys::{self, created_at_index_key, pack2, pack3, unpack2};
use crate::schema::{Store, Tables};

impl Store {
    /// Runs `f` inside one read-write transaction: commits on `Ok`,
    /// drops (rolling back) on `Err`. The one transactional accessor
    /// spec §4.1 asks for — reads and writes alike go through it, since
    /// at this app's scale (a single CLI hook process per call) there
    /// is no concurrent-reader case worth a separate read-only path.
    pub fn transact<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut StoreTxn<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let txn = self.env.write_txn().map_err(StoreError::from)?;
        let mut store_txn = StoreTxn {
            txn,
            tables: self.tables.clone(),
        };
        let result = f(&mut store_txn)?;
        store_txn.txn.commit().map_err(StoreError::from)?;
        Ok(result)
    }
}

pub struct StoreTxn<'env> {
    txn: RwTxn<'env>,
    tables: Arc<Tables>,
}

impl<'env> StoreTxn<'env> {
    // ---- tasks ----------------------------------------------------

    pub fn put_task(&mut self, task: &Task) -> Result<(), StoreError> {
        let bytes = postcard::to_stdvec(task)?;
        self.tables.tasks.put(&mut self.txn, &task.id, &bytes)?;
        Ok(())
    }

    pub fn get_task(&self, id: &str) -> Result<Option<Task>, StoreError> {
        match self.tables.tasks.get(&self.txn, id)? {
            Some(bytes) => Ok(Some(postcard::from_bytes(bytes)?)),
            None => Ok(None),
        }
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let mut out = Vec::new();
        for entry in self.tables.tasks.iter(&self.txn)? {
            let (_, bytes) = entry?;
            out.push(postcard::from_bytes(bytes)?);
        }
        Ok(out)
    }

    pub fn put_task_dependency(&mut self, dep: &TaskDependency) -> Result<(), StoreError> {
        let forward = pack2(&dep.dependent_task_id, &dep.dependency_task_id);
        let reverse = pack2(&dep.dependency_task_id, &dep.dependent_task_id);
        self.tables.task_dependencies.put(&mut self.txn, &forward, &[])?;
        self.tables
            .task_dependencies_by_dependency
            .put(&mut self.txn, &reverse, &[])?;
        Ok(())
    }

    /// Task ids that depend on `dependency_task_id` — used by the
    /// eviction engine's declared-dependency rule.
    pub fn dependents_of(&self, dependency_task_id: &str) -> Result<Vec<String>, StoreError> {
        let prefix = dependency_prefix(dependency_task_id);
        let mut out = Vec::new();
        for entry in self
            .tables
            .task_dependencies_by_dependency
            .prefix_iter(&self.txn, &prefix)?
        {
            let (key, _) = entry?;
            if let Some((_, dependent)) = unpack2(key) {
                out.push(dependent.to_string());
            }
        }
        Ok(out)
    }

    // ---- chunks -----------------------------------------------------

    pub fn put_chunk(&mut self, chunk: &ContextChunk) -> Result<(), StoreError> {
        let bytes = postcard::to_stdvec(chunk)?;
        self.tables.chunks.put(&mut self.txn, &chunk.id, &bytes)?;
        let index_key = created_at_index_key(chunk.created_at.timestamp_nanos_opt().unwrap_or(0), &chunk.id);
        self.tables
            .chunks_by_created_at
            .put(&mut self.txn, &index_key, &chunk.id)?;
        Ok(())
    }

    pub fn get_chunk(&self, id: &str) -> Result<Option<ContextChunk>, StoreError> {
        match self.tables.chunks.get(&self.txn, id)? {
            Some(bytes) => Ok(Some(postcard::from_bytes(bytes)?)),
            None => Ok(None),
        }
    }

    /// All chunks, ascending by `created_at` (spec §3).
    pub fn list_chunks(&self) -> Result<Vec<ContextChunk>, StoreError> {
        let mut out = Vec::new();
        for entry in self.tables.chunks_by_created_at.iter(&self.txn)? {
            let (_, chunk_id) = entry?;
            if let Some(chunk) = self.get_chunk(chunk_id)? {
                out.push(chunk);
            }
        }
        Ok(out)
    }

    // ---- ownership (task <-> chunk) --------------------------------

    pub fn tag_chunk(&mut self, task_id: &str, chunk_id: &str) -> Result<(), StoreError> {
        let tagged_at = Utc::now().to_rfc3339();
        let forward = pack2(task_id, chunk_id);
        let reverse = pack2(chunk_id, task_id);
        self.tables.task_chunks.put(&mut self.txn, &forward, &tagged_at)?;
        self.tables.chunk_tasks.put(&mut self.txn, &reverse, &tagged_at)?;
        Ok(())
    }

    pub fn chunks_owned_by(&self, task_id: &str) -> Result<Vec<String>, StoreError> {
        let prefix = keys::task_prefix(task_id);
        let mut out = Vec::new();
        for entry in self.tables.task_chunks.prefix_iter(&self.txn, &prefix)? {
            let (key, _) = entry?;
            if let Some((_, chunk_id)) = unpack2(key) {
                out.push(chunk_id.to_string());
            }
        }
        Ok(out)
    }

    pub fn tasks_owning(&self, chunk_id: &str) -> Result<Vec<String>, StoreError> {
        let prefix = keys::task_prefix(chunk_id);
        let mut out = Vec::new();
        for entry in self.tables.chunk_tasks.prefix_iter(&self.txn, &prefix)? {
            let (key, _) = entry?;
            if let Some((_, task_id)) = unpack2(key) {
                out.push(task_id.to_string());
            }
        }
        Ok(out)
    }

    // ---- reference edges --------------------------------------------

    pub fn put_reference_edge(&mut self, edge: &ReferenceEdge) -> Result<(), StoreError> {
        let forward = pack3(&edge.source_task_id, &edge.target_chunk_id, edge.reference_type.as_str());
        let reverse = pack3(&edge.target_chunk_id, &edge.source_task_id, edge.reference_type.as_str());
        let created_at = edge.created_at.to_rfc3339();
        self.tables.reference_edges.put(&mut self.txn, &forward, &created_at)?;
        self.tables
            .reference_edges_by_chunk
            .put(&mut self.txn, &reverse, &created_at)?;
        Ok(())
    }

    pub fn reference_edges_from(&self, task_id: &str) -> Result<Vec<ReferenceEdge>, StoreError> {
        let prefix = keys::task_prefix(task_id);
        let mut out = Vec::new();
        for entry in self.tables.reference_edges.prefix_iter(&self.txn, &prefix)? {
            let (key, created_at) = entry?;
            if let Some(edge) = decode_forward_edge(key, created_at)? {
                out.push(edge);
            }
        }
        Ok(out)
    }

    /// Reference edges whose target is `chunk_id` — used by the
    /// active-reference eviction rule.
    pub fn reference_edges_to(&self, chunk_id: &str) -> Result<Vec<ReferenceEdge>, StoreError> {
        let prefix = keys::task_prefix(chunk_id);
        let mut out = Vec::new();
        for entry in self.tables.reference_edges_by_chunk.prefix_iter(&self.txn, &prefix)? {
            let (key, created_at) = entry?;
            if let Some(edge) = decode_reverse_edge(key, created_at)? {
                out.push(edge);
            }
        }
        Ok(out)
    }

    // ---- compaction events -------------------------------------------

    pub fn next_event_id(&mut self) -> Result<u64, StoreError> {
        let current = self
            .tables
            .metadata
            .get(&self.txn, "next_event_id")?
            .and_then(|bytes| bytes.try_into().ok())
            .map(u64::from_be_bytes)
            .unwrap_or(0);
        self.tables
            .metadata
            .put(&mut self.txn, "next_event_id", &(current + 1).to_be_bytes())?;
        Ok(current)
    }

    pub fn put_compaction_event(&mut self, event: &CompactionEvent) -> Result<(), StoreError> {
        let bytes = postcard::to_stdvec(event)?;
        self.tables.compaction_events.put(&mut self.txn, &event.id, &bytes)?;
        Ok(())
    }

    pub fn get_compaction_event(&self, id: u64) -> Result<Option<CompactionEvent>, StoreError> {
        match self.tables.compaction_events.get(&self.txn, &id)? {
            Some(bytes) => Ok(Some(postcard::from_bytes(bytes)?)),
            None => Ok(None),
        }
    }

    pub fn list_compaction_events(&self) -> Result<Vec<CompactionEvent>, StoreError> {
        let mut out = Vec::new();
        for entry in self.tables.compaction_events.iter(&self.txn)? {
            let (_, bytes) = entry?;
            out.push(postcard::from_bytes(bytes)?);
        }
        Ok(out)
    }
}

fn dependency_prefix(dependency_task_id: &str) -> Vec<u8> {
    let mut prefix = dependency_task_id.as_bytes().to_vec();
    prefix.push(0);
    prefix
}

fn decode_forward_edge(key: &[u8], created_at: &str) -> Result<Option<ReferenceEdge>, StoreError> {
    let Some((source_task_id, rest)) = split_once(key) else {
        return Ok(None);
    };
    let Some((target_chunk_id, reference_type)) = split_once(rest) else {
        return Ok(None);
    };
    Ok(Some(ReferenceEdge {
        source_task_id: source_task_id.to_string(),
        target_chunk_id: target_chunk_id.to_string(),
        reference_type: std::str::from_utf8(reference_type)
            .unwrap_or_default()
            .parse::<ReferenceType>()?,
        created_at: parse_rfc3339(created_at),
    }))
}

fn decode_reverse_edge(key: &[u8], created_at: &str) -> Result<Option<ReferenceEdge>, StoreError> {
    let Some((target_chunk_id, rest)) = split_once(key) else {
        return Ok(None);
    };
    let Some((source_task_id, reference_type)) = split_once(rest) else {
        return Ok(None);
    };
    Ok(Some(ReferenceEdge {
        source_task_id: source_task_id.to_string(),
        target_chunk_id: target_chunk_id.to_string(),
        reference_type: std::str::from_utf8(reference_type)
            .unwrap_or_default()
            .parse::<ReferenceType>()?,
        created_at: parse_rfc3339(created_at),
    }))
}

fn split_once(bytes: &[u8]) -> Option<(&str, &[u8])> {
    let idx = bytes.iter().position(|&b| b == 0)?;
    let head = std::str::from_utf8(&bytes[..idx]).ok()?;
    Some((head, &bytes[idx + 1..]))
}

fn parse_rfc3339(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
