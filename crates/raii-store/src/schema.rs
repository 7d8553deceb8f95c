//! # Schema
//!
//! LMDB-backed persistence (via `heed3`) for the task/chunk ownership
//! graph. Tables map directly onto spec §3's data model; edge tables
//! that have no natural scalar key are packed per [`crate::keys`].
//!
//! | Database | Key | Value |
//! |---|---|---|
//! | `tasks` | task id | postcard [`raii_model::Task`] |
//! | `chunks` | chunk id | postcard [`raii_model::ContextChunk`] |
//! | `chunks_by_created_at` | `created_at \| chunk_id` | chunk id |
//! | `task_chunks` | `task_id \0 chunk_id` | tagged-at RFC3339 |
//! | `chunk_tasks` | `chunk_id \0 task_id` | tagged-at RFC3339 (reverse index) |
//! | `reference_edges` | `task_id \0 chunk_id \0 type` | created-at RFC3339 |
//! | `reference_edges_by_chunk` | `chunk_id \0 task_id \0 type` | created-at RFC3339 (reverse index) |
//! | `task_dependencies` | `dependent_id \0 dependency_id` | empty |
//! | `task_dependencies_by_dependency` | `dependency_id \0 dependent_id` | empty (reverse index) |
//! | `compaction_events` | event id (`u64`, BE) | postcard [`raii_model::CompactionEvent`] |
//! | `metadata` | string key | raw bytes |
//!
//! `metadata` carries a `schema_version` row and a `next_event_id`
//! counter, in place of SQLite's `AUTOINCREMENT`.
//!
//! Every write goes through [`crate::Store::write`], which commits on
//! `Ok` and drops (rolling back) the transaction on `Err` — the scoped
//! transactional accessor spec §4.1 calls for.

use std::fs;
use std::path::Path;

use heed3::byteorder::BE;
use heed3::types::{Bytes, Str, U64};
use heed3::{Database, Env, EnvOpenOptions};

use crate::error::StoreError;

const DB_TASKS: &str = "tasks";
const DB_CHUNKS: &str = "chunks";
const DB_CHUNKS_BY_CREATED_AT: &str = "chunks_by_created_at";
const DB_TASK_CHUNKS: &str = "task_chunks";
const DB_CHUNK_TASKS: &str = "chunk_tasks";
const DB_REFERENCE_EDGES: &str = "reference_edges";
const DB_REFERENCE_EDGES_BY_CHUNK: &str = "reference_edges_by_chunk";
const DB_TASK_DEPENDENCIES: &str = "task_dependencies";
const DB_TASK_DEPENDENCIES_BY_DEPENDENCY: &str = "task_dependencies_by_dependency";
const DB_COMPACTION_EVENTS: &str = "compaction_events";
const DB_METADATA: &str = "metadata";

const SCHEMA_VERSION: &str = "1";
const DEFAULT_MAP_SIZE_GB: u64 = 10;

pub(crate) struct Tables {
    pub tasks: Database<Str, Bytes>,
    pub chunks: Database<Str, Bytes>,
    pub chunks_by_created_at: Database<Bytes, Str>,
    pub task_chunks: Database<Bytes, Str>,
    pub chunk_tasks: Database<Bytes, Str>,
    pub reference_edges: Database<Bytes, Str>,
    pub reference_edges_by_chunk: Database<Bytes, Str>,
    pub task_dependencies: Database<Bytes, Bytes>,
    pub task_dependencies_by_dependency: Database<Bytes, Bytes>,
    pub compaction_events: Database<U64<BE>, Bytes>,
    pub metadata: Database<Str, Bytes>,
}

/// Process-wide handle to the durable store. Opens once per process;
/// cheap to clone (LMDB `Env` is an `Arc`-like handle internally).
#[derive(Clone)]
pub struct Store {
    pub(crate) env: Env,
    pub(crate) tables: std::sync::Arc<Tables>,
}

impl Store {
    /// Opens (creating if necessary) the store at `path`, then runs
    /// additive schema migrations.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size((DEFAULT_MAP_SIZE_GB * 1024 * 1024 * 1024) as usize)
                .max_dbs(16)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let tables = Tables {
            tasks: env.create_database(&mut wtxn, Some(DB_TASKS))?,
            chunks: env.create_database(&mut wtxn, Some(DB_CHUNKS))?,
            chunks_by_created_at: env.create_database(&mut wtxn, Some(DB_CHUNKS_BY_CREATED_AT))?,
            task_chunks: env.create_database(&mut wtxn, Some(DB_TASK_CHUNKS))?,
            chunk_tasks: env.create_database(&mut wtxn, Some(DB_CHUNK_TASKS))?,
            reference_edges: env.create_database(&mut wtxn, Some(DB_REFERENCE_EDGES))?,
            reference_edges_by_chunk: env.create_database(&mut wtxn, Some(DB_REFERENCE_EDGES_BY_CHUNK))?,
            task_dependencies: env.create_database(&mut wtxn, Some(DB_TASK_DEPENDENCIES))?,
            task_dependencies_by_dependency: env.create_database(&mut wtxn, Some(DB_TASK_DEPENDENCIES_BY_DEPENDENCY))?,
            compaction_events: env.create_database(&mut wtxn, Some(DB_COMPACTION_EVENTS))?,
            metadata: env.create_database(&mut wtxn, Some(DB_METADATA))?,
        };
        wtxn.commit()?;

        let store = Self {
            env,
            tables: std::sync::Arc::new(tables),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Additive, idempotent migrations keyed by `schema_version`. There
    /// is exactly one version today; future migrations append match
    /// arms rather than rewriting this one, matching the teacher's
    /// "ALTER TABLE ... tolerant of column-exists errors" posture,
    /// adapted to a KV store where "tolerant" means "no-op if already
    /// at or past that version."
    fn migrate(&self) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn()?;
        let current = self
            .tables
            .metadata
            .get(&wtxn, "schema_version")?
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned());

        if current.as_deref() != Some(SCHEMA_VERSION) {
            self.tables
                .metadata
                .put(&mut wtxn, "schema_version", SCHEMA_VERSION.as_bytes())?;
            if self.tables.metadata.get(&wtxn, "next_event_id")?.is_none() {
                self.tables
                    .metadata
                    .put(&mut wtxn, "next_event_id", &0u64.to_be_bytes())?;
            }
        }
        wtxn.commit()?;
        Ok(())
    }
}
