//! Task/chunk registry, context tagging, the reference graph, the
//! eviction decision procedure, and the compaction advisor — the
//! engine that sits between `raii-hooks`' interceptors and
//! `raii-store`'s durable tables.

mod advisor;
mod error;
mod eviction;
mod extract;
mod graph;
mod registry;
mod tagger;

pub use advisor::{ActiveTaskSummary, CompactionAdvisor, ComplianceMonitor, CriticalToPreserve, HintDocument, SafeToEvict};
pub use error::EngineError;
pub use eviction::{
    ChunkDecision, EvictionEngine, EvictionReport, REASON_ALL_CLEAR, REASON_DEPENDENCY, REASON_OWNERSHIP, REASON_PREVIOUSLY_EVICTABLE,
    REASON_REFERENCED, REASON_SUPERSEDED,
};
pub use extract::extract_text;
pub use graph::ReferenceGraph;
pub use registry::{TaskRegistry, DEFAULT_ABANDON_THRESHOLD};
pub use tagger::{canonical_file_path, mutated_paths, ContextTagger};

#[cfg(test)]
mod tests {
    use super::*;
    use raii_model::{ReferenceType, TaskStatus};
    use raii_store::Store;
    use serde_json::json;
    use tempfile::tempdir;

    fn open_store() -> (tempfile::TempDir, Store) {
        let dir = tempdir().expect("tempdir");
        let store = Store::open(dir.path()).expect("open store");
        (dir, store)
    }

    #[test]
    fn sequential_clean_tasks_become_fully_evictable() {
        let (_dir, store) = open_store();

        for (task_idx, task_id) in ["t1", "t2", "t3"].iter().enumerate() {
            store
                .transact(|txn| {
                    let mut registry = TaskRegistry::new(txn);
                    registry.create(task_id, "do work", None)?;
                    registry.update_status(task_id, TaskStatus::InProgress)?;
                    Ok::<(), EngineError>(())
                })
                .unwrap();

            store
                .transact(|txn| {
                    let mut tagger = ContextTagger::new(txn);
                    for call in 0..3 {
                        let invocation_id = format!("{task_id}-call-{call}");
                        tagger.ingest(
                            &invocation_id,
                            "Read",
                            json!({"file_path": format!("/repo/file-{task_idx}-{call}.rs")}),
                            "contents",
                            Some("session-1".into()),
                            Some(*task_id),
                        )?;
                    }
                    Ok::<(), EngineError>(())
                })
                .unwrap();

            store
                .transact(|txn| {
                    TaskRegistry::new(txn).update_status(task_id, TaskStatus::Completed)?;
                    Ok::<(), EngineError>(())
                })
                .unwrap();
        }

        let report = store.transact(|txn| EvictionEngine::run(txn, true, DEFAULT_ABANDON_THRESHOLD)).unwrap();
        assert_eq!(report.preserved.len(), 0);
        assert_eq!(report.evictable.len(), 9);
    }

    #[test]
    fn reference_edge_blocks_eviction_until_referencer_completes() {
        let (_dir, store) = open_store();

        store
            .transact(|txn| {
                let mut registry = TaskRegistry::new(txn);
                registry.create("t1", "owns c1", None)?;
                registry.update_status("t1", TaskStatus::InProgress)?;
                registry.create("t2", "cites c1", None)?;
                registry.update_status("t2", TaskStatus::InProgress)?;
                Ok::<(), EngineError>(())
            })
            .unwrap();

        store
            .transact(|txn| {
                ContextTagger::new(txn).ingest("c1", "Read", json!({"file_path": "/a.rs"}), "content", None, Some("t1"))?;
                Ok::<(), EngineError>(())
            })
            .unwrap();

        store
            .transact(|txn| {
                TaskRegistry::new(txn).update_status("t1", TaskStatus::Completed)?;
                ReferenceGraph::new(txn).add_edge("t2", "c1", ReferenceType::CitedInReasoning)?;
                Ok::<(), EngineError>(())
            })
            .unwrap();

        let report = store.transact(|txn| EvictionEngine::run(txn, true, DEFAULT_ABANDON_THRESHOLD)).unwrap();
        assert_eq!(report.preserved.len(), 1);
        assert_eq!(report.preserved[0].reason, REASON_REFERENCED);

        store
            .transact(|txn| {
                TaskRegistry::new(txn).update_status("t2", TaskStatus::Completed)?;
                Ok::<(), EngineError>(())
            })
            .unwrap();

        let report = store.transact(|txn| EvictionEngine::run(txn, true, DEFAULT_ABANDON_THRESHOLD)).unwrap();
        assert_eq!(report.evictable.len(), 1);
    }

    #[test]
    fn write_invalidation_evicts_stale_reads_immediately() {
        let (_dir, store) = open_store();

        store
            .transact(|txn| {
                let mut registry = TaskRegistry::new(txn);
                registry.create("t1", "edit a file", None)?;
                registry.update_status("t1", TaskStatus::InProgress)?;
                Ok::<(), EngineError>(())
            })
            .unwrap();

        store
            .transact(|txn| {
                ContextTagger::new(txn).ingest("read-1", "Read", json!({"file_path": "/a.rs"}), "old content", None, Some("t1"))?;
                Ok::<(), EngineError>(())
            })
            .unwrap();

        let invalidated = store
            .transact(|txn| ContextTagger::new(txn).invalidate_reads_for_path("/a.rs"))
            .unwrap();
        assert_eq!(invalidated, 1);

        let chunk = store.transact(|txn| txn.get_chunk("read-1")).unwrap().unwrap();
        assert_eq!(chunk.status, raii_model::ChunkStatus::Evictable);
    }

    #[test]
    fn abandoned_task_releases_its_chunks() {
        let (_dir, store) = open_store();

        store
            .transact(|txn| {
                let mut registry = TaskRegistry::new(txn);
                registry.create("explore", "look around", None)?;
                registry.update_status("explore", TaskStatus::InProgress)?;
                Ok::<(), EngineError>(())
            })
            .unwrap();

        store
            .transact(|txn| {
                let mut tagger = ContextTagger::new(txn);
                for i in 0..55 {
                    let id = format!("read-{i}");
                    tagger.ingest(&id, "Read", json!({"file_path": format!("/f{i}.rs")}), "x", None, Some("explore"))?;
                }
                Ok::<(), EngineError>(())
            })
            .unwrap();

        let report = store.transact(|txn| EvictionEngine::run(txn, true, DEFAULT_ABANDON_THRESHOLD)).unwrap();
        assert!(report.evictable.len() as f64 / 55.0 >= 0.75);

        let task = store.transact(|txn| txn.get_task("explore")).unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Abandoned);
    }

    #[test]
    fn superseded_chunk_is_evictable_once_owning_task_completes() {
        let (_dir, store) = open_store();

        store
            .transact(|txn| {
                let mut registry = TaskRegistry::new(txn);
                registry.create("t1", "search repeatedly", None)?;
                registry.update_status("t1", TaskStatus::InProgress)?;
                Ok::<(), EngineError>(())
            })
            .unwrap();

        store
            .transact(|txn| {
                let mut tagger = ContextTagger::new(txn);
                tagger.ingest("g1", "Grep", json!({"pattern": "foo"}), "match 1", None, Some("t1"))?;
                tagger.ingest("g2", "Grep", json!({"pattern": "foo"}), "match 2", None, Some("t1"))?;
                Ok::<(), EngineError>(())
            })
            .unwrap();

        store
            .transact(|txn| {
                TaskRegistry::new(txn).update_status("t1", TaskStatus::Completed)?;
                Ok::<(), EngineError>(())
            })
            .unwrap();

        let report = store.transact(|txn| EvictionEngine::run(txn, true, DEFAULT_ABANDON_THRESHOLD)).unwrap();
        assert_eq!(report.evictable.len(), 2);
    }
}
