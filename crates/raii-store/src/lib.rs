//! Durable persistence for the context-RAII task/chunk ownership graph.
//!
//! Wraps `heed3` (LMDB) the same way `storage_core` wraps its backend
//! for the graph engine above it: callers never see `heed3` types,
//! only [`Store`], [`StoreTxn`], and domain structs from `raii-model`.

mod error;
mod keys;
mod schema;
mod txn;

pub use error::StoreError;
pub use schema::Store;
pub use txn::StoreTxn;

#[cfg(test)]
mod tests {
    use super::*;
    use raii_model::{ContextChunk, ReferenceEdge, ReferenceType, Task, TaskDependency, TaskStatus};
    use serde_json::json;
    use tempfile::tempdir;

    fn open_store() -> (tempfile::TempDir, Store) {
        let dir = tempdir().expect("tempdir");
        let store = Store::open(dir.path()).expect("open store");
        (dir, store)
    }

    #[test]
    fn put_and_get_task_roundtrips() {
        let (_dir, store) = open_store();
        let task = Task::new("t1", "write the thing", None);
        store
            .transact(|txn| {
                txn.put_task(&task)?;
                Ok::<(), StoreError>(())
            })
            .unwrap();

        let fetched = store.transact(|txn| txn.get_task("t1")).unwrap();
        assert_eq!(fetched, Some(task));
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let (_dir, store) = open_store();
        let task = Task::new("t1", "subject", None);
        let result: Result<(), StoreError> = store.transact(|txn| {
            txn.put_task(&task)?;
            Err(StoreError::Backend("simulated failure".into()))
        });
        assert!(result.is_err());

        let fetched = store.transact(|txn| txn.get_task("t1")).unwrap();
        assert_eq!(fetched, None);
    }

    #[test]
    fn list_chunks_is_ascending_by_created_at() {
        let (_dir, store) = open_store();
        let mut c1 = ContextChunk::new("a", "Read", json!({"file_path": "x"}), "hello", None);
        let mut c2 = ContextChunk::new("b", "Read", json!({"file_path": "y"}), "world", None);
        c1.created_at = chrono::Utc::now() - chrono::Duration::seconds(10);
        c2.created_at = chrono::Utc::now();

        store
            .transact(|txn| {
                txn.put_chunk(&c2)?;
                txn.put_chunk(&c1)?;
                Ok::<(), StoreError>(())
            })
            .unwrap();

        let chunks = store.transact(|txn| txn.list_chunks()).unwrap();
        assert_eq!(chunks.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn ownership_is_bidirectional() {
        let (_dir, store) = open_store();
        let chunk = ContextChunk::new("c1", "Bash", json!({"command": "ls"}), "out", None);
        store
            .transact(|txn| {
                txn.put_chunk(&chunk)?;
                txn.tag_chunk("t1", "c1")?;
                txn.tag_chunk("t2", "c1")?;
                Ok::<(), StoreError>(())
            })
            .unwrap();

        let owners = store.transact(|txn| txn.tasks_owning("c1")).unwrap();
        assert_eq!(owners.len(), 2);
        let owned = store.transact(|txn| txn.chunks_owned_by("t1")).unwrap();
        assert_eq!(owned, vec!["c1".to_string()]);
    }

    #[test]
    fn reference_edges_are_queryable_from_either_side() {
        let (_dir, store) = open_store();
        let edge = ReferenceEdge::new("t1", "c1", ReferenceType::BuildsOn);
        store
            .transact(|txn| {
                txn.put_reference_edge(&edge)?;
                Ok::<(), StoreError>(())
            })
            .unwrap();

        let from_task = store.transact(|txn| txn.reference_edges_from("t1")).unwrap();
        assert_eq!(from_task.len(), 1);
        let to_chunk = store.transact(|txn| txn.reference_edges_to("c1")).unwrap();
        assert_eq!(to_chunk.len(), 1);
        assert_eq!(to_chunk[0].reference_type, ReferenceType::BuildsOn);
    }

    #[test]
    fn dependents_are_found_by_dependency() {
        let (_dir, store) = open_store();
        let dep = TaskDependency {
            dependent_task_id: "t2".into(),
            dependency_task_id: "t1".into(),
        };
        store
            .transact(|txn| {
                txn.put_task_dependency(&dep)?;
                Ok::<(), StoreError>(())
            })
            .unwrap();

        let dependents = store.transact(|txn| txn.dependents_of("t1")).unwrap();
        assert_eq!(dependents, vec!["t2".to_string()]);
    }

    #[test]
    fn task_status_roundtrips_through_transition() {
        let (_dir, store) = open_store();
        let mut task = Task::new("t1", "subject", None);
        task.transition(TaskStatus::InProgress);
        task.transition(TaskStatus::Completed);
        store
            .transact(|txn| {
                txn.put_task(&task)?;
                Ok::<(), StoreError>(())
            })
            .unwrap();

        let fetched = store.transact(|txn| txn.get_task("t1")).unwrap().unwrap();
        assert_eq!(fetched.status, TaskStatus::Completed);
        assert!(fetched.completed_at.is_some());
    }

    #[test]
    fn compaction_event_ids_are_assigned_sequentially() {
        let (_dir, store) = open_store();
        let id1 = store.transact(|txn| txn.next_event_id()).unwrap();
        let id2 = store.transact(|txn| txn.next_event_id()).unwrap();
        assert_eq!(id1, 0);
        assert_eq!(id2, 1);
    }
}
