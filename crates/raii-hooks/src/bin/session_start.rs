//! Session-bootstrap interceptor (spec §4.6 "Session-bootstrap").

use clap::Parser;
use raii_hooks::events::{SessionStartEvent, SessionStartSource};
use raii_hooks::{config, run_neutral_on_error, Decision, HookCli};
use raii_model::{ChunkStatus, TaskStatus};
use raii_store::Store;

const WORKFLOW_CONTRACT: &str = "\
Before starting any work, create a task (TaskCreate). Mark it in_progress before touching \
files or running commands. Mark it completed as soon as the work is done. Tasks left \
in_progress with no further activity will eventually be treated as abandoned.";

fn main() {
    let cli = HookCli::parse();
    let db_dir = config::resolve_db_dir(cli.db_dir);
    raii_hooks::logging::init(&db_dir);

    let decision = run_neutral_on_error("session-start", || {
        let event: SessionStartEvent = raii_hooks::read_event()?;

        let mut context = WORKFLOW_CONTRACT.to_string();

        if event.source == SessionStartSource::Compact {
            let store = Store::open(&db_dir)?;
            let summary = store.transact(|txn| build_post_compaction_summary(txn))?;
            context.push_str("\n\n");
            context.push_str(&summary);
        }

        Ok(Decision::additional_context(context))
    });

    decision.print();
}

/// Grounded in `hooks/session_start.py`'s `_build_post_compaction_summary`:
/// active tasks, recently-completed tasks, fresh/evictable chunk
/// counts, and the token-savings estimate from the last published hint
/// document.
fn build_post_compaction_summary(txn: &mut raii_store::StoreTxn<'_>) -> Result<String, raii_engine::EngineError> {
    let tasks = txn.list_tasks()?;

    let mut active: Vec<_> = tasks.iter().filter(|t| t.status.is_active()).collect();
    active.sort_by_key(|t| t.created_at);

    let mut recently_completed: Vec<_> = tasks.iter().filter(|t| t.status == TaskStatus::Completed).collect();
    recently_completed.sort_by_key(|t| t.completed_at);
    recently_completed.reverse();
    recently_completed.truncate(5);

    let chunks = txn.list_chunks()?;
    let fresh_count = chunks.iter().filter(|c| c.status == ChunkStatus::Fresh).count();
    let evictable_count = chunks.iter().filter(|c| c.status == ChunkStatus::Evictable).count();

    let mut summary = String::from("Post-compaction state:\n");
    summary.push_str(&format!("- active tasks: {}\n", active.len()));
    for task in &active {
        summary.push_str(&format!("  - {} ({})\n", task.id, task.subject));
    }
    summary.push_str(&format!("- recently completed: {}\n", recently_completed.len()));
    for task in &recently_completed {
        summary.push_str(&format!("  - {} ({})\n", task.id, task.subject));
    }
    summary.push_str(&format!("- fresh chunks: {fresh_count}, evictable chunks: {evictable_count}\n"));

    if let Some(tokens) = last_hint_token_savings(txn) {
        summary.push_str(&format!("- last hint token-savings estimate: {tokens}\n"));
    }

    Ok(summary)
}

fn last_hint_token_savings(txn: &mut raii_store::StoreTxn<'_>) -> Option<u64> {
    let events = txn.list_compaction_events().ok()?;
    events.into_iter().max_by_key(|e| e.id).map(|e| e.hints_evictable_tokens)
}
