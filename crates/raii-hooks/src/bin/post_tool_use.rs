//! Post-tool interceptor (spec §4.6 "Post-tool").

use clap::Parser;
use raii_engine::{mutated_paths, CompactionAdvisor, ContextTagger, EngineError, EvictionEngine};
use raii_hooks::config::abandon_threshold;
use raii_hooks::events::PostToolEvent;
use raii_hooks::lifecycle::{resolve_attribution, string_field};
use raii_hooks::{config, pending_tag, run_neutral_on_error, Decision, HookCli};
use raii_model::is_file_mutator;
use raii_store::Store;
use serde_json::json;

fn main() {
    let cli = HookCli::parse();
    let db_dir = config::resolve_db_dir(cli.db_dir);
    raii_hooks::logging::init(&db_dir);
    let threshold = abandon_threshold();

    let decision = run_neutral_on_error("post-tool-use", || {
        let event: PostToolEvent = raii_hooks::read_event()?;
        let store = Store::open(&db_dir)?;
        let response = event.tool_response.clone().unwrap_or_else(|| json!({}));

        let tag = pending_tag::read_for(&db_dir, &event.tool_use_id);
        let task_id = resolve_attribution(&event.tool_name, &event.tool_input, tag.and_then(|t| t.active_task_id));

        store.transact(|txn| {
            let output_text = raii_engine::extract_text(&event.tool_name, &event.tool_input, &response);
            ContextTagger::new(&mut *txn).ingest(
                &event.tool_use_id,
                &event.tool_name,
                event.tool_input.clone(),
                &output_text,
                Some(event.session_id.clone()),
                task_id.as_deref(),
            )?;

            if is_file_mutator(&event.tool_name) {
                for path in mutated_paths(&event.tool_input) {
                    ContextTagger::new(&mut *txn).invalidate_reads_for_path(&path)?;
                }
            }

            if event.tool_name == "TaskUpdate" && string_field(&event.tool_input, "status").as_deref() == Some("completed") {
                EvictionEngine::run(&mut *txn, true, threshold)?;
            }

            if event.tool_name == "Read" {
                if let Some(path) = string_field(&event.tool_input, "file_path") {
                    CompactionAdvisor::new(&db_dir).record_refetch(&mut *txn, &path)?;
                }
            }

            Ok::<_, EngineError>(())
        })?;

        Ok(Decision::empty())
    });

    decision.print();
}
