//! Pre-tool interceptor (spec §4.6 "Pre-tool").

use clap::Parser;
use raii_engine::TaskRegistry;
use raii_hooks::events::PreToolEvent;
use raii_hooks::lifecycle::apply_lifecycle_event;
use raii_hooks::{config, pending_tag, run_neutral_on_error, Decision, HookCli};
use raii_store::Store;

fn main() {
    let cli = HookCli::parse();
    let db_dir = config::resolve_db_dir(cli.db_dir);
    raii_hooks::logging::init(&db_dir);

    let decision = run_neutral_on_error("pre-tool-use", || {
        let event: PreToolEvent = raii_hooks::read_event()?;
        let store = Store::open(&db_dir)?;

        let decision = store.transact(|txn| {
            if raii_model::is_task_lifecycle_tool(&event.tool_name) {
                apply_lifecycle_event(&mut TaskRegistry::new(&mut *txn), &event.tool_name, &event.tool_input)?;
            }

            let active = TaskRegistry::new(&mut *txn).get_current_active()?;

            pending_tag::write(
                &db_dir,
                &pending_tag::PendingTag {
                    invocation_id: event.tool_use_id.clone(),
                    tool_name: event.tool_name.clone(),
                    tool_input: event.tool_input.clone(),
                    session_id: event.session_id.clone(),
                    active_task_id: active.as_ref().map(|t| t.id.clone()),
                },
            )?;

            let decision = if raii_model::is_work_tool(&event.tool_name) && active.is_none() {
                Decision::block("create a task before starting work (TaskCreate, then TaskUpdate to in_progress)")
            } else {
                Decision::empty()
            };
            Ok::<_, raii_engine::EngineError>(decision)
        })?;

        Ok(decision)
    });

    decision.print();
}
