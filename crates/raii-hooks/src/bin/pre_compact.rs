//! Pre-compact interceptor (spec §4.6 "Pre-compact").

use clap::Parser;
use raii_hooks::config::abandon_threshold;
use raii_hooks::events::PreCompactEvent;
use raii_hooks::{config, run_neutral_on_error, Decision, HookCli};
use raii_store::Store;

fn main() {
    let cli = HookCli::parse();
    let db_dir = config::resolve_db_dir(cli.db_dir);
    raii_hooks::logging::init(&db_dir);
    let threshold = abandon_threshold();

    // Failures degrade to empty guidance, never to a block: compaction
    // itself must never fail closed on a broken advisor run.
    let decision = run_neutral_on_error("pre-compact", || {
        let event: PreCompactEvent = raii_hooks::read_event()?;
        let store = Store::open(&db_dir)?;

        let guidance = store.transact(|txn| raii_engine::CompactionAdvisor::new(&db_dir).run_and_publish(txn, &event.session_id, threshold))?;

        Ok(Decision::additional_context(guidance))
    });

    match decision {
        Decision::AdditionalContext { .. } => decision.print(),
        _ => Decision::additional_context(String::new()).print(),
    }
}
