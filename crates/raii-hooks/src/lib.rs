//! Shared plumbing for the five interceptor binaries: event/decision
//! JSON contracts, the pending-tag sidecar, file logging, CLI parsing,
//! and environment-resolved configuration.
//!
//! Every binary follows the same shape: parse CLI, init logging, open
//! the store, read one event from stdin, do its work inside one
//! transaction, print a [`Decision`], and exit 0 regardless of what
//! happened internally (spec §7: "every other failure is swallowed and
//! logged").

pub mod cli;
pub mod config;
pub mod decision;
pub mod events;
pub mod lifecycle;
pub mod logging;
pub mod pending_tag;

pub use cli::HookCli;
pub use decision::Decision;

use std::io::Read;

use serde::de::DeserializeOwned;

pub fn read_event<T: DeserializeOwned>() -> anyhow::Result<T> {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(serde_json::from_str(&buf)?)
}

/// Runs `f`, logging and degrading to [`Decision::empty`] on any
/// error. This is the single user-visible-error boundary the spec
/// calls out (the pre-tool block decision) made explicit: every other
/// failure path funnels through here.
pub fn run_neutral_on_error<F>(label: &str, f: F) -> Decision
where
    F: FnOnce() -> anyhow::Result<Decision>,
{
    match f() {
        Ok(decision) => decision,
        Err(err) => {
            tracing::error!(hook = label, error = %err, "hook failed, degrading to neutral decision");
            Decision::empty()
        }
    }
}
