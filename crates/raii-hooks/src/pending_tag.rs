//! The pending-tag sidecar: a single-slot document written by pre-tool
//! and consumed by post-tool to attribute a result to the task that
//! was active *at pre-tool time* (spec §4.6, §5).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

const PENDING_TAG_FILE: &str = "pending_tag.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTag {
    pub invocation_id: String,
    pub tool_name: String,
    pub tool_input: Value,
    pub session_id: String,
    pub active_task_id: Option<String>,
}

fn path(db_dir: &Path) -> PathBuf {
    db_dir.join(PENDING_TAG_FILE)
}

pub fn write(db_dir: &Path, tag: &PendingTag) -> std::io::Result<()> {
    fs::create_dir_all(db_dir)?;
    let bytes = serde_json::to_vec(tag).unwrap_or_default();
    fs::write(path(db_dir), bytes)
}

/// Reads the slot, returning `None` if absent, unreadable, or tagged
/// for a different invocation than `expected_invocation_id` — the
/// "otherwise treat the tag as absent" rule from spec §5.
pub fn read_for(db_dir: &Path, expected_invocation_id: &str) -> Option<PendingTag> {
    let bytes = fs::read(path(db_dir)).ok()?;
    let tag: PendingTag = serde_json::from_slice(&bytes).ok()?;
    if tag.invocation_id == expected_invocation_id {
        Some(tag)
    } else {
        None
    }
}
