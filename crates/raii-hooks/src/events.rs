//! Inbound event shapes (spec §6: "Interception event inbound").

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct PreToolEvent {
    pub session_id: String,
    pub tool_name: String,
    pub tool_use_id: String,
    #[serde(default)]
    pub tool_input: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostToolEvent {
    pub session_id: String,
    pub tool_name: String,
    pub tool_use_id: String,
    #[serde(default)]
    pub tool_input: Value,
    #[serde(default)]
    pub tool_response: Option<Value>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompactTrigger {
    Manual,
    Auto,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreCompactEvent {
    pub session_id: String,
    pub trigger: CompactTrigger,
    #[serde(default)]
    pub context_window_tokens: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStartSource {
    Startup,
    Compact,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionStartEvent {
    pub session_id: String,
    pub source: SessionStartSource,
}
