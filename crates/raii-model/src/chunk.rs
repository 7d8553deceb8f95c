use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::canonical::canonical_json;

/// Tools whose results can be re-fetched on demand from the host — a
/// chunk for one of these is safe to drop without losing information
/// the assistant can't get back.
pub const REFETCHABLE_TOOLS: &[&str] = &["Read", "Glob", "Grep", "WebFetch", "WebSearch"];

pub fn is_refetchable(tool_name: &str) -> bool {
    REFETCHABLE_TOOLS.contains(&tool_name)
}

/// Status of a [`ContextChunk`]. Monotonic toward `evictable` — once
/// evictable, terminal (spec §3 invariant).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStatus {
    Fresh,
    /// Reserved for a future external-signal promotion path; no
    /// current code path transitions a chunk into this state (spec §9
    /// Open Questions).
    Integrated,
    Evictable,
}

/// The retained result of one tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextChunk {
    /// The host's invocation id, reused as the chunk id.
    pub id: String,
    pub tool_name: String,
    pub tool_input: Value,
    pub is_refetchable: bool,
    pub status: ChunkStatus,
    pub size_tokens: u32,
    pub created_at: DateTime<Utc>,
    pub status_changed_at: DateTime<Utc>,
    pub session_id: Option<String>,
    pub content_hash: String,
}

impl ContextChunk {
    pub fn new(
        id: impl Into<String>,
        tool_name: impl Into<String>,
        tool_input: Value,
        output_text: &str,
        session_id: Option<String>,
    ) -> Self {
        let tool_name = tool_name.into();
        let now = Utc::now();
        Self {
            id: id.into(),
            is_refetchable: is_refetchable(&tool_name),
            size_tokens: estimate_tokens(output_text),
            content_hash: content_hash(output_text),
            tool_name,
            tool_input,
            status: ChunkStatus::Fresh,
            created_at: now,
            status_changed_at: now,
            session_id,
        }
    }

    pub fn set_status(&mut self, status: ChunkStatus) {
        self.status = status;
        self.status_changed_at = Utc::now();
    }

    /// `tool_name + "::" + canonical(tool_input)` — the supersession
    /// signature from spec §4.4. Two chunks produced by the same tool
    /// with semantically-equal input collide on this key.
    pub fn signature(&self) -> String {
        format!("{}::{}", self.tool_name, canonical_json(&self.tool_input))
    }
}

/// `ceil(chars / 4)`, floor 1 — a deliberately rough per-tool-uncalibrated
/// estimate (spec §9 Open Questions).
pub fn estimate_tokens(text: &str) -> u32 {
    let chars = text.chars().count();
    (chars.div_ceil(4)).max(1) as u32
}

/// First 16 hex characters of the SHA-256 digest of `text`.
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    hex_prefix(&digest, 8)
}

fn hex_prefix(bytes: &[u8], n: usize) -> String {
    bytes
        .iter()
        .take(n)
        .map(|b| format!("{b:02x}"))
        .collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn estimate_tokens_floors_at_one() {
        assert_eq!(estimate_tokens(""), 1);
        assert_eq!(estimate_tokens("a"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn content_hash_is_16_hex_chars() {
        let h = content_hash("hello world");
        assert_eq!(h.len(), 16);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_is_stable_across_key_order() {
        let a = ContextChunk::new("1", "Read", json!({"file_path": "x", "limit": 5}), "txt", None);
        let b = ContextChunk::new("2", "Read", json!({"limit": 5, "file_path": "x"}), "txt", None);
        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn refetchable_tools_are_recognized() {
        assert!(is_refetchable("Read"));
        assert!(is_refetchable("Grep"));
        assert!(!is_refetchable("Edit"));
        assert!(!is_refetchable("Bash"));
    }
}
