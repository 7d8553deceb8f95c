//! Outbound decision shapes (spec §6: "Interception decision outbound").
//! Every interceptor prints exactly one of these to stdout and exits 0.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Decision {
    Empty {},
    Block {
        decision: &'static str,
        reason: String,
    },
    AdditionalContext {
        #[serde(rename = "additionalContext")]
        additional_context: String,
    },
}

impl Decision {
    pub fn empty() -> Self {
        Decision::Empty {}
    }

    pub fn block(reason: impl Into<String>) -> Self {
        Decision::Block {
            decision: "block",
            reason: reason.into(),
        }
    }

    pub fn additional_context(text: impl Into<String>) -> Self {
        Decision::AdditionalContext {
            additional_context: text.into(),
        }
    }

    pub fn print(&self) {
        let body = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        println!("{body}");
    }
}
