//! Tool-output text extraction (spec §4.3 "text extraction" table).
//!
//! Dispatches on a small tagged variant over known tool families rather
//! than branching on tool-name strings at every call site (spec §9:
//! "do not key behaviour on tool-name strings except where those
//! strings are part of the external contract"). Extraction only feeds
//! size estimation and content hashing — lossy but deterministic.

use raii_model::canonical_json;
use serde_json::Value;

enum ToolOutputShape {
    FileRead,
    Shell,
    FileWrite,
    Generic,
}

impl ToolOutputShape {
    fn for_tool(tool_name: &str) -> Self {
        match tool_name {
            "Read" => ToolOutputShape::FileRead,
            "Bash" => ToolOutputShape::Shell,
            "Edit" | "Write" | "MultiEdit" => ToolOutputShape::FileWrite,
            _ => ToolOutputShape::Generic,
        }
    }
}

pub fn extract_text(tool_name: &str, tool_input: &Value, output: &Value) -> String {
    match ToolOutputShape::for_tool(tool_name) {
        ToolOutputShape::FileRead => field_str(output, "content")
            .or_else(|| field_str(output, "file"))
            .unwrap_or_default(),
        ToolOutputShape::Shell => {
            let stdout = field_str(output, "stdout").unwrap_or_default();
            let stderr = field_str(output, "stderr").unwrap_or_default();
            format!("{stdout}{stderr}")
        }
        ToolOutputShape::FileWrite => {
            match field_str(output, "content").or_else(|| field_str(output, "new_content")) {
                Some(content) if !content.is_empty() => content,
                _ => field_str(tool_input, "file_path").unwrap_or_default(),
            }
        }
        ToolOutputShape::Generic => field_str(output, "text").unwrap_or_else(|| canonical_json(output)),
    }
}

fn field_str(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_read_extracts_content_field() {
        let text = extract_text("Read", &json!({}), &json!({"content": "fn main() {}"}));
        assert_eq!(text, "fn main() {}");
    }

    #[test]
    fn shell_concatenates_stdout_and_stderr() {
        let text = extract_text("Bash", &json!({}), &json!({"stdout": "ok\n", "stderr": "warn\n"}));
        assert_eq!(text, "ok\nwarn\n");
    }

    #[test]
    fn file_write_falls_back_to_edited_path_when_empty() {
        let text = extract_text("Write", &json!({"file_path": "/tmp/x.rs"}), &json!({"content": ""}));
        assert_eq!(text, "/tmp/x.rs");
    }

    #[test]
    fn generic_shape_falls_back_to_canonical_json() {
        let text = extract_text("WebSearch", &json!({}), &json!({"results": [1, 2]}));
        assert!(text.contains("results"));
    }
}
