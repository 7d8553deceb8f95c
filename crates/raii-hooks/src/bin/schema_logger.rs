//! Diagnostic hook (spec §7 supplement, grounded in
//! `hooks/schema_logger.py`): dumps raw event JSON plus a few derived
//! fields for learning the host's actual event shapes, independent of
//! the real interceptors.

use std::fs::OpenOptions;
use std::io::Write as _;

use chrono::Utc;
use clap::Parser;
use raii_hooks::{config, Decision};
use serde_json::{json, Value};

#[derive(Parser)]
struct SchemaLoggerCli {
    /// Which hook invoked this (pre_tool_use, post_tool_use, pre_compact, session_start).
    hook: String,

    #[arg(long)]
    db_dir: Option<std::path::PathBuf>,
}

fn main() {
    let cli = SchemaLoggerCli::parse();
    let db_dir = config::resolve_db_dir(cli.db_dir);

    let event: Value = raii_hooks::read_event().unwrap_or_else(|err| json!({"_parse_error": err.to_string()}));

    let keys: Vec<&String> = event.as_object().map(|m| m.keys().collect()).unwrap_or_default();
    let tool_response = event.get("tool_response");

    let record = json!({
        "hook": cli.hook,
        "timestamp": Utc::now().to_rfc3339(),
        "event": event,
        "keys": keys,
        "tool_result_type": tool_response.map(value_type_name),
        "tool_result_preview": tool_response.map(|v| truncate(&v.to_string(), 200)),
    });

    let _ = append_line(&db_dir, &record);

    Decision::empty().print();
}

fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

fn append_line(db_dir: &std::path::Path, record: &Value) -> std::io::Result<()> {
    std::fs::create_dir_all(db_dir)?;
    let mut file = OpenOptions::new().create(true).append(true).open(db_dir.join("schema_samples.jsonl"))?;
    writeln!(file, "{record}")
}
