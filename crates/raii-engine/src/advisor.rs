//! Runs the engine, materialises the hint document and compliance
//! monitor sidecars, and tracks hint compliance over time (spec §4.5).

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use raii_model::CompactionEvent;
use raii_store::StoreTxn;
use serde::{Deserialize, Serialize};

use crate::eviction::{ChunkDecision, EvictionEngine, EvictionReport};
use crate::error::EngineError;
use crate::registry::TaskRegistry;

const HINT_DOCUMENT_FILE: &str = "eviction_hints.json";
const COMPLIANCE_MONITOR_FILE: &str = "compliance_monitor.json";

/// Inline caps on the human-readable `compaction_guidance` listing
/// (spec §4.5): "first 20 evictable + first 10 preserved listed
/// inline; the rest referenced by pointer to the document."
const GUIDANCE_EVICTABLE_CAP: usize = 20;
const GUIDANCE_PRESERVED_CAP: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafeToEvict {
    pub chunk_id: String,
    pub tool_name: String,
    pub size_tokens: u32,
    pub is_refetchable: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalToPreserve {
    pub chunk_id: String,
    pub tool_name: String,
    pub size_tokens: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveTaskSummary {
    pub id: String,
    pub subject: String,
    pub status: String,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintDocument {
    pub generated_at: DateTime<Utc>,
    pub token_savings_estimate: u64,
    pub safe_to_evict: Vec<SafeToEvict>,
    pub critical_to_preserve: Vec<CriticalToPreserve>,
    pub active_tasks_summary: Vec<ActiveTaskSummary>,
    pub compaction_guidance: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceMonitor {
    pub compaction_event_id: u64,
    pub session_id: String,
    pub evictable_chunk_ids: Vec<String>,
    pub preserved_chunk_ids: Vec<String>,
    pub evictable_file_paths: Vec<String>,
    pub preserved_file_paths: Vec<String>,
}

pub struct CompactionAdvisor {
    db_dir: PathBuf,
}

impl CompactionAdvisor {
    pub fn new(db_dir: impl Into<PathBuf>) -> Self {
        Self { db_dir: db_dir.into() }
    }

    fn hint_path(&self) -> PathBuf {
        self.db_dir.join(HINT_DOCUMENT_FILE)
    }

    fn compliance_path(&self) -> PathBuf {
        self.db_dir.join(COMPLIANCE_MONITOR_FILE)
    }

    /// Runs the engine, writes both sidecar documents, and logs a
    /// `CompactionEvent`. Returns the hint document's
    /// `compaction_guidance` string — the only value the pre-compact
    /// interceptor surfaces to the host.
    pub fn run_and_publish(&self, txn: &mut StoreTxn<'_>, session_id: &str, abandon_threshold: usize) -> Result<String, EngineError> {
        let report = EvictionEngine::run(txn, true, abandon_threshold)?;
        let active_tasks = active_tasks_summary(txn, &report)?;
        let hint_doc = build_hint_document(&report, active_tasks);
        write_json(&self.hint_path(), &hint_doc)?;

        let event_id = txn.next_event_id()?;
        let event = CompactionEvent {
            id: event_id,
            session_id: session_id.to_string(),
            compacted_at: Utc::now(),
            hints_evictable_count: hint_doc.safe_to_evict.len() as u32,
            hints_preserved_count: hint_doc.critical_to_preserve.len() as u32,
            hints_evictable_tokens: report.evictable_tokens,
            confirmed_evicted: 0,
            false_negatives: 0,
            compliance_rate: None,
        };
        txn.put_compaction_event(&event)?;

        let monitor = build_compliance_monitor(event_id, session_id, &report);
        write_json(&self.compliance_path(), &monitor)?;

        Ok(hint_doc.compaction_guidance)
    }

    /// Called from the post-tool interceptor after a file-read chunk is
    /// ingested: looks up the currently-logged compliance monitor and
    /// increments the matching counter on its `CompactionEvent`.
    /// Recomputes the compliance ratio on every call (spec §7
    /// supplement, matching `CompactionAdvisor.record_refetch` in the
    /// original source).
    pub fn record_refetch(&self, txn: &mut StoreTxn<'_>, path: &str) -> Result<(), EngineError> {
        let Some(monitor) = read_compliance_monitor(&self.compliance_path())? else {
            return Ok(());
        };
        let Some(mut event) = txn.get_compaction_event(monitor.compaction_event_id)? else {
            return Ok(());
        };

        if monitor.evictable_file_paths.iter().any(|p| p == path) {
            event.confirmed_evicted += 1;
        } else if monitor.preserved_file_paths.iter().any(|p| p == path) {
            event.false_negatives += 1;
        } else {
            return Ok(());
        }

        event.recompute_compliance();
        txn.put_compaction_event(&event)?;
        Ok(())
    }
}

fn active_tasks_summary(txn: &mut StoreTxn<'_>, _report: &EvictionReport) -> Result<Vec<ActiveTaskSummary>, EngineError> {
    let active_tasks = TaskRegistry::new(txn).list_active()?;
    let mut out = Vec::with_capacity(active_tasks.len());
    for task in active_tasks {
        let chunk_count = txn.chunks_owned_by(&task.id)?.len();
        out.push(ActiveTaskSummary {
            id: task.id,
            subject: task.subject,
            status: task.status.as_str().to_string(),
            chunk_count,
        });
    }
    Ok(out)
}

fn build_hint_document(report: &EvictionReport, active_tasks: Vec<ActiveTaskSummary>) -> HintDocument {
    let safe_to_evict: Vec<SafeToEvict> = report
        .evictable
        .iter()
        .map(|d| SafeToEvict {
            chunk_id: d.chunk_id.clone(),
            tool_name: d.tool_name.clone(),
            size_tokens: d.size_tokens,
            is_refetchable: d.is_refetchable,
            reason: d.reason.to_string(),
        })
        .collect();

    let critical_to_preserve: Vec<CriticalToPreserve> = report
        .preserved
        .iter()
        .map(|d| CriticalToPreserve {
            chunk_id: d.chunk_id.clone(),
            tool_name: d.tool_name.clone(),
            size_tokens: d.size_tokens,
            reason: d.reason.to_string(),
        })
        .collect();

    let compaction_guidance = render_guidance(&safe_to_evict, &critical_to_preserve);

    HintDocument {
        generated_at: Utc::now(),
        token_savings_estimate: report.evictable_tokens,
        safe_to_evict,
        critical_to_preserve,
        active_tasks_summary: active_tasks,
        compaction_guidance,
    }
}

fn render_guidance(evictable: &[SafeToEvict], preserved: &[CriticalToPreserve]) -> String {
    let mut guidance = format!(
        "{} chunks safe to evict, {} chunks must be preserved.\n",
        evictable.len(),
        preserved.len()
    );

    guidance.push_str("Safe to evict:\n");
    for entry in evictable.iter().take(GUIDANCE_EVICTABLE_CAP) {
        guidance.push_str(&format!("  - {} ({}, {} tokens, {})\n", entry.chunk_id, entry.tool_name, entry.size_tokens, entry.reason));
    }
    if evictable.len() > GUIDANCE_EVICTABLE_CAP {
        guidance.push_str(&format!("  ... and {} more, see eviction_hints.json\n", evictable.len() - GUIDANCE_EVICTABLE_CAP));
    }

    guidance.push_str("Must preserve:\n");
    for entry in preserved.iter().take(GUIDANCE_PRESERVED_CAP) {
        guidance.push_str(&format!("  - {} ({}, {} tokens, {})\n", entry.chunk_id, entry.tool_name, entry.size_tokens, entry.reason));
    }
    if preserved.len() > GUIDANCE_PRESERVED_CAP {
        guidance.push_str(&format!("  ... and {} more, see eviction_hints.json\n", preserved.len() - GUIDANCE_PRESERVED_CAP));
    }

    guidance
}

fn build_compliance_monitor(event_id: u64, session_id: &str, report: &EvictionReport) -> ComplianceMonitor {
    let file_paths = |decisions: &[ChunkDecision]| -> Vec<String> { decisions.iter().filter_map(|d| d.file_path.clone()).collect() };

    ComplianceMonitor {
        compaction_event_id: event_id,
        session_id: session_id.to_string(),
        evictable_chunk_ids: report.evictable.iter().map(|d| d.chunk_id.clone()).collect(),
        preserved_chunk_ids: report.preserved.iter().map(|d| d.chunk_id.clone()).collect(),
        evictable_file_paths: file_paths(&report.evictable),
        preserved_file_paths: file_paths(&report.preserved),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), EngineError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    fs::write(path, bytes)?;
    Ok(())
}

fn read_compliance_monitor(path: &Path) -> Result<Option<ComplianceMonitor>, EngineError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}
