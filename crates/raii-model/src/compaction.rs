use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-compaction telemetry row. Counters are updated after the fact by
/// `record_refetch` as the compliance monitor observes re-fetches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompactionEvent {
    pub id: u64,
    pub session_id: String,
    pub compacted_at: DateTime<Utc>,
    pub hints_evictable_count: u32,
    pub hints_preserved_count: u32,
    pub hints_evictable_tokens: u64,
    pub confirmed_evicted: u32,
    pub false_negatives: u32,
    pub compliance_rate: Option<f64>,
}

impl CompactionEvent {
    pub fn recompute_compliance(&mut self) {
        if self.hints_evictable_count > 0 {
            self.compliance_rate =
                Some(f64::from(self.confirmed_evicted) / f64::from(self.hints_evictable_count));
        }
    }
}
