//! Semantic reference edges (task → chunk), independent of ownership
//! (spec §4.4's "active-referenced set" consumes these).

use raii_model::{ReferenceEdge, ReferenceType};
use raii_store::StoreTxn;

use crate::error::EngineError;

pub struct ReferenceGraph<'t, 'env> {
    txn: &'t mut StoreTxn<'env>,
}

impl<'t, 'env> ReferenceGraph<'t, 'env> {
    pub fn new(txn: &'t mut StoreTxn<'env>) -> Self {
        Self { txn }
    }

    /// Inserts a reference edge; idempotent on `(task, chunk, type)`
    /// since the store key already encodes the triple.
    pub fn add_edge(&mut self, task_id: &str, chunk_id: &str, reference_type: ReferenceType) -> Result<(), EngineError> {
        self.txn.put_reference_edge(&ReferenceEdge::new(task_id, chunk_id, reference_type))?;
        Ok(())
    }

    pub fn edges_from(&self, task_id: &str) -> Result<Vec<ReferenceEdge>, EngineError> {
        Ok(self.txn.reference_edges_from(task_id)?)
    }

    pub fn edges_to(&self, chunk_id: &str) -> Result<Vec<ReferenceEdge>, EngineError> {
        Ok(self.txn.reference_edges_to(chunk_id)?)
    }
}
