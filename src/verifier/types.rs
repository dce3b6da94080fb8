use crate::trace::{BindingId, BorrowId, Mutability};
use crate::verifier::diagnostics::Verdict;
use serde::Serialize;

/// Everything one verification run produces: the accept/reject verdict plus
/// run statistics and final per-binding borrow states for tooling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    pub verdict: Verdict,
    pub stats: VerifierStats,
    pub binding_states: Vec<BindingStateSnapshot>,
}

impl VerificationReport {
    pub fn is_accept(&self) -> bool {
        self.verdict.is_accept()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VerifierStats {
    pub events_scanned: usize,
    pub scopes_entered: usize,
    pub bindings_declared: usize,
    pub borrows_tracked: usize,
    pub conflicts_checked: usize,
    pub diagnostics_emitted: usize,
    pub diagnostics_suppressed: usize,
}

/// Final borrow-tracker state of one binding at the end of the trace.
/// Ordered by binding id in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingStateSnapshot {
    pub binding: BindingId,
    pub name: String,
    pub mutability: Mutability,
    pub live_shared_borrows: Vec<BorrowId>,
    pub live_exclusive_borrow: Option<BorrowId>,
    pub moved_from: bool,
    pub scope_ended: bool,
}
