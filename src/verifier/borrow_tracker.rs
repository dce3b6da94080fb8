use crate::borrow_state_log;
use crate::{return_malformed_trace_error, return_unknown_borrow_error};
use crate::trace::{BindingId, BorrowId, BorrowKind, ScopeId, SourcePosition};
use crate::verifier::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticReporter};
use crate::verifier::scope_model::ScopeModel;
use crate::verifier::types::{BindingStateSnapshot, VerifierStats};
use crate::verifier_errors::VerifierError;
use rustc_hash::FxHashMap;

/// One registered borrow. Conflicting borrows are still recorded (tainted)
/// so later events naming them resolve instead of cascading.
#[derive(Debug, Clone)]
struct BorrowRecord {
    binding: BindingId,
    live: bool,
    tainted: bool,
}

/// Live-borrow multiset for one binding.
/// Invariant: `shared` is non-empty only while `exclusive` is `None`, and
/// there is never more than one live exclusive borrow.
#[derive(Debug, Default)]
struct BindingState {
    shared: Vec<BorrowId>,
    exclusive: Option<BorrowId>,
    moved_from: bool,
    scope_ended: bool,
    /// Statement position of the last diagnostic emitted against this
    /// binding. Further conflicts at the same position are suppressed.
    tainted_at: Option<SourcePosition>,
}

impl BindingState {
    fn has_live_borrow(&self) -> bool {
        self.exclusive.is_some() || !self.shared.is_empty()
    }

    fn live_borrows(&self) -> Vec<BorrowId> {
        let mut borrows = self.shared.clone();
        if let Some(exclusive) = self.exclusive {
            borrows.push(exclusive);
        }
        borrows
    }
}

/// Replays borrow, move, assign and use events in trace order, maintaining
/// each binding's live-borrow set and flagging conflicts immediately.
/// No backtracking: each event is judged against state at that point.
pub(super) struct BorrowTracker<'a> {
    model: &'a ScopeModel,
    /// When false the state machine still runs (snapshots stay meaningful)
    /// but no diagnostics are emitted.
    report_violations: bool,
    states: FxHashMap<BindingId, BindingState>,
    borrows: FxHashMap<BorrowId, BorrowRecord>,
    /// Borrows indexed by creation scope so a scope exit releases exactly
    /// the borrows created in it, not a scan of all live borrows.
    borrows_by_scope: FxHashMap<ScopeId, Vec<BorrowId>>,
}

impl<'a> BorrowTracker<'a> {
    pub(super) fn new(model: &'a ScopeModel, report_violations: bool) -> Self {
        Self {
            model,
            report_violations,
            states: FxHashMap::default(),
            borrows: FxHashMap::default(),
            borrows_by_scope: FxHashMap::default(),
        }
    }

    pub(super) fn on_binding_declare(&mut self, binding: BindingId) {
        self.states.insert(binding, BindingState::default());
    }

    pub(super) fn on_borrow_create(
        &mut self,
        borrow: BorrowId,
        binding: BindingId,
        kind: BorrowKind,
        creation_scope: ScopeId,
        position: SourcePosition,
        reporter: &mut DiagnosticReporter,
        stats: &mut VerifierStats,
    ) -> Result<(), VerifierError> {
        if self.borrows.contains_key(&borrow) {
            return_malformed_trace_error!(
                format!("Borrow '{}' is created twice in the trace", borrow),
                position,
                {
                    VerificationStage => "Borrow Tracking",
                }
            );
        }

        let binding_name = self.model.binding(binding, position)?.name.clone();
        stats.borrows_tracked += 1;
        stats.conflicts_checked += 1;

        let state = self.states.entry(binding).or_default();

        // Borrowing a dead or moved-from owner is a use of it.
        if state.moved_from || state.scope_ended {
            let message = if state.moved_from {
                format!("Cannot borrow '{}' after its value was moved", binding_name)
            } else {
                format!("Cannot borrow '{}' after its scope ended", binding_name)
            };

            emit(
                state,
                Diagnostic::new(
                    DiagnosticKind::UseAfterMove,
                    position,
                    binding,
                    vec![borrow],
                    message,
                ),
                self.report_violations,
                reporter,
                stats,
            );

            self.register(borrow, binding, creation_scope, true);
            return Ok(());
        }

        let conflict = match kind {
            BorrowKind::Exclusive if state.has_live_borrow() => {
                let existing = state.live_borrows();
                Some((
                    format!(
                        "Cannot create an exclusive borrow '{}' of '{}' while borrow '{}' is still live",
                        borrow, binding_name, existing[0]
                    ),
                    existing,
                ))
            }
            BorrowKind::Shared => state.exclusive.map(|exclusive| {
                (
                    format!(
                        "Cannot create a shared borrow '{}' of '{}' while exclusive borrow '{}' is still live",
                        borrow, binding_name, exclusive
                    ),
                    vec![exclusive],
                )
            }),
            _ => None,
        };

        if let Some((message, mut involved)) = conflict {
            involved.push(borrow);
            emit(
                state,
                Diagnostic::new(
                    DiagnosticKind::ConflictingBorrow,
                    position,
                    binding,
                    involved,
                    message,
                ),
                self.report_violations,
                reporter,
                stats,
            );

            // Registered for cascade suppression but never installed in the
            // live set, so the binding's invariant holds.
            self.register(borrow, binding, creation_scope, true);
            return Ok(());
        }

        match kind {
            BorrowKind::Shared => state.shared.push(borrow),
            BorrowKind::Exclusive => state.exclusive = Some(borrow),
        }

        borrow_state_log!(format!(
            "[Borrow] '{}' now holds {} shared / exclusive={:?}",
            binding_name,
            state.shared.len(),
            state.exclusive
        ));

        self.register(borrow, binding, creation_scope, false);
        Ok(())
    }

    pub(super) fn on_borrow_end(
        &mut self,
        borrow: BorrowId,
        position: SourcePosition,
    ) -> Result<(), VerifierError> {
        let Some(record) = self.borrows.get_mut(&borrow) else {
            return_unknown_borrow_error!(
                format!("Trace ends borrow '{}' which was never created", borrow),
                position,
                {
                    VerificationStage => "Borrow Tracking",
                }
            );
        };

        // Ending a borrow twice is a no-op, matching implicit release.
        if !record.live {
            return Ok(());
        }
        record.live = false;

        let binding = record.binding;
        let tainted = record.tainted;
        if !tainted {
            if let Some(state) = self.states.get_mut(&binding) {
                state.shared.retain(|live| *live != borrow);
                if state.exclusive == Some(borrow) {
                    state.exclusive = None;
                }
            }
        }

        Ok(())
    }

    pub(super) fn on_move(
        &mut self,
        binding: BindingId,
        position: SourcePosition,
        reporter: &mut DiagnosticReporter,
        stats: &mut VerifierStats,
    ) -> Result<(), VerifierError> {
        let binding_name = self.model.binding(binding, position)?.name.clone();
        stats.conflicts_checked += 1;
        let report_violations = self.report_violations;
        let state = self.states.entry(binding).or_default();

        if state.moved_from || state.scope_ended {
            let message = if state.moved_from {
                format!("Cannot move '{}' again: its value was already moved", binding_name)
            } else {
                format!("Cannot move '{}' after its scope ended", binding_name)
            };

            emit(
                state,
                Diagnostic::new(
                    DiagnosticKind::UseAfterMove,
                    position,
                    binding,
                    Vec::new(),
                    message,
                ),
                report_violations,
                reporter,
                stats,
            );
            return Ok(());
        }

        if state.has_live_borrow() {
            let involved = state.live_borrows();
            emit(
                state,
                Diagnostic::new(
                    DiagnosticKind::UseWhileBorrowed,
                    position,
                    binding,
                    involved,
                    format!("Cannot move '{}' while it is borrowed", binding_name),
                ),
                report_violations,
                reporter,
                stats,
            );
        }

        state.moved_from = true;
        Ok(())
    }

    pub(super) fn on_assign(
        &mut self,
        binding: BindingId,
        position: SourcePosition,
        reporter: &mut DiagnosticReporter,
        stats: &mut VerifierStats,
    ) -> Result<(), VerifierError> {
        let binding_name = self.model.binding(binding, position)?.name.clone();
        stats.conflicts_checked += 1;
        let report_violations = self.report_violations;
        let state = self.states.entry(binding).or_default();

        if state.scope_ended {
            emit(
                state,
                Diagnostic::new(
                    DiagnosticKind::UseAfterMove,
                    position,
                    binding,
                    Vec::new(),
                    format!("Cannot assign to '{}' after its scope ended", binding_name),
                ),
                report_violations,
                reporter,
                stats,
            );
            return Ok(());
        }

        if state.has_live_borrow() {
            let involved = state.live_borrows();
            emit(
                state,
                Diagnostic::new(
                    DiagnosticKind::UseWhileBorrowed,
                    position,
                    binding,
                    involved,
                    format!("Cannot assign to '{}' while it is borrowed", binding_name),
                ),
                report_violations,
                reporter,
                stats,
            );
        }

        // A fresh value makes the binding usable again.
        state.moved_from = false;
        Ok(())
    }

    pub(super) fn on_use(
        &mut self,
        binding: BindingId,
        position: SourcePosition,
        reporter: &mut DiagnosticReporter,
        stats: &mut VerifierStats,
    ) -> Result<(), VerifierError> {
        let binding_name = self.model.binding(binding, position)?.name.clone();
        stats.conflicts_checked += 1;
        let report_violations = self.report_violations;
        let state = self.states.entry(binding).or_default();

        if state.moved_from {
            emit(
                state,
                Diagnostic::new(
                    DiagnosticKind::UseAfterMove,
                    position,
                    binding,
                    Vec::new(),
                    format!("Use of '{}' after its value was moved", binding_name),
                ),
                report_violations,
                reporter,
                stats,
            );
        } else if state.scope_ended {
            emit(
                state,
                Diagnostic::new(
                    DiagnosticKind::UseAfterMove,
                    position,
                    binding,
                    Vec::new(),
                    format!("Use of '{}' after its scope ended", binding_name),
                ),
                report_violations,
                reporter,
                stats,
            );
        }

        Ok(())
    }

    /// Release every live borrow created in the exiting scope and mark its
    /// bindings dead. Borrows created in descendant scopes were already
    /// released at those scopes' own exits.
    pub(super) fn on_scope_exit(&mut self, scope: ScopeId) {
        if let Some(created_here) = self.borrows_by_scope.remove(&scope) {
            for borrow in created_here {
                let Some(record) = self.borrows.get_mut(&borrow) else {
                    continue;
                };
                if !record.live {
                    continue;
                }
                record.live = false;

                if !record.tainted {
                    if let Some(state) = self.states.get_mut(&record.binding) {
                        state.shared.retain(|live| *live != borrow);
                        if state.exclusive == Some(borrow) {
                            state.exclusive = None;
                        }
                    }
                }
            }
        }

        for binding in self.model.bindings_in(scope) {
            if let Some(state) = self.states.get_mut(binding) {
                state.scope_ended = true;
            }
        }
    }

    /// Final per-binding states, ordered by binding id for determinism.
    pub(super) fn into_snapshots(self) -> Vec<BindingStateSnapshot> {
        let mut snapshots = self
            .states
            .into_iter()
            .filter_map(|(binding, state)| {
                let record = self
                    .model
                    .binding(binding, SourcePosition::default())
                    .ok()?;

                Some(BindingStateSnapshot {
                    binding,
                    name: record.name.clone(),
                    mutability: record.mutability,
                    live_shared_borrows: state.shared.clone(),
                    live_exclusive_borrow: state.exclusive,
                    moved_from: state.moved_from,
                    scope_ended: state.scope_ended,
                })
            })
            .collect::<Vec<_>>();

        snapshots.sort_by_key(|snapshot| snapshot.binding);
        snapshots
    }

    fn register(
        &mut self,
        borrow: BorrowId,
        binding: BindingId,
        creation_scope: ScopeId,
        tainted: bool,
    ) {
        self.borrows.insert(
            borrow,
            BorrowRecord {
                binding,
                live: true,
                tainted,
            },
        );
        self.borrows_by_scope
            .entry(creation_scope)
            .or_default()
            .push(borrow);
    }
}

/// Route every tracker diagnostic through the taint gate: at most one primary
/// diagnostic per binding per statement (same source position), so one bad
/// statement does not cascade. Diagnostics for different bindings at the same
/// position are independent.
fn emit(
    state: &mut BindingState,
    diagnostic: Diagnostic,
    report_violations: bool,
    reporter: &mut DiagnosticReporter,
    stats: &mut VerifierStats,
) {
    if state.tainted_at == Some(diagnostic.position) {
        stats.diagnostics_suppressed += 1;
        return;
    }
    state.tainted_at = Some(diagnostic.position);

    if report_violations {
        reporter.push(diagnostic);
    }
}
