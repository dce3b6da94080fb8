mod borrow_tracker;
mod diagnostics;
mod lifetime;
mod scope_model;
mod thread_safety;
mod types;

pub use diagnostics::{Diagnostic, DiagnosticKind, Verdict};
pub use thread_safety::send_and_sync;
pub use types::{BindingStateSnapshot, VerificationReport, VerifierStats};

use crate::settings::VerifierConfig;
use crate::trace::{CapabilityTable, TraceEvent, TraceEventKind};
use crate::verifier::borrow_tracker::BorrowTracker;
use crate::verifier::diagnostics::DiagnosticReporter;
use crate::verifier::lifetime::LifetimeResolver;
use crate::verifier::scope_model::ScopeModel;
use crate::verifier_errors::VerifierError;
use crate::verifier_log;
use rayon::prelude::*;

/// Verify one flattened, program-ordered event trace.
///
/// A pure, single-pass, synchronous analysis: all scratch state is private to
/// the run, so any number of calls may execute in parallel on independent
/// traces. Re-running on identical input yields an identical report.
///
/// Returns `Err` only for malformed traces (caller bugs); rule violations
/// land in the report's [`Verdict`].
pub fn verify_trace(
    trace: &[TraceEvent],
    capabilities: &CapabilityTable,
    config: &VerifierConfig,
) -> Result<VerificationReport, VerifierError> {
    Verifier::new(trace, capabilities, config).run()
}

/// Verify many independent traces in parallel, one report per trace in input
/// order. Each run gets its own scratch state; no coordination is needed.
pub fn verify_traces_parallel(
    traces: &[Vec<TraceEvent>],
    capabilities: &CapabilityTable,
    config: &VerifierConfig,
) -> Result<Vec<VerificationReport>, VerifierError> {
    traces
        .par_iter()
        .map(|trace| verify_trace(trace, capabilities, config))
        .collect()
}

struct Verifier<'a> {
    trace: &'a [TraceEvent],
    capabilities: &'a CapabilityTable,
    config: &'a VerifierConfig,
}

impl<'a> Verifier<'a> {
    fn new(
        trace: &'a [TraceEvent],
        capabilities: &'a CapabilityTable,
        config: &'a VerifierConfig,
    ) -> Self {
        Self {
            trace,
            capabilities,
            config,
        }
    }

    fn run(self) -> Result<VerificationReport, VerifierError> {
        // Fail-fast prepass: after this the scope/binding tree is read-only.
        let model = ScopeModel::from_trace(self.trace)?;

        verifier_log!(format!(
            "[Verifier] Starting run: events={} scopes={} bindings={}",
            self.trace.len(),
            model.scope_count(),
            model.binding_count()
        ));

        let mut reporter = DiagnosticReporter::new();
        let mut stats = VerifierStats {
            scopes_entered: model.scope_count(),
            bindings_declared: model.binding_count(),
            ..VerifierStats::default()
        };

        // The tracker and the lifetime resolver share one forward replay.
        // Disabled check families keep their state machines running (ids are
        // still validated, snapshots stay meaningful) but emit nothing.
        let mut tracker = BorrowTracker::new(&model, self.config.check_aliasing);
        let mut lifetimes = LifetimeResolver::new(&model, self.config.check_lifetimes);
        let mut scope_stack = Vec::new();

        for event in self.trace {
            stats.events_scanned += 1;

            match &event.kind {
                TraceEventKind::ScopeEnter { scope, .. } => {
                    scope_stack.push(*scope);
                }

                TraceEventKind::ScopeExit { scope } => {
                    // The prepass enforces LIFO nesting, so the exiting
                    // scope is always the top of the stack.
                    scope_stack.pop();
                    tracker.on_scope_exit(*scope);
                    lifetimes.on_scope_exit(*scope);
                }

                TraceEventKind::BindingDeclare { binding, .. } => {
                    tracker.on_binding_declare(*binding);
                }

                TraceEventKind::BorrowCreate {
                    borrow,
                    binding,
                    kind,
                } => {
                    // Borrows in a trace with no open scope are attributed to
                    // the source binding's declaring scope.
                    let creation_scope = match scope_stack.last() {
                        Some(scope) => *scope,
                        None => model.binding(*binding, event.position)?.scope,
                    };

                    tracker.on_borrow_create(
                        *borrow,
                        *binding,
                        *kind,
                        creation_scope,
                        event.position,
                        &mut reporter,
                        &mut stats,
                    )?;
                    lifetimes.on_borrow_create(
                        *borrow,
                        *binding,
                        creation_scope,
                        event.position,
                        &mut reporter,
                    )?;
                }

                TraceEventKind::BorrowEnd { borrow } => {
                    tracker.on_borrow_end(*borrow, event.position)?;
                }

                TraceEventKind::BorrowUse { borrow } => {
                    lifetimes.on_borrow_use(*borrow, event.position, &mut reporter)?;
                }

                TraceEventKind::Move { binding } => {
                    tracker.on_move(*binding, event.position, &mut reporter, &mut stats)?;
                }

                TraceEventKind::Assign { binding } => {
                    tracker.on_assign(*binding, event.position, &mut reporter, &mut stats)?;
                }

                TraceEventKind::Use { binding } => {
                    tracker.on_use(*binding, event.position, &mut reporter, &mut stats)?;
                }

                // Judged by the thread-safety pass below. A transfer is the
                // expected follow-up to a move, never a use of the binding.
                TraceEventKind::ThreadTransfer { .. } | TraceEventKind::ThreadShare { .. } => {}
            }
        }

        thread_safety::check_thread_events(
            self.trace,
            &model,
            self.capabilities,
            self.config.check_thread_safety,
            &mut reporter,
            &mut stats,
        )?;

        let binding_states = tracker.into_snapshots();
        stats.diagnostics_emitted = reporter.len();
        let verdict = reporter.finish();

        verifier_log!(format!(
            "[Verifier] Completed run: events={} borrows={} conflicts_checked={} diagnostics={}",
            stats.events_scanned,
            stats.borrows_tracked,
            stats.conflicts_checked,
            stats.diagnostics_emitted
        ));

        Ok(VerificationReport {
            verdict,
            stats,
            binding_states,
        })
    }
}

#[cfg(test)]
mod tests;
