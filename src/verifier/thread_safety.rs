use crate::trace::{Capability, CapabilityTable, TraceEvent, TraceEventKind};
use crate::verifier::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticReporter};
use crate::verifier::scope_model::ScopeModel;
use crate::verifier::types::VerifierStats;
use crate::verifier_errors::VerifierError;

/// Gates cross-thread transfer and share events against the caller-supplied
/// capability table. A pure table lookup plus event scan: composition of
/// capability sets for composite types is the caller's job, so no fixpoint
/// is needed here.
///
/// Runs as its own pass over the trace; a `Move` before a `ThreadTransfer`
/// is the expected hand-off pattern and is not re-checked here.
pub(super) fn check_thread_events(
    trace: &[TraceEvent],
    model: &ScopeModel,
    capabilities: &CapabilityTable,
    report_violations: bool,
    reporter: &mut DiagnosticReporter,
    stats: &mut VerifierStats,
) -> Result<(), VerifierError> {
    for event in trace {
        match &event.kind {
            TraceEventKind::ThreadTransfer { binding } => {
                let record = model.binding(*binding, event.position)?;
                stats.conflicts_checked += 1;

                if !capabilities.lookup(record.type_tag).is_send() && report_violations {
                    reporter.push(Diagnostic::new(
                        DiagnosticKind::UnsendableTransfer,
                        event.position,
                        *binding,
                        Vec::new(),
                        format!(
                            "'{}' cannot be transferred across threads because its type '{}' is not Send",
                            record.name, record.type_tag
                        ),
                    ));
                }
            }

            TraceEventKind::ThreadShare { binding } => {
                let record = model.binding(*binding, event.position)?;
                stats.conflicts_checked += 1;

                if !capabilities.lookup(record.type_tag).is_sync() && report_violations {
                    reporter.push(Diagnostic::new(
                        DiagnosticKind::UnsyncableShare,
                        event.position,
                        *binding,
                        Vec::new(),
                        format!(
                            "'{}' cannot be shared across threads because its type '{}' is not Sync",
                            record.name, record.type_tag
                        ),
                    ));
                }
            }

            _ => {}
        }
    }

    Ok(())
}

/// Convenience for callers registering fully thread-safe primitive types.
pub fn send_and_sync() -> Capability {
    Capability::SEND.union(Capability::SYNC)
}
