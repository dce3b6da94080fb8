pub mod settings;
pub mod trace;
pub mod verifier;
pub mod verifier_errors;

pub(crate) mod dev_logging;

pub use crate::settings::VerifierConfig;
pub use crate::trace::{
    BindingId, BorrowId, BorrowKind, Capability, CapabilityTable, Mutability, ScopeId,
    SourcePosition, TraceEvent, TraceEventKind, TypeTag,
};
pub use crate::verifier::{
    BindingStateSnapshot, Diagnostic, DiagnosticKind, VerificationReport, Verdict, VerifierStats,
    send_and_sync, verify_trace, verify_traces_parallel,
};
pub use crate::verifier_errors::{InternalErrorKind, VerifierError};
