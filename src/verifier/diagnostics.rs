use crate::trace::{BindingId, BorrowId, SourcePosition};
use serde::Serialize;
use std::fmt;

/// Every rule violation the verifier can report. All of these are hard
/// compile-time rejections for the caller; none are recovered from.
/// The declaration order is also the tie-break order for diagnostics at
/// the same source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DiagnosticKind {
    ConflictingBorrow,
    UseWhileBorrowed,
    UseAfterMove,
    BorrowOutlivesOwner,
    UnsendableTransfer,
    UnsyncableShare,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::ConflictingBorrow => "ConflictingBorrow",
            DiagnosticKind::UseWhileBorrowed => "UseWhileBorrowed",
            DiagnosticKind::UseAfterMove => "UseAfterMove",
            DiagnosticKind::BorrowOutlivesOwner => "BorrowOutlivesOwner",
            DiagnosticKind::UnsendableTransfer => "UnsendableTransfer",
            DiagnosticKind::UnsyncableShare => "UnsyncableShare",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single position-tagged rule violation. Immutable once created; the
/// reporter only appends.
///
/// Serializes as `{kind, position: {line, column}, bindingId, borrowIds,
/// message}` for the caller rendering user-facing errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub position: SourcePosition,
    #[serde(rename = "bindingId")]
    pub binding: BindingId,
    #[serde(rename = "borrowIds")]
    pub borrows: Vec<BorrowId>,
    pub message: String,
}

impl Diagnostic {
    pub(super) fn new(
        kind: DiagnosticKind,
        position: SourcePosition,
        binding: BindingId,
        borrows: Vec<BorrowId>,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            kind,
            position,
            binding,
            borrows,
            message: message.into(),
        }
    }
}

/// The externally observable result of one verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Accept,
    Reject(Vec<Diagnostic>),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Verdict::Accept => &[],
            Verdict::Reject(diagnostics) => diagnostics,
        }
    }
}

/// Append-only collector for diagnostics from all passes of one run.
#[derive(Debug, Default)]
pub(super) struct DiagnosticReporter {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticReporter {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub(super) fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Order by source position, ties broken by kind then discovery order,
    /// then produce the verdict. The sort is stable so re-running the same
    /// trace yields an identical diagnostic list.
    pub(super) fn finish(mut self) -> Verdict {
        self.diagnostics.sort_by(|left, right| {
            left.position
                .cmp(&right.position)
                .then(left.kind.cmp(&right.kind))
        });

        if self.diagnostics.is_empty() {
            Verdict::Accept
        } else {
            Verdict::Reject(self.diagnostics)
        }
    }
}
