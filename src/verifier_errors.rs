use crate::trace::SourcePosition;
use std::collections::HashMap;
use std::fmt;

// Internal-error class: a malformed input trace is a bug in the caller
// (the parser/resolver), not a user-facing diagnostic. These abort the
// verification run instead of joining the diagnostic list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalErrorKind {
    UnknownBinding,
    UnknownScope,
    UnknownBorrow,
    MalformedTrace,
    MalformedConfig,
}

pub fn internal_error_kind_to_str(kind: &InternalErrorKind) -> &'static str {
    match kind {
        InternalErrorKind::UnknownBinding => "Unknown Binding",
        InternalErrorKind::UnknownScope => "Unknown Scope",
        InternalErrorKind::UnknownBorrow => "Unknown Borrow",
        InternalErrorKind::MalformedTrace => "Malformed Trace",
        InternalErrorKind::MalformedConfig => "Malformed Config",
    }
}

#[derive(Debug, Eq, Hash, PartialEq)]
pub enum ErrorMetaDataKey {
    VerificationStage,
    OffendingEvent,

    // Optional suggestions for the caller producing the trace.
    // Can be expanded to add more later
    PrimarySuggestion,
}

// This is for creating more structured and detailed error messages
// so the caller knows exactly which part of the trace was malformed.
#[derive(Debug)]
pub struct VerifierError {
    pub msg: String,
    pub position: SourcePosition,
    pub kind: InternalErrorKind,
    pub metadata: HashMap<ErrorMetaDataKey, &'static str>,
}

impl VerifierError {
    pub fn new(msg: impl Into<String>, position: SourcePosition, kind: InternalErrorKind) -> Self {
        VerifierError {
            msg: msg.into(),
            position,
            kind,
            metadata: HashMap::new(),
        }
    }

    pub fn new_metadata_entry(&mut self, key: ErrorMetaDataKey, value: &'static str) {
        self.metadata.insert(key, value);
    }

    /// Create a config error (no trace position applies)
    pub fn malformed_config(msg: impl Into<String>) -> Self {
        VerifierError {
            msg: msg.into(),
            position: SourcePosition::default(),
            kind: InternalErrorKind::MalformedConfig,
            metadata: HashMap::new(),
        }
    }
}

impl fmt::Display for VerifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}: {}",
            internal_error_kind_to_str(&self.kind),
            self.position,
            self.msg
        )
    }
}

impl std::error::Error for VerifierError {}

/// Returns a new VerifierError for a trace event naming a binding id that was
/// never declared.
///
/// Usage:
/// `return_unknown_binding_error!("message", position, {
///     VerificationStage => "Borrow Tracking",
/// })`;
#[macro_export]
macro_rules! return_unknown_binding_error {
    ($msg:expr, $position:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::verifier_errors::VerifierError {
            msg: $msg.into(),
            position: $position,
            kind: $crate::verifier_errors::InternalErrorKind::UnknownBinding,
            metadata: {
                let mut map = std::collections::HashMap::new();
                $( map.insert($crate::verifier_errors::ErrorMetaDataKey::$key, $value); )*
                map
            },
        })
    };
    ($msg:expr, $position:expr) => {
        return Err($crate::verifier_errors::VerifierError {
            msg: $msg.into(),
            position: $position,
            kind: $crate::verifier_errors::InternalErrorKind::UnknownBinding,
            metadata: std::collections::HashMap::new(),
        })
    };
}

/// Returns a new VerifierError for a trace event naming a scope id that was
/// never entered.
#[macro_export]
macro_rules! return_unknown_scope_error {
    ($msg:expr, $position:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::verifier_errors::VerifierError {
            msg: $msg.into(),
            position: $position,
            kind: $crate::verifier_errors::InternalErrorKind::UnknownScope,
            metadata: {
                let mut map = std::collections::HashMap::new();
                $( map.insert($crate::verifier_errors::ErrorMetaDataKey::$key, $value); )*
                map
            },
        })
    };
    ($msg:expr, $position:expr) => {
        return Err($crate::verifier_errors::VerifierError {
            msg: $msg.into(),
            position: $position,
            kind: $crate::verifier_errors::InternalErrorKind::UnknownScope,
            metadata: std::collections::HashMap::new(),
        })
    };
}

/// Returns a new VerifierError for a trace event naming a borrow id that was
/// never created.
#[macro_export]
macro_rules! return_unknown_borrow_error {
    ($msg:expr, $position:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::verifier_errors::VerifierError {
            msg: $msg.into(),
            position: $position,
            kind: $crate::verifier_errors::InternalErrorKind::UnknownBorrow,
            metadata: {
                let mut map = std::collections::HashMap::new();
                $( map.insert($crate::verifier_errors::ErrorMetaDataKey::$key, $value); )*
                map
            },
        })
    };
    ($msg:expr, $position:expr) => {
        return Err($crate::verifier_errors::VerifierError {
            msg: $msg.into(),
            position: $position,
            kind: $crate::verifier_errors::InternalErrorKind::UnknownBorrow,
            metadata: std::collections::HashMap::new(),
        })
    };
}

/// Returns a new VerifierError for structurally invalid traces: duplicate ids,
/// declarations into unentered scopes, exits of scopes that are not open.
#[macro_export]
macro_rules! return_malformed_trace_error {
    ($msg:expr, $position:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::verifier_errors::VerifierError {
            msg: $msg.into(),
            position: $position,
            kind: $crate::verifier_errors::InternalErrorKind::MalformedTrace,
            metadata: {
                let mut map = std::collections::HashMap::new();
                $( map.insert($crate::verifier_errors::ErrorMetaDataKey::$key, $value); )*
                map
            },
        })
    };
    ($msg:expr, $position:expr) => {
        return Err($crate::verifier_errors::VerifierError {
            msg: $msg.into(),
            position: $position,
            kind: $crate::verifier_errors::InternalErrorKind::MalformedTrace,
            metadata: std::collections::HashMap::new(),
        })
    };
}
