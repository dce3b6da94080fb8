use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a lexical scope in the input trace.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct ScopeId(pub u32);

/// Identifier for a variable binding in the input trace.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct BindingId(pub u32);

/// Identifier for a borrow in the input trace.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct BorrowId(pub u32);

/// Opaque tag for a declared type. Capability sets are resolved against these
/// through a [`CapabilityTable`] supplied by the caller.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct TypeTag(pub u32);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for BorrowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// A line/column pair for diagnostic attribution.
/// Ordered by line first, then column, which is also the order diagnostics
/// are reported in.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
}

impl SourcePosition {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    pub fn new_just_line(line: u32) -> Self {
        Self { line, column: 0 }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Declared mutability of a binding (`let` vs `mut` in the source language).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutability {
    Immutable,
    Mutable,
}

/// Kind of a borrow: many shared readers, or one exclusive writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BorrowKind {
    Shared,
    Exclusive,
}

impl fmt::Display for BorrowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BorrowKind::Shared => write!(f, "shared"),
            BorrowKind::Exclusive => write!(f, "exclusive"),
        }
    }
}

/// Thread-capability bitset for a type.
///
/// The empty set is the `Unsafe` classification: neither ownership transfer
/// nor shared access may cross a thread boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capability(u8);

impl Capability {
    pub const UNSAFE: Self = Self(0);
    pub const SEND: Self = Self(0b01);
    pub const SYNC: Self = Self(0b10);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Capability of a composite type is the intersection of its
    /// constituents' capabilities.
    pub fn intersect(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    pub fn is_send(self) -> bool {
        self.contains(Self::SEND)
    }

    pub fn is_sync(self) -> bool {
        self.contains(Self::SYNC)
    }
}

impl Default for Capability {
    fn default() -> Self {
        Self::UNSAFE
    }
}

/// Caller-supplied fact table mapping type tags to resolved capability sets.
///
/// Composition closure (a struct is `Send`/`Sync` only if every field is) is
/// the caller's responsibility; [`CapabilityTable::compose`] is provided for
/// building composite entries. Lookups of unregistered tags default to
/// [`Capability::UNSAFE`].
#[derive(Debug, Clone, Default)]
pub struct CapabilityTable {
    capabilities: FxHashMap<TypeTag, Capability>,
}

impl CapabilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tag: TypeTag, capability: Capability) {
        self.capabilities.insert(tag, capability);
    }

    pub fn lookup(&self, tag: TypeTag) -> Capability {
        self.capabilities.get(&tag).copied().unwrap_or_default()
    }

    /// Intersection of the capabilities of every constituent type.
    /// An empty constituent list yields the full set.
    pub fn compose(&self, constituents: &[TypeTag]) -> Capability {
        constituents
            .iter()
            .fold(Capability::SEND.union(Capability::SYNC), |set, tag| {
                set.intersect(self.lookup(*tag))
            })
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

/// One step of the flattened, program-ordered trace produced by the external
/// parser/resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceEventKind {
    ScopeEnter {
        scope: ScopeId,
        parent: Option<ScopeId>,
    },
    ScopeExit {
        scope: ScopeId,
    },
    BindingDeclare {
        binding: BindingId,
        scope: ScopeId,
        name: String,
        mutability: Mutability,
        type_tag: TypeTag,
    },
    BorrowCreate {
        borrow: BorrowId,
        binding: BindingId,
        kind: BorrowKind,
    },
    /// Optional explicit release. Borrows without one are released when their
    /// creation scope exits.
    BorrowEnd {
        borrow: BorrowId,
    },
    /// A read through a live borrow.
    BorrowUse {
        borrow: BorrowId,
    },
    /// Ownership of the binding's value is transferred away.
    Move {
        binding: BindingId,
    },
    /// The binding is given a fresh value, making it usable again after a move.
    Assign {
        binding: BindingId,
    },
    /// A direct read of the binding.
    Use {
        binding: BindingId,
    },
    /// Ownership moved into a spawned unit of concurrent execution.
    ThreadTransfer {
        binding: BindingId,
    },
    /// A reference handed to a concurrently running unit.
    ThreadShare {
        binding: BindingId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub kind: TraceEventKind,
    pub position: SourcePosition,
}

impl TraceEvent {
    pub fn scope_enter(scope: ScopeId, parent: Option<ScopeId>, position: SourcePosition) -> Self {
        Self {
            kind: TraceEventKind::ScopeEnter { scope, parent },
            position,
        }
    }

    pub fn scope_exit(scope: ScopeId, position: SourcePosition) -> Self {
        Self {
            kind: TraceEventKind::ScopeExit { scope },
            position,
        }
    }

    pub fn binding_declare(
        binding: BindingId,
        scope: ScopeId,
        name: impl Into<String>,
        mutability: Mutability,
        type_tag: TypeTag,
        position: SourcePosition,
    ) -> Self {
        Self {
            kind: TraceEventKind::BindingDeclare {
                binding,
                scope,
                name: name.into(),
                mutability,
                type_tag,
            },
            position,
        }
    }

    pub fn borrow_create(
        borrow: BorrowId,
        binding: BindingId,
        kind: BorrowKind,
        position: SourcePosition,
    ) -> Self {
        Self {
            kind: TraceEventKind::BorrowCreate {
                borrow,
                binding,
                kind,
            },
            position,
        }
    }

    pub fn borrow_end(borrow: BorrowId, position: SourcePosition) -> Self {
        Self {
            kind: TraceEventKind::BorrowEnd { borrow },
            position,
        }
    }

    pub fn borrow_use(borrow: BorrowId, position: SourcePosition) -> Self {
        Self {
            kind: TraceEventKind::BorrowUse { borrow },
            position,
        }
    }

    pub fn move_binding(binding: BindingId, position: SourcePosition) -> Self {
        Self {
            kind: TraceEventKind::Move { binding },
            position,
        }
    }

    pub fn assign(binding: BindingId, position: SourcePosition) -> Self {
        Self {
            kind: TraceEventKind::Assign { binding },
            position,
        }
    }

    pub fn use_binding(binding: BindingId, position: SourcePosition) -> Self {
        Self {
            kind: TraceEventKind::Use { binding },
            position,
        }
    }

    pub fn thread_transfer(binding: BindingId, position: SourcePosition) -> Self {
        Self {
            kind: TraceEventKind::ThreadTransfer { binding },
            position,
        }
    }

    pub fn thread_share(binding: BindingId, position: SourcePosition) -> Self {
        Self {
            kind: TraceEventKind::ThreadShare { binding },
            position,
        }
    }
}
