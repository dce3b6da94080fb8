use crate::trace::{
    BindingId, Mutability, ScopeId, SourcePosition, TraceEvent, TraceEventKind, TypeTag,
};
use crate::verifier_errors::VerifierError;
use crate::{return_malformed_trace_error, return_unknown_binding_error, return_unknown_scope_error};
use rustc_hash::FxHashMap;

/// A variable declaration. Read-only once the model is built.
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub name: String,
    pub type_tag: TypeTag,
    pub mutability: Mutability,
    pub scope: ScopeId,
}

/// A lexical region. A binding's validity region is its declaring scope and
/// all descendant scopes, ending at the declaring scope's exit marker.
#[derive(Debug, Clone)]
pub(crate) struct Scope {
    pub parent: Option<ScopeId>,
    pub bindings: Vec<BindingId>,
}

/// Read-only tree of scopes and bindings, built in a fail-fast prepass over
/// the trace before any checking begins. Unknown or duplicate ids here are
/// caller bugs, not user diagnostics.
#[derive(Debug)]
pub(super) struct ScopeModel {
    scopes: FxHashMap<ScopeId, Scope>,
    bindings: FxHashMap<BindingId, Binding>,
}

impl ScopeModel {
    pub(super) fn from_trace(trace: &[TraceEvent]) -> Result<Self, VerifierError> {
        let mut scopes: FxHashMap<ScopeId, Scope> = FxHashMap::default();
        let mut bindings: FxHashMap<BindingId, Binding> = FxHashMap::default();
        // Stack of currently open scopes. Exits must be LIFO: a parent
        // cannot exit while one of its children is still open.
        let mut open_scopes: Vec<ScopeId> = Vec::new();

        for event in trace {
            match &event.kind {
                TraceEventKind::ScopeEnter { scope, parent } => {
                    if scopes.contains_key(scope) {
                        return_malformed_trace_error!(
                            format!("Scope '{}' is entered twice in the trace", scope),
                            event.position,
                            {
                                VerificationStage => "Model Construction",
                            }
                        );
                    }

                    if let Some(parent) = parent {
                        if !open_scopes.contains(parent) {
                            return_unknown_scope_error!(
                                format!(
                                    "Scope '{}' names parent '{}' which is not an open scope",
                                    scope, parent
                                ),
                                event.position,
                                {
                                    VerificationStage => "Model Construction",
                                }
                            );
                        }
                    }

                    open_scopes.push(*scope);
                    scopes.insert(
                        *scope,
                        Scope {
                            parent: *parent,
                            bindings: Vec::new(),
                        },
                    );
                }

                TraceEventKind::ScopeExit { scope } => match open_scopes.last() {
                    Some(top) if top == scope => {
                        open_scopes.pop();
                    }
                    Some(top) if open_scopes.contains(scope) => {
                        return_malformed_trace_error!(
                            format!(
                                "Scope '{}' exits out of order: scope '{}' opened after it and is still open",
                                scope, top
                            ),
                            event.position,
                            {
                                VerificationStage => "Model Construction",
                            }
                        );
                    }
                    _ => {
                        return_unknown_scope_error!(
                            format!(
                                "Scope '{}' exits without a matching open enter event",
                                scope
                            ),
                            event.position,
                            {
                                VerificationStage => "Model Construction",
                            }
                        );
                    }
                },

                TraceEventKind::BindingDeclare {
                    binding,
                    scope,
                    name,
                    mutability,
                    type_tag,
                } => {
                    if bindings.contains_key(binding) {
                        return_malformed_trace_error!(
                            format!("Binding '{}' is declared twice in the trace", binding),
                            event.position,
                            {
                                VerificationStage => "Model Construction",
                            }
                        );
                    }

                    if !open_scopes.contains(scope) {
                        return_unknown_scope_error!(
                            format!(
                                "Binding '{}' is declared into scope '{}' which is not open",
                                binding, scope
                            ),
                            event.position,
                            {
                                VerificationStage => "Model Construction",
                            }
                        );
                    }

                    bindings.insert(
                        *binding,
                        Binding {
                            name: name.clone(),
                            type_tag: *type_tag,
                            mutability: *mutability,
                            scope: *scope,
                        },
                    );

                    if let Some(scope_record) = scopes.get_mut(scope) {
                        scope_record.bindings.push(*binding);
                    }
                }

                // Remaining event kinds are validated by the replay passes.
                _ => {}
            }
        }

        Ok(Self { scopes, bindings })
    }

    pub(super) fn binding(
        &self,
        id: BindingId,
        position: SourcePosition,
    ) -> Result<&Binding, VerifierError> {
        let Some(binding) = self.bindings.get(&id) else {
            return_unknown_binding_error!(
                format!("Trace references binding '{}' which was never declared", id),
                position,
                {
                    VerificationStage => "Verification",
                }
            );
        };

        Ok(binding)
    }

    pub(super) fn scope(
        &self,
        id: ScopeId,
        position: SourcePosition,
    ) -> Result<&Scope, VerifierError> {
        let Some(scope) = self.scopes.get(&id) else {
            return_unknown_scope_error!(
                format!("Trace references scope '{}' which was never entered", id),
                position,
                {
                    VerificationStage => "Verification",
                }
            );
        };

        Ok(scope)
    }

    /// Ancestor test: is `scope` equal to `ancestor` or nested inside it?
    /// Used for lifetime containment.
    pub(super) fn is_ancestor_or_self(
        &self,
        ancestor: ScopeId,
        scope: ScopeId,
        position: SourcePosition,
    ) -> Result<bool, VerifierError> {
        let mut current = scope;

        loop {
            if current == ancestor {
                return Ok(true);
            }

            match self.scope(current, position)?.parent {
                Some(parent) => current = parent,
                None => return Ok(false),
            }
        }
    }

    /// Bindings introduced directly in `scope`, in declaration order.
    pub(super) fn bindings_in(&self, scope: ScopeId) -> &[BindingId] {
        self.scopes
            .get(&scope)
            .map(|record| record.bindings.as_slice())
            .unwrap_or(&[])
    }

    pub(super) fn binding_name(&self, id: BindingId) -> String {
        self.bindings
            .get(&id)
            .map(|binding| binding.name.clone())
            .unwrap_or_else(|| format!("{}", id))
    }

    pub(super) fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub(super) fn binding_count(&self) -> usize {
        self.bindings.len()
    }
}
