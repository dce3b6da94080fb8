use crate::return_unknown_borrow_error;
use crate::trace::{BindingId, BorrowId, ScopeId, SourcePosition};
use crate::verifier::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticReporter};
use crate::verifier::scope_model::ScopeModel;
use crate::verifier_errors::VerifierError;
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone)]
struct BorrowOrigin {
    binding: BindingId,
    /// The scope that owns the source binding. The borrow must not be used
    /// after this scope exits.
    owner_scope: ScopeId,
}

/// Checks borrow/owner lifetime containment alongside the borrow tracker's
/// replay. Independent of aliasing: a borrow can satisfy the tracker's rules
/// and still escape its owner's scope.
pub(super) struct LifetimeResolver<'a> {
    model: &'a ScopeModel,
    report_violations: bool,
    origins: FxHashMap<BorrowId, BorrowOrigin>,
    closed_scopes: FxHashSet<ScopeId>,
}

impl<'a> LifetimeResolver<'a> {
    pub(super) fn new(model: &'a ScopeModel, report_violations: bool) -> Self {
        Self {
            model,
            report_violations,
            origins: FxHashMap::default(),
            closed_scopes: FxHashSet::default(),
        }
    }

    /// Creation containment: the borrow must be created inside the region
    /// where its source binding is valid, so the creation scope has to be
    /// the declaring scope or one of its descendants.
    pub(super) fn on_borrow_create(
        &mut self,
        borrow: BorrowId,
        binding: BindingId,
        creation_scope: ScopeId,
        position: SourcePosition,
        reporter: &mut DiagnosticReporter,
    ) -> Result<(), VerifierError> {
        let owner_scope = self.model.binding(binding, position)?.scope;

        self.origins.insert(
            borrow,
            BorrowOrigin {
                binding,
                owner_scope,
            },
        );

        let contained = self
            .model
            .is_ancestor_or_self(owner_scope, creation_scope, position)?;

        if !contained && self.report_violations {
            reporter.push(Diagnostic::new(
                DiagnosticKind::BorrowOutlivesOwner,
                position,
                binding,
                vec![borrow],
                format!(
                    "Borrow '{}' of '{}' is created outside the scope that owns '{}'",
                    borrow,
                    self.model.binding_name(binding),
                    self.model.binding_name(binding)
                ),
            ));
        }

        Ok(())
    }

    /// Last-use containment: any use of the borrow after its owner's
    /// declaring scope has exited means the borrow outlives its source.
    pub(super) fn on_borrow_use(
        &mut self,
        borrow: BorrowId,
        position: SourcePosition,
        reporter: &mut DiagnosticReporter,
    ) -> Result<(), VerifierError> {
        let Some(origin) = self.origins.get(&borrow) else {
            return_unknown_borrow_error!(
                format!("Trace uses borrow '{}' which was never created", borrow),
                position,
                {
                    VerificationStage => "Lifetime Resolution",
                }
            );
        };

        if self.closed_scopes.contains(&origin.owner_scope) && self.report_violations {
            reporter.push(Diagnostic::new(
                DiagnosticKind::BorrowOutlivesOwner,
                position,
                origin.binding,
                vec![borrow],
                format!(
                    "Borrow '{}' outlives '{}': used after its owner's scope ended",
                    borrow,
                    self.model.binding_name(origin.binding)
                ),
            ));
        }

        Ok(())
    }

    pub(super) fn on_scope_exit(&mut self, scope: ScopeId) {
        self.closed_scopes.insert(scope);
    }
}
