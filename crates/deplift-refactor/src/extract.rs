//! The "Extract as a dependency" operation.
//!
//! Given a position on a method invocation, the operation turns the invoked
//! function into an injected parameter of the enclosing method: the call
//! site starts calling the new parameter, the enclosing signature gains a
//! delegate-typed parameter (and loses the ones that died), and every direct
//! caller supplies the extracted function, as a method group or a lambda.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use deplift_syntax::ast::{Expr, MemberDecl, Span};
use deplift_syntax::node_map::walk_expr;

use crate::change::{ChangeError, ChangeSet, FileId, Solution};
use crate::classify::{find_invocation, CallLike};
use crate::delegate::UnsupportedArity;
use crate::model::SolutionModel;
use crate::propagate::{rewrite_caller, CallerContext};
use crate::retention::{describe_arguments, plan_retention, Argument, ArgumentDisposition};
use crate::rewrite::rewrite_extracted_call;
use crate::semantic::{MethodKey, SemanticDatabase};

/// User-facing title of the code action.
pub const EXTRACT_ACTION_TITLE: &str = "Extract as a dependency";

/// Decides, per argument of the extracted call, whether the injected
/// function keeps receiving it or the callers take it over.
///
/// Returning `None` cancels the refactoring; the solution is left unchanged.
pub trait ArgumentPolicy {
    fn decide(&self, args: &[Argument]) -> Option<Vec<ArgumentDisposition>>;
}

/// Keeps every argument; the injected function has the target's full shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepAll;

impl ArgumentPolicy for KeepAll {
    fn decide(&self, args: &[Argument]) -> Option<Vec<ArgumentDisposition>> {
        Some(vec![ArgumentDisposition::Keep; args.len()])
    }
}

impl<F> ArgumentPolicy for F
where
    F: Fn(&[Argument]) -> Option<Vec<ArgumentDisposition>>,
{
    fn decide(&self, args: &[Argument]) -> Option<Vec<ArgumentDisposition>> {
        self(args)
    }
}

/// Cooperative cancellation token, checked between the planning stages.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        CancelFlag::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<(), ExtractError> {
        if self.is_cancelled() {
            Err(ExtractError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("no extractable invocation at the requested position")]
    NotApplicable,
    #[error(transparent)]
    UnsupportedArity(#[from] UnsupportedArity),
    #[error("the refactoring was cancelled")]
    Cancelled,
    #[error("no document registered for {0}")]
    UnknownFile(FileId),
    #[error(transparent)]
    Change(#[from] ChangeError),
}

/// Why an otherwise well-formed request produced no edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnchangedReason {
    /// The policy declined to decide.
    PolicyCancelled,
    /// The policy returned a decision list of the wrong length.
    DecisionLengthMismatch,
    /// The invocation does not resolve to a known declaration.
    TargetUnresolved,
}

#[derive(Debug)]
pub enum ExtractOutcome {
    /// The refactored solution; the input solution is never mutated.
    Applied(Solution),
    Unchanged(UnchangedReason),
}

/// Run the extraction for the invocation whose callee identifier covers
/// `span` in `file`.
pub fn extract_dependency(
    solution: &Solution,
    file: &FileId,
    span: Span,
    policy: &dyn ArgumentPolicy,
    cancel: &CancelFlag,
) -> Result<ExtractOutcome, ExtractError> {
    cancel.check()?;

    let model = SolutionModel::new(solution);
    let index = model
        .index(file)
        .ok_or_else(|| ExtractError::UnknownFile(file.clone()))?;

    let call_id = find_invocation(index, span).ok_or(ExtractError::NotApplicable)?;
    let Some(Expr::Call(call)) = index.expr(call_id) else {
        return Err(ExtractError::NotApplicable);
    };
    let (_, enclosing) = index
        .enclosing_member(call_id)
        .ok_or(ExtractError::NotApplicable)?;
    match enclosing {
        // A field initializer has no signature to widen, and a static
        // constructor cannot take parameters.
        MemberDecl::Field(_) => return Err(ExtractError::NotApplicable),
        MemberDecl::Constructor(ctor) if ctor.is_static() => {
            return Err(ExtractError::NotApplicable)
        }
        _ => {}
    }

    let Some(target) = model.resolve_call_target(file, CallLike::Invocation(call_id)) else {
        tracing::debug!(file = %file, "extraction target does not resolve");
        return Ok(ExtractOutcome::Unchanged(UnchangedReason::TargetUnresolved));
    };
    if call.args.len() != target.params.len() {
        tracing::debug!(
            file = %file,
            target = %target.name,
            "call arity does not match the resolved declaration"
        );
        return Ok(ExtractOutcome::Unchanged(UnchangedReason::TargetUnresolved));
    }

    cancel.check()?;
    let arguments = describe_arguments(&target, call);
    let Some(dispositions) = policy.decide(&arguments) else {
        return Ok(ExtractOutcome::Unchanged(UnchangedReason::PolicyCancelled));
    };
    if dispositions.len() != arguments.len() {
        return Ok(ExtractOutcome::Unchanged(
            UnchangedReason::DecisionLengthMismatch,
        ));
    }

    let plan = plan_retention(&target, call, &dispositions, enclosing)?;

    let enclosing_key = MethodKey {
        file: file.clone(),
        node: enclosing.id(),
    };
    let enclosing_info = model
        .method_info(&enclosing_key)
        .ok_or(ExtractError::NotApplicable)?;

    let mut changes = ChangeSet::new();
    changes.replace_expr(file.clone(), call_id, rewrite_extracted_call(call, &plan));
    changes.replace_params(file.clone(), enclosing.id(), plan.new_params.clone());

    // Nodes that vanish from the extraction site (callee and removed
    // arguments); a caller reference in there is inlined into the lambdas,
    // not rewritten in place.
    let mut vanishing = std::collections::HashSet::new();
    walk_expr(&call.callee, &mut |expr| {
        vanishing.insert(expr.id());
    });
    for &i in &plan.removed {
        if let Some(arg) = call.args.get(i) {
            walk_expr(arg, &mut |expr| {
                vanishing.insert(expr.id());
            });
        }
    }

    cancel.check()?;
    let ctx = CallerContext {
        old_params: &enclosing_info.params,
        plan: &plan,
        target: &target,
        extracted_callee: &call.callee,
        extracted_args: &call.args,
    };
    for reference in model.find_references(&enclosing_key) {
        let node = reference.call.node();
        if reference.file == *file && (node == call_id || vanishing.contains(&node)) {
            continue;
        }
        let Some(ref_index) = model.index(&reference.file) else {
            tracing::debug!(file = %reference.file, "reference document disappeared, skipping");
            continue;
        };
        let Some(expr) = ref_index.expr(node) else {
            tracing::debug!(file = %reference.file, node = ?node, "reference node not found, skipping");
            continue;
        };
        match rewrite_caller(expr, &ctx) {
            Some(replacement) => changes.replace_expr(reference.file.clone(), node, replacement),
            None => {
                tracing::debug!(
                    file = %reference.file,
                    method = %enclosing_info.name,
                    "caller does not match the old signature, skipping"
                );
            }
        }
    }

    cancel.check()?;
    let mut refactored = solution.clone();
    changes.apply(&mut refactored)?;
    Ok(ExtractOutcome::Applied(refactored))
}

/// Whether an extraction can even be offered at this position, without
/// planning it. Editors use this to decide to show the action.
#[must_use]
pub fn is_available(solution: &Solution, file: &FileId, span: Span) -> bool {
    let Some(unit) = solution.document(file) else {
        return false;
    };
    let index = deplift_syntax::node_map::NodeIndex::new(unit);
    let Some(call_id) = find_invocation(&index, span) else {
        return false;
    };
    match index.enclosing_member(call_id) {
        Some((_, MemberDecl::Field(_))) | None => false,
        Some((_, MemberDecl::Constructor(ctor))) => !ctor.is_static(),
        Some((_, MemberDecl::Method(_))) => true,
    }
}
