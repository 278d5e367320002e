//! Source-to-source refactoring: extract a method call as an injected
//! dependency.
//!
//! The crate is organized around one operation, [`extract_dependency`]:
//! classify the selected call site ([`classify`]), resolve it against the
//! semantic model ([`semantic`], [`model`]), decide argument retention and
//! synthesize the delegate type ([`retention`], [`delegate`]), rewrite the
//! site and its callers ([`rewrite`], [`propagate`]), and apply everything
//! as one batch of node changes ([`change`]).

pub mod change;
pub mod classify;
pub mod delegate;
pub mod extract;
pub mod model;
pub mod propagate;
pub mod retention;
pub mod rewrite;
pub mod semantic;

pub use change::{ChangeError, ChangeSet, FileId, NodeChange, Replacement, Solution};
pub use classify::{find_call_like, find_invocation, CallLike};
pub use delegate::{synthesize, DelegateType, UnsupportedArity, MAX_ARITY};
pub use extract::{
    extract_dependency, is_available, ArgumentPolicy, CancelFlag, ExtractError, ExtractOutcome,
    KeepAll, UnchangedReason, EXTRACT_ACTION_TITLE,
};
pub use model::SolutionModel;
pub use retention::{Argument, ArgumentDisposition, RetentionPlan};
pub use semantic::{
    FunctionKind, MethodInfo, MethodKey, ParamInfo, ReferenceLocation, SemanticDatabase,
};
