//! Semantic queries the refactoring depends on, behind a trait.
//!
//! The engine never walks the solution looking for name bindings itself; it
//! asks a [`SemanticDatabase`] to resolve call targets and enumerate
//! references. The in-memory implementation lives in [`crate::model`], and
//! tests can substitute a stub to exercise unresolved-target paths.

use deplift_syntax::ast::NodeId;

use crate::change::FileId;
use crate::classify::CallLike;

/// Stable identity of a function declaration: the document that declares it
/// plus the declaration node id inside that document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
    pub file: FileId,
    pub node: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Method,
    Constructor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamInfo {
    pub ty: String,
    pub name: String,
}

/// Declaration-level facts about a callable, as the rewriter needs them.
#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub key: MethodKey,
    pub kind: FunctionKind,
    pub class_name: String,
    pub name: String,
    pub params: Vec<ParamInfo>,
    /// `None` for `void` methods and for constructors.
    pub return_ty: Option<String>,
    pub is_static: bool,
}

impl MethodInfo {
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// One direct reference to a callable: the document it appears in and the
/// call-like node that mentions it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceLocation {
    pub file: FileId,
    pub call: CallLike,
}

pub trait SemanticDatabase {
    /// Resolve the callable targeted by the given call site.
    fn resolve_call_target(&self, file: &FileId, call: CallLike) -> Option<MethodInfo>;

    /// Declaration facts for a known callable.
    fn method_info(&self, key: &MethodKey) -> Option<MethodInfo>;

    /// Every call-like reference to the callable across the solution, in
    /// deterministic document order. The declaration itself is not a
    /// reference.
    fn find_references(&self, key: &MethodKey) -> Vec<ReferenceLocation>;
}
