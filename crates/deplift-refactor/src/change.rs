//! Cross-document change application.
//!
//! Refactorings never splice text. They collect node-level replacements into
//! a [`ChangeSet`] and apply the whole batch in one structural rebuild per
//! document, so a change in one subtree cannot invalidate the anchors of
//! another. After the rebuild each touched document is reparsed from its
//! printed form, which reassigns stable ids to the synthesized nodes and
//! keeps the solution ready for a follow-up refactoring.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use deplift_syntax::ast::{
    Block, CompilationUnit, Expr, MemberDecl, MethodBody, NodeId, ParamDecl, Stmt,
};
use deplift_syntax::parse::{parse, ParseError};
use deplift_syntax::print::print_unit;

/// Stable identity of a document within a solution.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileId(pub String);

impl FileId {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        FileId(path.into())
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(path: &str) -> Self {
        FileId(path.to_string())
    }
}

/// The set of parsed documents a refactoring operates over.
///
/// Documents are keyed by [`FileId`] in a `BTreeMap` so iteration order, and
/// therefore reference-visit order during propagation, is deterministic.
#[derive(Debug, Default, Clone)]
pub struct Solution {
    documents: BTreeMap<FileId, CompilationUnit>,
}

impl Solution {
    #[must_use]
    pub fn new() -> Self {
        Solution::default()
    }

    /// Parse `source` and register it under `file`, replacing any previous
    /// document with the same id.
    pub fn add_document(&mut self, file: FileId, source: &str) -> Result<(), ParseError> {
        let unit = parse(source)?;
        self.documents.insert(file, unit);
        Ok(())
    }

    #[must_use]
    pub fn document(&self, file: &FileId) -> Option<&CompilationUnit> {
        self.documents.get(file)
    }

    /// Print a document back to source text.
    #[must_use]
    pub fn render(&self, file: &FileId) -> Option<String> {
        self.documents.get(file).map(print_unit)
    }

    pub fn documents(&self) -> impl Iterator<Item = (&FileId, &CompilationUnit)> {
        self.documents.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// What a [`NodeChange`] puts in place of the target node.
#[derive(Debug, Clone)]
pub enum Replacement {
    /// Replace an expression node with a (possibly synthesized) expression.
    Expr(Expr),
    /// Replace the parameter list of a method declaration node.
    Params(Vec<ParamDecl>),
}

/// A single pending node replacement inside one document.
#[derive(Debug, Clone)]
pub struct NodeChange {
    pub target: NodeId,
    pub replacement: Replacement,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChangeError {
    #[error("no document registered for {0}")]
    UnknownFile(FileId),
    #[error("a change in {file} targets a node that is not in the document")]
    UnknownNode { file: FileId },
    #[error("failed to reparse {file} after applying changes: {source}")]
    Reparse {
        file: FileId,
        #[source]
        source: ParseError,
    },
}

/// An accumulated batch of node replacements across documents.
#[derive(Debug, Default)]
pub struct ChangeSet {
    changes: BTreeMap<FileId, Vec<NodeChange>>,
}

impl ChangeSet {
    #[must_use]
    pub fn new() -> Self {
        ChangeSet::default()
    }

    pub fn replace_expr(&mut self, file: FileId, target: NodeId, expr: Expr) {
        self.changes.entry(file).or_default().push(NodeChange {
            target,
            replacement: Replacement::Expr(expr),
        });
    }

    pub fn replace_params(&mut self, file: FileId, target: NodeId, params: Vec<ParamDecl>) {
        self.changes.entry(file).or_default().push(NodeChange {
            target,
            replacement: Replacement::Params(params),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    #[must_use]
    pub fn touched_files(&self) -> Vec<&FileId> {
        self.changes.keys().collect()
    }

    /// Apply every change to `solution`.
    ///
    /// Each document is rebuilt structurally in a single pass. A document is
    /// only committed once all of its changes have landed, so a stale target
    /// id leaves the solution untouched for that file.
    pub fn apply(self, solution: &mut Solution) -> Result<(), ChangeError> {
        for (file, changes) in self.changes {
            let unit = solution
                .documents
                .get(&file)
                .ok_or_else(|| ChangeError::UnknownFile(file.clone()))?;
            tracing::debug!(file = %file, changes = changes.len(), "applying node changes");

            let mut exprs: HashMap<NodeId, Expr> = HashMap::new();
            let mut params: HashMap<NodeId, Vec<ParamDecl>> = HashMap::new();
            for change in changes {
                match change.replacement {
                    Replacement::Expr(expr) => {
                        exprs.insert(change.target, expr);
                    }
                    Replacement::Params(list) => {
                        params.insert(change.target, list);
                    }
                }
            }

            let rebuilt = rebuild_unit(unit, &mut exprs, &mut params);
            if !exprs.is_empty() || !params.is_empty() {
                return Err(ChangeError::UnknownNode { file });
            }

            // Round-trip through the printer so every node, including the
            // synthesized ones, ends up with a fresh stable id.
            let text = print_unit(&rebuilt);
            let reparsed = parse(&text).map_err(|source| ChangeError::Reparse {
                file: file.clone(),
                source,
            })?;
            solution.documents.insert(file, reparsed);
        }
        Ok(())
    }
}

fn rebuild_unit(
    unit: &CompilationUnit,
    exprs: &mut HashMap<NodeId, Expr>,
    params: &mut HashMap<NodeId, Vec<ParamDecl>>,
) -> CompilationUnit {
    let mut rebuilt = unit.clone();
    for class in &mut rebuilt.types {
        for member in &mut class.members {
            if let Some(new_params) = params.remove(&member.id()) {
                match member {
                    MemberDecl::Method(method) => method.params = new_params,
                    MemberDecl::Constructor(ctor) => ctor.params = new_params,
                    MemberDecl::Field(_) => {}
                }
            }
            match member {
                MemberDecl::Field(field) => {
                    if let Some(init) = field.initializer.take() {
                        field.initializer = Some(rebuild_expr(init, exprs));
                    }
                }
                MemberDecl::Method(method) => match method.body.take() {
                    Some(MethodBody::Block(block)) => {
                        method.body = Some(MethodBody::Block(rebuild_block(block, exprs)));
                    }
                    Some(MethodBody::Expr(expr)) => {
                        method.body = Some(MethodBody::Expr(rebuild_expr(expr, exprs)));
                    }
                    None => {}
                },
                MemberDecl::Constructor(ctor) => {
                    let body = std::mem::take(&mut ctor.body.statements);
                    ctor.body.statements =
                        body.into_iter().map(|stmt| rebuild_stmt(stmt, exprs)).collect();
                }
            }
        }
    }
    rebuilt
}

fn rebuild_block(mut block: Block, exprs: &mut HashMap<NodeId, Expr>) -> Block {
    block.statements = block
        .statements
        .into_iter()
        .map(|stmt| rebuild_stmt(stmt, exprs))
        .collect();
    block
}

fn rebuild_stmt(stmt: Stmt, exprs: &mut HashMap<NodeId, Expr>) -> Stmt {
    match stmt {
        Stmt::LocalVar(mut local) => {
            local.initializer = local.initializer.map(|init| rebuild_expr(init, exprs));
            Stmt::LocalVar(local)
        }
        Stmt::Expr(mut expr_stmt) => {
            expr_stmt.expr = rebuild_expr(expr_stmt.expr, exprs);
            Stmt::Expr(expr_stmt)
        }
        Stmt::Return(mut ret) => {
            ret.expr = ret.expr.map(|expr| rebuild_expr(expr, exprs));
            Stmt::Return(ret)
        }
        Stmt::Block(block) => Stmt::Block(rebuild_block(block, exprs)),
        empty @ Stmt::Empty { .. } => empty,
    }
}

/// Rebuild one expression subtree. A replacement is itself rebuilt, because
/// synthesized replacements may embed original subtrees whose descendants
/// carry further pending changes.
fn rebuild_expr(expr: Expr, exprs: &mut HashMap<NodeId, Expr>) -> Expr {
    let expr = match exprs.remove(&expr.id()) {
        Some(replacement) => replacement,
        None => expr,
    };
    match expr {
        leaf @ (Expr::Name(_) | Expr::IntLiteral(_) | Expr::StringLiteral(_)) => leaf,
        Expr::MemberAccess(mut access) => {
            access.receiver = Box::new(rebuild_expr(*access.receiver, exprs));
            Expr::MemberAccess(access)
        }
        Expr::Call(mut call) => {
            call.callee = Box::new(rebuild_expr(*call.callee, exprs));
            call.args = call
                .args
                .into_iter()
                .map(|arg| rebuild_expr(arg, exprs))
                .collect();
            Expr::Call(call)
        }
        Expr::ObjectCreation(mut creation) => {
            creation.args = creation
                .args
                .into_iter()
                .map(|arg| rebuild_expr(arg, exprs))
                .collect();
            Expr::ObjectCreation(creation)
        }
        Expr::Lambda(mut lambda) => {
            lambda.body = Box::new(rebuild_expr(*lambda.body, exprs));
            Expr::Lambda(lambda)
        }
        Expr::Binary(mut binary) => {
            binary.lhs = Box::new(rebuild_expr(*binary.lhs, exprs));
            binary.rhs = Box::new(rebuild_expr(*binary.rhs, exprs));
            Expr::Binary(binary)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deplift_syntax::ast::NameExpr;
    use deplift_syntax::node_map::NodeIndex;
    use pretty_assertions::assert_eq;

    fn solution_with(file: &str, source: &str) -> Solution {
        let mut solution = Solution::new();
        solution
            .add_document(FileId::new(file), source)
            .expect("parse");
        solution
    }

    #[test]
    fn replaces_an_expression_node() {
        let source = "class C { void M() { Old(); } }";
        let mut solution = solution_with("a.cs", source);
        let file = FileId::new("a.cs");

        let unit = solution.document(&file).unwrap();
        let index = NodeIndex::new(unit);
        let mut target = None;
        index.for_each_expr(|expr| {
            if let Expr::Name(name) = expr {
                if name.name == "Old" {
                    target = Some(name.id);
                }
            }
        });

        let mut changes = ChangeSet::new();
        changes.replace_expr(
            file.clone(),
            target.expect("target"),
            Expr::Name(NameExpr::synthesized("Replacement")),
        );
        changes.apply(&mut solution).expect("apply");

        assert_eq!(
            solution.render(&file).unwrap(),
            "class C\n{\n    void M()\n    {\n        Replacement();\n    }\n}\n"
        );
    }

    #[test]
    fn stale_target_leaves_document_untouched() {
        let source = "class C { void M() { Old(); } }";
        let mut solution = solution_with("a.cs", source);
        let file = FileId::new("a.cs");
        let before = solution.render(&file).unwrap();

        let mut changes = ChangeSet::new();
        changes.replace_expr(
            file.clone(),
            NodeId::SYNTHETIC,
            Expr::Name(NameExpr::synthesized("Replacement")),
        );
        let err = changes.apply(&mut solution).unwrap_err();
        assert_eq!(err, ChangeError::UnknownNode { file: file.clone() });
        assert_eq!(solution.render(&file).unwrap(), before);
    }

    #[test]
    fn unknown_file_is_rejected() {
        let mut solution = solution_with("a.cs", "class C { }");
        let mut changes = ChangeSet::new();
        changes.replace_expr(
            FileId::new("missing.cs"),
            NodeId::SYNTHETIC,
            Expr::Name(NameExpr::synthesized("x")),
        );
        let err = changes.apply(&mut solution).unwrap_err();
        assert_eq!(err, ChangeError::UnknownFile(FileId::new("missing.cs")));
    }
}
