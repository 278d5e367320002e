//! Per-document node index: parent links, id lookup, identifier-at-position.
//!
//! Built once per document from the original tree and used read-only while a
//! refactoring plans its node changes.

use std::collections::HashMap;

use crate::ast::{
    Block, ClassDecl, CompilationUnit, Expr, MemberDecl, MethodBody, NodeId, Span, Stmt,
};

/// An identifier-like position inside a document.
///
/// Identifiers show up in three syntactic homes: a free-standing name
/// expression, the member-name slot of a member access, and the type-name
/// slot of an object creation. Classification needs to know which.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentRef {
    /// A `NameExpr` node.
    Name(NodeId),
    /// The member name of a `MemberAccessExpr` (the id is the access node).
    Member(NodeId),
    /// The type name of an `ObjectCreationExpr` (the id is the creation node).
    CreationType(NodeId),
}

impl IdentRef {
    #[must_use]
    pub fn node(self) -> NodeId {
        match self {
            IdentRef::Name(id) | IdentRef::Member(id) | IdentRef::CreationType(id) => id,
        }
    }
}

pub struct NodeIndex<'a> {
    exprs: HashMap<NodeId, &'a Expr>,
    parents: HashMap<NodeId, NodeId>,
    owners: HashMap<NodeId, NodeId>,
    members: HashMap<NodeId, (&'a ClassDecl, &'a MemberDecl)>,
}

impl<'a> NodeIndex<'a> {
    #[must_use]
    pub fn new(unit: &'a CompilationUnit) -> Self {
        let mut index = NodeIndex {
            exprs: HashMap::new(),
            parents: HashMap::new(),
            owners: HashMap::new(),
            members: HashMap::new(),
        };
        for class in &unit.types {
            for member in &class.members {
                index.members.insert(member.id(), (class, member));
                let owner = member.id();
                match member {
                    MemberDecl::Field(field) => {
                        if let Some(init) = &field.initializer {
                            index.record_expr(init, None, owner);
                        }
                    }
                    MemberDecl::Method(method) => match &method.body {
                        Some(MethodBody::Block(block)) => index.record_block(block, owner),
                        Some(MethodBody::Expr(expr)) => index.record_expr(expr, None, owner),
                        None => {}
                    },
                    MemberDecl::Constructor(ctor) => index.record_block(&ctor.body, owner),
                }
            }
        }
        index
    }

    fn record_block(&mut self, block: &'a Block, owner: NodeId) {
        for stmt in &block.statements {
            self.record_stmt(stmt, owner);
        }
    }

    fn record_stmt(&mut self, stmt: &'a Stmt, owner: NodeId) {
        match stmt {
            Stmt::LocalVar(local) => {
                if let Some(init) = &local.initializer {
                    self.record_expr(init, None, owner);
                }
            }
            Stmt::Expr(expr_stmt) => self.record_expr(&expr_stmt.expr, None, owner),
            Stmt::Return(ret) => {
                if let Some(expr) = &ret.expr {
                    self.record_expr(expr, None, owner);
                }
            }
            Stmt::Block(block) => self.record_block(block, owner),
            Stmt::Empty { .. } => {}
        }
    }

    fn record_expr(&mut self, expr: &'a Expr, parent: Option<NodeId>, owner: NodeId) {
        let id = expr.id();
        self.exprs.insert(id, expr);
        self.owners.insert(id, owner);
        if let Some(parent) = parent {
            self.parents.insert(id, parent);
        }
        match expr {
            Expr::Name(_) | Expr::IntLiteral(_) | Expr::StringLiteral(_) => {}
            Expr::MemberAccess(access) => self.record_expr(&access.receiver, Some(id), owner),
            Expr::Call(call) => {
                self.record_expr(&call.callee, Some(id), owner);
                for arg in &call.args {
                    self.record_expr(arg, Some(id), owner);
                }
            }
            Expr::ObjectCreation(creation) => {
                for arg in &creation.args {
                    self.record_expr(arg, Some(id), owner);
                }
            }
            Expr::Lambda(lambda) => self.record_expr(&lambda.body, Some(id), owner),
            Expr::Binary(binary) => {
                self.record_expr(&binary.lhs, Some(id), owner);
                self.record_expr(&binary.rhs, Some(id), owner);
            }
        }
    }

    #[must_use]
    pub fn expr(&self, id: NodeId) -> Option<&'a Expr> {
        self.exprs.get(&id).copied()
    }

    #[must_use]
    pub fn parent_expr(&self, id: NodeId) -> Option<&'a Expr> {
        let parent = self.parents.get(&id)?;
        self.expr(*parent)
    }

    /// The class/member declaration whose body contains the expression.
    #[must_use]
    pub fn enclosing_member(&self, id: NodeId) -> Option<(&'a ClassDecl, &'a MemberDecl)> {
        let owner = self.owners.get(&id)?;
        self.members.get(owner).copied()
    }

    #[must_use]
    pub fn member_by_id(&self, id: NodeId) -> Option<(&'a ClassDecl, &'a MemberDecl)> {
        self.members.get(&id).copied()
    }

    /// Locate the identifier-like node covering the given span.
    #[must_use]
    pub fn identifier_at(&self, span: Span) -> Option<IdentRef> {
        for expr in self.exprs.values() {
            match expr {
                Expr::Name(name) => {
                    if covers(name.range, span) {
                        return Some(IdentRef::Name(name.id));
                    }
                }
                Expr::MemberAccess(access) => {
                    if covers(access.name_range, span) {
                        return Some(IdentRef::Member(access.id));
                    }
                }
                Expr::ObjectCreation(creation) => {
                    if covers(creation.type_name_range, span) {
                        return Some(IdentRef::CreationType(creation.id));
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Visit every expression recorded for the document.
    pub fn for_each_expr(&self, mut f: impl FnMut(&'a Expr)) {
        for expr in self.exprs.values() {
            f(expr);
        }
    }
}

fn covers(range: Span, span: Span) -> bool {
    range.contains(span.start) && span.end <= range.end
}

/// Depth-first walk over an expression subtree, parents before children.
pub fn walk_expr<'a>(expr: &'a Expr, f: &mut impl FnMut(&'a Expr)) {
    f(expr);
    match expr {
        Expr::Name(_) | Expr::IntLiteral(_) | Expr::StringLiteral(_) => {}
        Expr::MemberAccess(access) => walk_expr(&access.receiver, f),
        Expr::Call(call) => {
            walk_expr(&call.callee, f);
            for arg in &call.args {
                walk_expr(arg, f);
            }
        }
        Expr::ObjectCreation(creation) => {
            for arg in &creation.args {
                walk_expr(arg, f);
            }
        }
        Expr::Lambda(lambda) => walk_expr(&lambda.body, f),
        Expr::Binary(binary) => {
            walk_expr(&binary.lhs, f);
            walk_expr(&binary.rhs, f);
        }
    }
}

/// Walk every expression in a member body (field initializers included).
pub fn walk_member_exprs<'a>(member: &'a MemberDecl, f: &mut impl FnMut(&'a Expr)) {
    match member {
        MemberDecl::Field(field) => {
            if let Some(init) = &field.initializer {
                walk_expr(init, f);
            }
        }
        MemberDecl::Method(method) => match &method.body {
            Some(MethodBody::Block(block)) => walk_block_exprs(block, f),
            Some(MethodBody::Expr(expr)) => walk_expr(expr, f),
            None => {}
        },
        MemberDecl::Constructor(ctor) => walk_block_exprs(&ctor.body, f),
    }
}

pub fn walk_block_exprs<'a>(block: &'a Block, f: &mut impl FnMut(&'a Expr)) {
    for stmt in &block.statements {
        match stmt {
            Stmt::LocalVar(local) => {
                if let Some(init) = &local.initializer {
                    walk_expr(init, f);
                }
            }
            Stmt::Expr(expr_stmt) => walk_expr(&expr_stmt.expr, f),
            Stmt::Return(ret) => {
                if let Some(expr) = &ret.expr {
                    walk_expr(expr, f);
                }
            }
            Stmt::Block(inner) => walk_block_exprs(inner, f),
            Stmt::Empty { .. } => {}
        }
    }
}
