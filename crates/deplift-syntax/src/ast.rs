//! Lightweight C#-subset AST used by the refactoring engine.
//!
//! This is intentionally not a lossless green tree. The goal is a small,
//! deterministic syntax layer whose nodes carry stable ids so refactorings
//! can describe replacements against the original tree and apply them in a
//! single structural pass.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A half-open byte range `[start, end)` into the source text.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "invalid span: {start}..{end}");
        Span { start, end }
    }

    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    #[must_use]
    pub fn contains(self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    #[must_use]
    pub fn contains_span(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Stable identity of a node within one parsed document.
///
/// The parser assigns ids sequentially. Nodes synthesized by a refactoring
/// carry [`NodeId::SYNTHETIC`] and are never valid replacement keys.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub const SYNTHETIC: NodeId = NodeId(u32::MAX);

    pub(crate) fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    #[must_use]
    pub fn is_synthetic(self) -> bool {
        self == NodeId::SYNTHETIC
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_synthetic() {
            write!(f, "NodeId(synthetic)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    pub usings: Vec<UsingDirective>,
    pub types: Vec<ClassDecl>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsingDirective {
    pub path: String,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub id: NodeId,
    pub modifiers: Vec<String>,
    pub name: String,
    pub name_range: Span,
    pub members: Vec<MemberDecl>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberDecl {
    Field(FieldDecl),
    Method(MethodDecl),
    Constructor(ConstructorDecl),
}

impl MemberDecl {
    #[must_use]
    pub fn id(&self) -> NodeId {
        match self {
            MemberDecl::Field(decl) => decl.id,
            MemberDecl::Method(decl) => decl.id,
            MemberDecl::Constructor(decl) => decl.id,
        }
    }

    #[must_use]
    pub fn range(&self) -> Span {
        match self {
            MemberDecl::Field(decl) => decl.range,
            MemberDecl::Method(decl) => decl.range,
            MemberDecl::Constructor(decl) => decl.range,
        }
    }
}

/// A type reference rendered to canonical text (`int`, `Action<int, string>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub text: String,
    pub range: Span,
}

impl TypeRef {
    #[must_use]
    pub fn synthesized(text: impl Into<String>) -> Self {
        TypeRef {
            text: text.into(),
            range: Span::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub id: NodeId,
    pub modifiers: Vec<String>,
    pub ty: TypeRef,
    pub name: String,
    pub name_range: Span,
    pub initializer: Option<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    pub id: NodeId,
    pub ty: TypeRef,
    pub name: String,
    pub name_range: Span,
    pub range: Span,
}

impl ParamDecl {
    #[must_use]
    pub fn synthesized(ty: impl Into<String>, name: impl Into<String>) -> Self {
        ParamDecl {
            id: NodeId::SYNTHETIC,
            ty: TypeRef::synthesized(ty),
            name: name.into(),
            name_range: Span::default(),
            range: Span::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub id: NodeId,
    pub modifiers: Vec<String>,
    /// `void` is represented literally, as in the source.
    pub return_ty: TypeRef,
    pub name: String,
    pub name_range: Span,
    pub params: Vec<ParamDecl>,
    pub body: Option<MethodBody>,
    pub range: Span,
}

impl MethodDecl {
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers.iter().any(|m| m == "static")
    }

    #[must_use]
    pub fn returns_void(&self) -> bool {
        self.return_ty.text == "void"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorDecl {
    pub id: NodeId,
    pub modifiers: Vec<String>,
    pub name: String,
    pub name_range: Span,
    pub params: Vec<ParamDecl>,
    pub body: Block,
    pub range: Span,
}

impl ConstructorDecl {
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers.iter().any(|m| m == "static")
    }
}

/// Method bodies come in block form or expression form (`=> expr;`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodBody {
    Block(Block),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: NodeId,
    pub statements: Vec<Stmt>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    LocalVar(LocalVarStmt),
    Expr(ExprStmt),
    Return(ReturnStmt),
    Block(Block),
    Empty { id: NodeId, range: Span },
}

impl Stmt {
    #[must_use]
    pub fn id(&self) -> NodeId {
        match self {
            Stmt::LocalVar(stmt) => stmt.id,
            Stmt::Expr(stmt) => stmt.id,
            Stmt::Return(stmt) => stmt.id,
            Stmt::Block(block) => block.id,
            Stmt::Empty { id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVarStmt {
    pub id: NodeId,
    pub ty: TypeRef,
    pub name: String,
    pub name_range: Span,
    pub initializer: Option<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprStmt {
    pub id: NodeId,
    pub expr: Expr,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnStmt {
    pub id: NodeId,
    pub expr: Option<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Name(NameExpr),
    IntLiteral(LiteralExpr),
    StringLiteral(LiteralExpr),
    MemberAccess(MemberAccessExpr),
    Call(CallExpr),
    ObjectCreation(ObjectCreationExpr),
    Lambda(LambdaExpr),
    Binary(BinaryExpr),
}

impl Expr {
    #[must_use]
    pub fn id(&self) -> NodeId {
        match self {
            Expr::Name(expr) => expr.id,
            Expr::IntLiteral(expr) | Expr::StringLiteral(expr) => expr.id,
            Expr::MemberAccess(expr) => expr.id,
            Expr::Call(expr) => expr.id,
            Expr::ObjectCreation(expr) => expr.id,
            Expr::Lambda(expr) => expr.id,
            Expr::Binary(expr) => expr.id,
        }
    }

    #[must_use]
    pub fn range(&self) -> Span {
        match self {
            Expr::Name(expr) => expr.range,
            Expr::IntLiteral(expr) | Expr::StringLiteral(expr) => expr.range,
            Expr::MemberAccess(expr) => expr.range,
            Expr::Call(expr) => expr.range,
            Expr::ObjectCreation(expr) => expr.range,
            Expr::Lambda(expr) => expr.range,
            Expr::Binary(expr) => expr.range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameExpr {
    pub id: NodeId,
    pub name: String,
    pub range: Span,
}

impl NameExpr {
    #[must_use]
    pub fn synthesized(name: impl Into<String>) -> Self {
        NameExpr {
            id: NodeId::SYNTHETIC,
            name: name.into(),
            range: Span::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralExpr {
    pub id: NodeId,
    pub value: String,
    pub range: Span,
}

/// `receiver.name` — the member name is part of this node, not a child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberAccessExpr {
    pub id: NodeId,
    pub receiver: Box<Expr>,
    pub name: String,
    pub name_range: Span,
    pub range: Span,
}

impl MemberAccessExpr {
    #[must_use]
    pub fn synthesized(receiver: Expr, name: impl Into<String>) -> Self {
        MemberAccessExpr {
            id: NodeId::SYNTHETIC,
            receiver: Box::new(receiver),
            name: name.into(),
            name_range: Span::default(),
            range: Span::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpr {
    pub id: NodeId,
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
    pub range: Span,
}

impl CallExpr {
    #[must_use]
    pub fn synthesized(callee: Expr, args: Vec<Expr>) -> Self {
        CallExpr {
            id: NodeId::SYNTHETIC,
            callee: Box::new(callee),
            args,
            range: Span::default(),
        }
    }
}

/// `new TypeName(args)`; the type name is part of this node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectCreationExpr {
    pub id: NodeId,
    pub type_name: String,
    pub type_name_range: Span,
    pub args: Vec<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaExpr {
    pub id: NodeId,
    pub params: Vec<String>,
    pub body: Box<Expr>,
    pub range: Span,
}

impl LambdaExpr {
    #[must_use]
    pub fn synthesized(params: Vec<String>, body: Expr) -> Self {
        LambdaExpr {
            id: NodeId::SYNTHETIC,
            params,
            body: Box::new(body),
            range: Span::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryExpr {
    pub id: NodeId,
    pub op: BinaryOp,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub range: Span,
}
