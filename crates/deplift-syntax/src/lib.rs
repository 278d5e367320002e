//! Syntax support for the dependency-extraction engine: a lightweight C#
//! subset AST with stable node ids, a hand-written lexer/parser, a
//! deterministic printer, and a per-document node index.

pub mod ast;
pub mod node_map;
pub mod parse;
pub mod print;

pub use ast::{
    BinaryExpr, BinaryOp, Block, CallExpr, ClassDecl, CompilationUnit, ConstructorDecl, Expr,
    ExprStmt, FieldDecl, LambdaExpr, LiteralExpr, LocalVarStmt, MemberAccessExpr, MemberDecl,
    MethodBody, MethodDecl, NameExpr, NodeId, ObjectCreationExpr, ParamDecl, ReturnStmt, Span,
    Stmt, TypeRef, UsingDirective,
};
pub use node_map::{walk_block_exprs, walk_expr, walk_member_exprs, IdentRef, NodeIndex};
pub use parse::{parse, ParseError};
pub use print::{print_expr, print_unit};

#[cfg(test)]
mod tests;
