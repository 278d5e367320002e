//! Deterministic pretty-printer.
//!
//! Refactorings rebuild trees structurally, so the output text is always
//! regenerated from the AST. Fixture tests print both the refactored unit and
//! a parse of the expected source through this printer, which makes the
//! comparison whitespace-insensitive by construction.

use crate::ast::{
    Block, CompilationUnit, Expr, MemberDecl, MethodBody, Stmt,
};

const INDENT: &str = "    ";

/// Render a compilation unit back to source text.
#[must_use]
pub fn print_unit(unit: &CompilationUnit) -> String {
    let mut out = String::new();
    for using in &unit.usings {
        out.push_str("using ");
        out.push_str(&using.path);
        out.push_str(";\n");
    }
    if !unit.usings.is_empty() && !unit.types.is_empty() {
        out.push('\n');
    }

    for (i, class) in unit.types.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for modifier in &class.modifiers {
            out.push_str(modifier);
            out.push(' ');
        }
        out.push_str("class ");
        out.push_str(&class.name);
        out.push_str("\n{\n");
        for (j, member) in class.members.iter().enumerate() {
            if j > 0 {
                out.push('\n');
            }
            print_member(&mut out, member, 1);
        }
        out.push_str("}\n");
    }
    out
}

/// Render a single expression (used by tests and diagnostics).
#[must_use]
pub fn print_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn print_member(out: &mut String, member: &MemberDecl, depth: usize) {
    match member {
        MemberDecl::Field(field) => {
            push_indent(out, depth);
            for modifier in &field.modifiers {
                out.push_str(modifier);
                out.push(' ');
            }
            out.push_str(&field.ty.text);
            out.push(' ');
            out.push_str(&field.name);
            if let Some(init) = &field.initializer {
                out.push_str(" = ");
                write_expr(out, init);
            }
            out.push_str(";\n");
        }
        MemberDecl::Method(method) => {
            push_indent(out, depth);
            for modifier in &method.modifiers {
                out.push_str(modifier);
                out.push(' ');
            }
            out.push_str(&method.return_ty.text);
            out.push(' ');
            out.push_str(&method.name);
            write_params(out, &method.params);
            match &method.body {
                Some(MethodBody::Block(block)) => {
                    out.push('\n');
                    print_block(out, block, depth);
                }
                Some(MethodBody::Expr(expr)) => {
                    out.push_str(" => ");
                    write_expr(out, expr);
                    out.push_str(";\n");
                }
                None => out.push_str(";\n"),
            }
        }
        MemberDecl::Constructor(ctor) => {
            push_indent(out, depth);
            for modifier in &ctor.modifiers {
                out.push_str(modifier);
                out.push(' ');
            }
            out.push_str(&ctor.name);
            write_params(out, &ctor.params);
            out.push('\n');
            print_block(out, &ctor.body, depth);
        }
    }
}

fn write_params(out: &mut String, params: &[crate::ast::ParamDecl]) {
    out.push('(');
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&param.ty.text);
        out.push(' ');
        out.push_str(&param.name);
    }
    out.push(')');
}

fn print_block(out: &mut String, block: &Block, depth: usize) {
    push_indent(out, depth);
    out.push_str("{\n");
    for stmt in &block.statements {
        print_stmt(out, stmt, depth + 1);
    }
    push_indent(out, depth);
    out.push_str("}\n");
}

fn print_stmt(out: &mut String, stmt: &Stmt, depth: usize) {
    match stmt {
        Stmt::LocalVar(local) => {
            push_indent(out, depth);
            out.push_str(&local.ty.text);
            out.push(' ');
            out.push_str(&local.name);
            if let Some(init) = &local.initializer {
                out.push_str(" = ");
                write_expr(out, init);
            }
            out.push_str(";\n");
        }
        Stmt::Expr(expr_stmt) => {
            push_indent(out, depth);
            write_expr(out, &expr_stmt.expr);
            out.push_str(";\n");
        }
        Stmt::Return(ret) => {
            push_indent(out, depth);
            out.push_str("return");
            if let Some(expr) = &ret.expr {
                out.push(' ');
                write_expr(out, expr);
            }
            out.push_str(";\n");
        }
        Stmt::Block(block) => print_block(out, block, depth),
        Stmt::Empty { .. } => {
            push_indent(out, depth);
            out.push_str(";\n");
        }
    }
}

fn write_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Name(name) => out.push_str(&name.name),
        Expr::IntLiteral(lit) => out.push_str(&lit.value),
        Expr::StringLiteral(lit) => {
            out.push('"');
            out.push_str(&lit.value);
            out.push('"');
        }
        Expr::MemberAccess(access) => {
            write_expr(out, &access.receiver);
            out.push('.');
            out.push_str(&access.name);
        }
        Expr::Call(call) => {
            write_expr(out, &call.callee);
            write_args(out, &call.args);
        }
        Expr::ObjectCreation(creation) => {
            out.push_str("new ");
            out.push_str(&creation.type_name);
            write_args(out, &creation.args);
        }
        Expr::Lambda(lambda) => {
            if lambda.params.len() == 1 {
                out.push_str(&lambda.params[0]);
            } else {
                out.push('(');
                for (i, param) in lambda.params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(param);
                }
                out.push(')');
            }
            out.push_str(" => ");
            write_expr(out, &lambda.body);
        }
        Expr::Binary(binary) => {
            let prec = precedence(binary.op);
            write_operand(out, &binary.lhs, prec, false);
            out.push(' ');
            out.push_str(binary.op.as_str());
            out.push(' ');
            write_operand(out, &binary.rhs, prec, true);
        }
    }
}

fn precedence(op: crate::ast::BinaryOp) -> u8 {
    use crate::ast::BinaryOp;
    match op {
        BinaryOp::Add | BinaryOp::Sub => 1,
        BinaryOp::Mul | BinaryOp::Div => 2,
    }
}

/// Parenthesize a binary operand when the source grouping would otherwise be
/// lost. Operators are left-associative, so the right operand needs parens
/// even at equal precedence.
fn write_operand(out: &mut String, expr: &Expr, parent_prec: u8, is_rhs: bool) {
    let needs_parens = match expr {
        Expr::Binary(child) => {
            let child_prec = precedence(child.op);
            child_prec < parent_prec || (is_rhs && child_prec == parent_prec)
        }
        Expr::Lambda(_) => true,
        _ => false,
    };
    if needs_parens {
        out.push('(');
        write_expr(out, expr);
        out.push(')');
    } else {
        write_expr(out, expr);
    }
}

fn write_args(out: &mut String, args: &[Expr]) {
    out.push('(');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, arg);
    }
    out.push(')');
}
