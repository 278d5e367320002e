use pretty_assertions::assert_eq;

use crate::ast::{Expr, MemberDecl, MethodBody, Span, Stmt};
use crate::node_map::{IdentRef, NodeIndex};
use crate::parse::parse;
use crate::print::{print_expr, print_unit};

fn roundtrip(source: &str) -> String {
    let unit = parse(source).unwrap_or_else(|err| panic!("parse failed: {err}"));
    print_unit(&unit)
}

fn span_of(source: &str, needle: &str) -> Span {
    let start = source.find(needle).expect("needle in source");
    Span::new(start, start + needle.len())
}

#[test]
fn prints_a_simple_class() {
    let out = roundtrip("class C { void M() { } }");
    assert_eq!(out, "class C\n{\n    void M()\n    {\n    }\n}\n");
}

#[test]
fn print_is_idempotent() {
    let source = r#"
using System;

public class HelloWorld
{
    static int counter = 0;

    public HelloWorld(int seed)
    {
        Console.WriteLine(seed + 1);
    }

    public static void DoSomething(Action<int> doSomethingElse)
    {
        doSomethingElse(1);
    }

    static int Compute() => counter * 2;

    void Caller()
    {
        DoSomething(x => Console.WriteLine(x));
        HelloWorld h = new HelloWorld(Compute());
    }
}
"#;
    let once = roundtrip(source);
    let twice = roundtrip(&once);
    assert_eq!(once, twice);
}

#[test]
fn parses_usings_and_modifiers() {
    let unit = parse("using System;\nusing System.Linq;\npublic static class C { }").unwrap();
    assert_eq!(unit.usings.len(), 2);
    assert_eq!(unit.usings[1].path, "System.Linq");
    assert_eq!(unit.types[0].modifiers, vec!["public", "static"]);
}

#[test]
fn parses_generic_parameter_types() {
    let unit = parse("class C { void M(Func<int, string> f) { } }").unwrap();
    let MemberDecl::Method(method) = &unit.types[0].members[0] else {
        panic!("expected method");
    };
    assert_eq!(method.params[0].ty.text, "Func<int, string>");
}

#[test]
fn distinguishes_local_var_from_expr_statement() {
    let unit = parse("class C { void M() { int x = 1; x.ToString(); } }").unwrap();
    let MemberDecl::Method(method) = &unit.types[0].members[0] else {
        panic!("expected method");
    };
    let Some(MethodBody::Block(block)) = &method.body else {
        panic!("expected block body");
    };
    assert!(matches!(block.statements[0], Stmt::LocalVar(_)));
    assert!(matches!(block.statements[1], Stmt::Expr(_)));
}

#[test]
fn parses_constructors_and_static_constructors() {
    let unit = parse("class C { static C() { } C(int x) { } }").unwrap();
    let ctors: Vec<_> = unit.types[0]
        .members
        .iter()
        .filter_map(|m| match m {
            MemberDecl::Constructor(c) => Some(c),
            _ => None,
        })
        .collect();
    assert_eq!(ctors.len(), 2);
    assert!(ctors[0].is_static());
    assert!(!ctors[1].is_static());
}

#[test]
fn lambda_printing_matches_parameter_count() {
    let unit = parse("class C { void M() { F(() => G()); F(x => x); F((a, b) => a + b); } }")
        .unwrap();
    let MemberDecl::Method(method) = &unit.types[0].members[0] else {
        panic!("expected method");
    };
    let Some(MethodBody::Block(block)) = &method.body else {
        panic!("expected block body");
    };
    let lambdas: Vec<String> = block
        .statements
        .iter()
        .map(|stmt| {
            let Stmt::Expr(expr_stmt) = stmt else {
                panic!("expected expression statement");
            };
            let Expr::Call(call) = &expr_stmt.expr else {
                panic!("expected call");
            };
            print_expr(&call.args[0])
        })
        .collect();
    assert_eq!(lambdas, vec!["() => G()", "x => x", "(a, b) => a + b"]);
}

#[test]
fn parenthesized_expression_is_not_a_lambda() {
    let unit = parse("class C { int M() { return (1 + 2) * 3; } }").unwrap();
    assert_eq!(roundtrip("class C { int M() { return (1 + 2) * 3; } }"), print_unit(&unit));
    let MemberDecl::Method(method) = &unit.types[0].members[0] else {
        panic!("expected method");
    };
    let Some(MethodBody::Block(block)) = &method.body else {
        panic!("expected block body");
    };
    let Stmt::Return(ret) = &block.statements[0] else {
        panic!("expected return");
    };
    assert!(matches!(ret.expr.as_ref(), Some(Expr::Binary(_))));
}

#[test]
fn rejects_unclosed_class() {
    assert!(parse("class C {").is_err());
}

#[test]
fn index_resolves_identifier_of_simple_call() {
    let source = "class C { void M() { DoSomethingElse(1); } void DoSomethingElse(int x) { } }";
    let unit = parse(source).unwrap();
    let index = NodeIndex::new(&unit);
    let ident = index
        .identifier_at(span_of(source, "DoSomethingElse"))
        .expect("identifier");
    let IdentRef::Name(id) = ident else {
        panic!("expected a name reference, got {ident:?}");
    };
    let parent = index.parent_expr(id).expect("parent");
    assert!(matches!(parent, Expr::Call(_)));
}

#[test]
fn index_resolves_member_access_name() {
    let source = "class C { void M() { Console.WriteLine(1); } }";
    let unit = parse(source).unwrap();
    let index = NodeIndex::new(&unit);
    let ident = index
        .identifier_at(span_of(source, "WriteLine"))
        .expect("identifier");
    assert!(matches!(ident, IdentRef::Member(_)));
}

#[test]
fn index_resolves_creation_type_name() {
    let source = "class C { void M() { object o = new Widget(); } }";
    let unit = parse(source).unwrap();
    let index = NodeIndex::new(&unit);
    let ident = index
        .identifier_at(span_of(source, "Widget"))
        .expect("identifier");
    assert!(matches!(ident, IdentRef::CreationType(_)));
}

#[test]
fn index_finds_enclosing_member() {
    let source = "class C { void M() { Helper(); } void Helper() { } }";
    let unit = parse(source).unwrap();
    let index = NodeIndex::new(&unit);
    let ident = index.identifier_at(span_of(source, "Helper")).expect("identifier");
    let (class, member) = index.enclosing_member(ident.node()).expect("member");
    assert_eq!(class.name, "C");
    let MemberDecl::Method(method) = member else {
        panic!("expected method");
    };
    assert_eq!(method.name, "M");
}
