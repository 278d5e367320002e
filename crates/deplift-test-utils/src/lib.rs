//! Fixture helpers for refactoring tests.
//!
//! Tests here describe sources as plain strings and compare results through
//! the printer, so fixtures can be written with whatever whitespace reads
//! best. Helpers panic on malformed fixtures; that is a test bug, not a
//! runtime condition.

use deplift_syntax::ast::{CompilationUnit, Expr, Span};
use deplift_syntax::node_map::walk_member_exprs;
use deplift_syntax::parse::parse;
use deplift_syntax::print::print_unit;

/// Parse and reprint, normalizing whitespace. Panics on parse errors.
#[must_use]
pub fn normalized(source: &str) -> String {
    match parse(source) {
        Ok(unit) => print_unit(&unit),
        Err(err) => panic!("fixture does not parse: {err}\n---\n{source}"),
    }
}

/// The span of the unique expression-position identifier `name` in `unit`.
///
/// Declarations do not count; only name expressions and member-access names
/// match, which is exactly what call-site selection needs. Panics when the
/// identifier is absent or ambiguous.
#[must_use]
pub fn span_of_identifier(unit: &CompilationUnit, name: &str) -> Span {
    let spans = identifier_spans(unit, name);
    match spans.as_slice() {
        [span] => *span,
        [] => panic!("no expression mentions identifier `{name}`"),
        many => panic!("identifier `{name}` is ambiguous ({} mentions)", many.len()),
    }
}

/// All expression-position spans of `name`, in source order.
#[must_use]
pub fn identifier_spans(unit: &CompilationUnit, name: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    for class in &unit.types {
        for member in &class.members {
            walk_member_exprs(member, &mut |expr| match expr {
                Expr::Name(n) if n.name == name => spans.push(n.range),
                Expr::MemberAccess(access) if access.name == name => {
                    spans.push(access.name_range);
                }
                _ => {}
            });
        }
    }
    spans.sort();
    spans
}
