//! Call-site classification.
//!
//! An identifier participates in a rewritable call site in exactly four
//! shapes: the callee of a bare invocation (`Foo(..)`), the member name or
//! the receiver of a qualified invocation (`recv.Foo(..)`), or the type
//! name of an object creation (`new Foo(..)`). Anything else, an argument
//! position, a field initializer name, a plain mention, is not a call site
//! and the refactoring leaves it alone.

use deplift_syntax::ast::{Expr, NodeId, Span};
use deplift_syntax::node_map::{IdentRef, NodeIndex};

/// A reference that can be rewritten as a call: either an invocation or an
/// object creation. The id is the call/creation node itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallLike {
    Invocation(NodeId),
    Construction(NodeId),
}

impl CallLike {
    #[must_use]
    pub fn node(self) -> NodeId {
        match self {
            CallLike::Invocation(id) | CallLike::Construction(id) => id,
        }
    }
}

/// Classify an already-located identifier as a call site.
#[must_use]
pub fn classify_ident(index: &NodeIndex<'_>, ident: IdentRef) -> Option<CallLike> {
    match ident {
        IdentRef::Name(id) => {
            let parent = index.parent_expr(id)?;
            match parent {
                Expr::Call(call) if call.callee.id() == id => {
                    Some(CallLike::Invocation(call.id))
                }
                // The receiver of `recv.Foo(..)` selects the outer call.
                Expr::MemberAccess(access) if access.receiver.id() == id => {
                    match index.parent_expr(access.id)? {
                        Expr::Call(call) if call.callee.id() == access.id => {
                            Some(CallLike::Invocation(call.id))
                        }
                        _ => None,
                    }
                }
                _ => None,
            }
        }
        IdentRef::Member(id) => {
            let parent = index.parent_expr(id)?;
            match parent {
                Expr::Call(call) if call.callee.id() == id => {
                    Some(CallLike::Invocation(call.id))
                }
                _ => None,
            }
        }
        IdentRef::CreationType(id) => Some(CallLike::Construction(id)),
    }
}

/// Find the call site whose callee identifier covers `span`.
#[must_use]
pub fn find_call_like(index: &NodeIndex<'_>, span: Span) -> Option<CallLike> {
    classify_ident(index, index.identifier_at(span)?)
}

/// Like [`find_call_like`], restricted to invocations. Extraction targets
/// must be invocations; constructions only show up on the caller side.
#[must_use]
pub fn find_invocation(index: &NodeIndex<'_>, span: Span) -> Option<NodeId> {
    match find_call_like(index, span)? {
        CallLike::Invocation(id) => Some(id),
        CallLike::Construction(_) => None,
    }
}
