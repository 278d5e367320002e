//! Rewriting the extracted call site itself.
//!
//! Inside the enclosing method, `Target(a, b, c)` (or `recv.Target(...)`)
//! becomes `target(kept...)`: the callee collapses to the injected parameter
//! name and removed arguments disappear, they are the callers' job now.

use deplift_syntax::ast::{CallExpr, Expr, NameExpr};

use crate::retention::RetentionPlan;

#[must_use]
pub fn rewrite_extracted_call(call: &CallExpr, plan: &RetentionPlan) -> Expr {
    let args: Vec<Expr> = plan
        .kept
        .iter()
        .filter_map(|&i| call.args.get(i))
        .cloned()
        .collect();
    Expr::Call(CallExpr::synthesized(
        Expr::Name(NameExpr::synthesized(plan.injected_name.clone())),
        args,
    ))
}
