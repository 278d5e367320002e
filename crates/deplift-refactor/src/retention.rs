//! Parameter retention: which arguments stay at the rewritten call site,
//! which move to the callers, and which enclosing-method parameters die.
//!
//! An argument marked `Keep` remains an argument of the injected function,
//! so its type becomes a slot of the synthesized delegate. An argument
//! marked `Remove` is evaluated by the callers instead; any parameter of the
//! enclosing method whose only uses sat inside removed arguments or inside
//! the invoked expression (the receiver vanishes with the callee) is deleted
//! from the signature along with it.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use deplift_syntax::ast::{CallExpr, Expr, MemberDecl, NodeId, ParamDecl};
use deplift_syntax::node_map::{walk_expr, walk_member_exprs};
use deplift_syntax::print::print_expr;

use crate::delegate::{synthesize, DelegateType, UnsupportedArity};
use crate::semantic::MethodInfo;

/// Per-argument decision made by an [`crate::extract::ArgumentPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentDisposition {
    /// The injected function still receives this argument.
    Keep,
    /// The argument moves into the callers' lambdas.
    Remove,
}

/// Snapshot of one actual argument, as presented to a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Argument {
    pub index: usize,
    pub param_ty: String,
    pub param_name: String,
    /// Printed form of the argument expression.
    pub text: String,
}

/// Build the policy-facing argument list for a call resolved to `target`.
#[must_use]
pub fn describe_arguments(target: &MethodInfo, call: &CallExpr) -> Vec<Argument> {
    call.args
        .iter()
        .zip(&target.params)
        .enumerate()
        .map(|(index, (arg, param))| Argument {
            index,
            param_ty: param.ty.clone(),
            param_name: param.name.clone(),
            text: print_expr(arg),
        })
        .collect()
}

/// Everything the rewrite and propagation stages need to know about one
/// extraction, resolved up front.
#[derive(Debug, Clone)]
pub struct RetentionPlan {
    /// Indices (into the target's parameter list) of kept arguments.
    pub kept: Vec<usize>,
    /// Indices of removed arguments.
    pub removed: Vec<usize>,
    pub delegate: DelegateType,
    /// Name of the injected parameter, the target's name lower-cased at the
    /// first letter.
    pub injected_name: String,
    /// Names of enclosing-method parameters deleted by the extraction.
    pub dead_params: Vec<String>,
    /// The enclosing method's rebuilt parameter list, dead parameters gone
    /// and the injected one appended.
    pub new_params: Vec<ParamDecl>,
}

pub fn plan_retention(
    target: &MethodInfo,
    call: &CallExpr,
    dispositions: &[ArgumentDisposition],
    enclosing: &MemberDecl,
) -> Result<RetentionPlan, UnsupportedArity> {
    let mut kept = Vec::new();
    let mut removed = Vec::new();
    for (index, disposition) in dispositions.iter().enumerate() {
        match disposition {
            ArgumentDisposition::Keep => kept.push(index),
            ArgumentDisposition::Remove => removed.push(index),
        }
    }

    let kept_types: Vec<String> = kept
        .iter()
        .filter_map(|&i| target.params.get(i))
        .map(|param| param.ty.clone())
        .collect();
    let delegate = synthesize(&kept_types, target.return_ty.as_deref())?;
    let injected_name = lower_first(&target.name);

    // Every node that vanishes from the extraction site: the removed
    // argument subtrees plus the invoked expression itself (the callee,
    // receiver included, collapses to the injected name). Uses confined to
    // this set disappear from the method body.
    let mut removed_nodes: HashSet<NodeId> = HashSet::new();
    walk_expr(&call.callee, &mut |expr| {
        removed_nodes.insert(expr.id());
    });
    for &index in &removed {
        if let Some(arg) = call.args.get(index) {
            walk_expr(arg, &mut |expr| {
                removed_nodes.insert(expr.id());
            });
        }
    }

    let params = member_params(enclosing);
    let mut dead_params = Vec::new();
    for param in params {
        if is_dead(enclosing, &param.name, &removed_nodes) {
            dead_params.push(param.name.clone());
        }
    }

    let mut new_params: Vec<ParamDecl> = params
        .iter()
        .filter(|param| !dead_params.contains(&param.name))
        .cloned()
        .collect();
    new_params.push(ParamDecl::synthesized(delegate.render(), injected_name.clone()));

    Ok(RetentionPlan {
        kept,
        removed,
        delegate,
        injected_name,
        dead_params,
        new_params,
    })
}

fn member_params(member: &MemberDecl) -> &[ParamDecl] {
    match member {
        MemberDecl::Method(method) => &method.params,
        MemberDecl::Constructor(ctor) => &ctor.params,
        MemberDecl::Field(_) => &[],
    }
}

/// A parameter dies when it is mentioned inside the removed arguments and
/// nowhere else in the member body. A parameter with no uses at all is left
/// alone; deleting it is a different refactoring.
fn is_dead(member: &MemberDecl, param_name: &str, removed_nodes: &HashSet<NodeId>) -> bool {
    let mut inside = 0usize;
    let mut elsewhere = 0usize;
    walk_member_exprs(member, &mut |expr| {
        if let Expr::Name(name) = expr {
            if name.name == param_name {
                if removed_nodes.contains(&name.id) {
                    inside += 1;
                } else {
                    elsewhere += 1;
                }
            }
        }
    });
    inside > 0 && elsewhere == 0
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
