//! Caller propagation.
//!
//! Once the enclosing method gains its injected parameter, every direct
//! caller must supply a value for it. A caller passes a bare method group
//! when the injected function's shape matches the target exactly (nothing
//! was removed), and a lambda otherwise: kept parameters become lambda
//! parameters, removed arguments are inlined into the lambda body with the
//! enclosing method's parameters substituted by the caller's actuals.
//!
//! Propagation is one hop. Callers of callers keep their signatures; only
//! the sites that mention the changed method are rewritten.

use std::collections::HashMap;

use deplift_syntax::ast::{
    CallExpr, Expr, LambdaExpr, MemberAccessExpr, NameExpr, ObjectCreationExpr,
};

use crate::retention::RetentionPlan;
use crate::semantic::{MethodInfo, ParamInfo};

/// Everything a caller rewrite needs from the extraction site, captured
/// before any tree is modified.
pub struct CallerContext<'a> {
    /// The enclosing method's parameters before the signature change.
    pub old_params: &'a [ParamInfo],
    pub plan: &'a RetentionPlan,
    pub target: &'a MethodInfo,
    /// Callee of the extracted call, as written (`Target` or `recv.Target`).
    pub extracted_callee: &'a Expr,
    /// Arguments of the extracted call, as written.
    pub extracted_args: &'a [Expr],
}

/// Rewrite one reference to the changed method. Returns the replacement
/// expression, or `None` when the reference does not have the shape the old
/// signature implies (wrong arity, not a call).
#[must_use]
pub fn rewrite_caller(reference: &Expr, ctx: &CallerContext<'_>) -> Option<Expr> {
    match reference {
        Expr::Call(call) => {
            let (args, subst) = rewritten_args(&call.args, ctx)?;
            let mut args = args;
            args.push(injected_argument(ctx, &subst));
            Some(Expr::Call(CallExpr::synthesized(
                call.callee.as_ref().clone(),
                args,
            )))
        }
        Expr::ObjectCreation(creation) => {
            let (args, subst) = rewritten_args(&creation.args, ctx)?;
            let mut args = args;
            args.push(injected_argument(ctx, &subst));
            Some(Expr::ObjectCreation(ObjectCreationExpr {
                id: deplift_syntax::ast::NodeId::SYNTHETIC,
                type_name: creation.type_name.clone(),
                type_name_range: deplift_syntax::ast::Span::default(),
                args,
                range: deplift_syntax::ast::Span::default(),
            }))
        }
        _ => None,
    }
}

/// Drop the actuals whose parameters died and build the substitution map
/// from old parameter names to the caller's actual expressions.
fn rewritten_args<'a>(
    actuals: &'a [Expr],
    ctx: &CallerContext<'_>,
) -> Option<(Vec<Expr>, HashMap<String, Expr>)> {
    if actuals.len() != ctx.old_params.len() {
        return None;
    }
    let mut subst = HashMap::new();
    let mut kept = Vec::new();
    for (param, actual) in ctx.old_params.iter().zip(actuals) {
        subst.insert(param.name.clone(), actual.clone());
        if !ctx.plan.dead_params.contains(&param.name) {
            kept.push(actual.clone());
        }
    }
    Some((kept, subst))
}

/// The value the caller passes for the injected parameter.
fn injected_argument(ctx: &CallerContext<'_>, subst: &HashMap<String, Expr>) -> Expr {
    // The callee keeps its written shape; only a receiver can mention the
    // enclosing method's parameters, so only the receiver is substituted.
    let callee = match ctx.extracted_callee {
        Expr::MemberAccess(access) => Expr::MemberAccess(MemberAccessExpr::synthesized(
            substitute_params(&access.receiver, subst),
            access.name.clone(),
        )),
        other => other.clone(),
    };

    if ctx.plan.removed.is_empty() {
        // Shapes match, a method group is enough.
        return callee;
    }

    let lambda_params: Vec<String> = ctx
        .plan
        .kept
        .iter()
        .filter_map(|&i| ctx.target.params.get(i))
        .map(|param| param.name.clone())
        .collect();
    let body_args: Vec<Expr> = ctx
        .extracted_args
        .iter()
        .enumerate()
        .map(|(i, arg)| {
            if ctx.plan.kept.contains(&i) {
                match ctx.target.params.get(i) {
                    Some(param) => Expr::Name(NameExpr::synthesized(param.name.clone())),
                    None => substitute_params(arg, subst),
                }
            } else {
                substitute_params(arg, subst)
            }
        })
        .collect();
    Expr::Lambda(LambdaExpr::synthesized(
        lambda_params,
        Expr::Call(CallExpr::synthesized(callee, body_args)),
    ))
}

/// Clone `expr`, replacing every free mention of an old parameter with the
/// caller's actual for it. Lambda parameters shadow the substitution.
fn substitute_params(expr: &Expr, subst: &HashMap<String, Expr>) -> Expr {
    match expr {
        Expr::Name(name) => match subst.get(&name.name) {
            Some(actual) => actual.clone(),
            None => Expr::Name(name.clone()),
        },
        Expr::IntLiteral(_) | Expr::StringLiteral(_) => expr.clone(),
        Expr::MemberAccess(access) => Expr::MemberAccess(MemberAccessExpr::synthesized(
            substitute_params(&access.receiver, subst),
            access.name.clone(),
        )),
        Expr::Call(call) => Expr::Call(CallExpr::synthesized(
            substitute_params(&call.callee, subst),
            call.args
                .iter()
                .map(|arg| substitute_params(arg, subst))
                .collect(),
        )),
        Expr::ObjectCreation(creation) => Expr::ObjectCreation(ObjectCreationExpr {
            id: deplift_syntax::ast::NodeId::SYNTHETIC,
            type_name: creation.type_name.clone(),
            type_name_range: deplift_syntax::ast::Span::default(),
            args: creation
                .args
                .iter()
                .map(|arg| substitute_params(arg, subst))
                .collect(),
            range: deplift_syntax::ast::Span::default(),
        }),
        Expr::Lambda(lambda) => {
            let mut inner = subst.clone();
            for param in &lambda.params {
                inner.remove(param);
            }
            Expr::Lambda(LambdaExpr::synthesized(
                lambda.params.clone(),
                substitute_params(&lambda.body, &inner),
            ))
        }
        Expr::Binary(binary) => Expr::Binary(deplift_syntax::ast::BinaryExpr {
            id: deplift_syntax::ast::NodeId::SYNTHETIC,
            op: binary.op,
            lhs: Box::new(substitute_params(&binary.lhs, subst)),
            rhs: Box::new(substitute_params(&binary.rhs, subst)),
            range: deplift_syntax::ast::Span::default(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deplift_syntax::parse::parse;
    use deplift_syntax::print::print_expr;
    use pretty_assertions::assert_eq;

    use crate::change::FileId;
    use crate::delegate::synthesize;
    use crate::semantic::{FunctionKind, MethodKey};

    fn target(name: &str, params: &[(&str, &str)], return_ty: Option<&str>) -> MethodInfo {
        MethodInfo {
            key: MethodKey {
                file: FileId::new("a.cs"),
                node: deplift_syntax::ast::NodeId::SYNTHETIC,
            },
            kind: FunctionKind::Method,
            class_name: "C".to_string(),
            name: name.to_string(),
            params: params
                .iter()
                .map(|(ty, pname)| ParamInfo {
                    ty: (*ty).to_string(),
                    name: (*pname).to_string(),
                })
                .collect(),
            return_ty: return_ty.map(str::to_string),
            is_static: false,
        }
    }

    fn expr_at(source: &str, start: usize) -> Expr {
        let unit = parse(source).expect("parse");
        let index = deplift_syntax::node_map::NodeIndex::new(&unit);
        let span = deplift_syntax::ast::Span::new(start, start + 1);
        let ident = index.identifier_at(span).expect("identifier");
        let call = crate::classify::classify_ident(&index, ident).expect("call site");
        index.expr(call.node()).expect("expr").clone()
    }

    fn expr_in(source: &str, needle: &str) -> Expr {
        expr_at(source, source.find(needle).expect("needle"))
    }

    fn plan(
        kept: Vec<usize>,
        removed: Vec<usize>,
        kept_types: &[&str],
        return_ty: Option<&str>,
        dead: Vec<&str>,
    ) -> RetentionPlan {
        let types: Vec<String> = kept_types.iter().map(|t| (*t).to_string()).collect();
        let delegate = synthesize(&types, return_ty).expect("delegate");
        RetentionPlan {
            kept,
            removed,
            delegate,
            injected_name: "doSomethingElse".to_string(),
            dead_params: dead.into_iter().map(str::to_string).collect(),
            new_params: Vec::new(),
        }
    }

    #[test]
    fn keep_all_caller_passes_a_method_group() {
        let target = target("DoSomethingElse", &[("int", "x")], None);
        let extracted = expr_in(
            "class C { void M() { DoSomethingElse(1); } }",
            "DoSomethingElse",
        );
        let Expr::Call(extracted) = extracted else {
            panic!("expected call");
        };
        let plan = plan(vec![0], vec![], &["int"], None, vec![]);
        let ctx = CallerContext {
            old_params: &[],
            plan: &plan,
            target: &target,
            extracted_callee: &extracted.callee,
            extracted_args: &extracted.args,
        };
        let reference = expr_in("class C { void Caller() { DoSomething(); } }", "DoSomething");
        let rewritten = rewrite_caller(&reference, &ctx).expect("rewritten");
        assert_eq!(print_expr(&rewritten), "DoSomething(DoSomethingElse)");
    }

    #[test]
    fn remove_all_caller_passes_a_lambda_with_inlined_arguments() {
        let target = target("DoSomethingElse", &[("int", "x")], None);
        let extracted = expr_in(
            "class C { void M() { DoSomethingElse(1); } }",
            "DoSomethingElse",
        );
        let Expr::Call(extracted) = extracted else {
            panic!("expected call");
        };
        let plan = plan(vec![], vec![0], &[], None, vec![]);
        let ctx = CallerContext {
            old_params: &[],
            plan: &plan,
            target: &target,
            extracted_callee: &extracted.callee,
            extracted_args: &extracted.args,
        };
        let reference = expr_in("class C { void Caller() { DoSomething(); } }", "DoSomething");
        let rewritten = rewrite_caller(&reference, &ctx).expect("rewritten");
        assert_eq!(
            print_expr(&rewritten),
            "DoSomething(() => DoSomethingElse(1))"
        );
    }

    #[test]
    fn dead_actuals_are_dropped_and_substituted_into_the_lambda() {
        let target = target("DoSomethingElse", &[("int", "x")], None);
        let extracted = expr_in(
            "class C { void DoSomething(int x) { DoSomethingElse(x); } }",
            "DoSomethingElse",
        );
        let Expr::Call(extracted) = extracted else {
            panic!("expected call");
        };
        let plan = plan(vec![], vec![0], &[], None, vec!["x"]);
        let old_params = [ParamInfo {
            ty: "int".to_string(),
            name: "x".to_string(),
        }];
        let ctx = CallerContext {
            old_params: &old_params,
            plan: &plan,
            target: &target,
            extracted_callee: &extracted.callee,
            extracted_args: &extracted.args,
        };
        let reference = expr_in(
            "class C { void Caller() { DoSomething(41 + 1); } }",
            "DoSomething",
        );
        let rewritten = rewrite_caller(&reference, &ctx).expect("rewritten");
        assert_eq!(
            print_expr(&rewritten),
            "DoSomething(() => DoSomethingElse(41 + 1))"
        );
    }

    #[test]
    fn constructor_references_are_rewritten_like_calls() {
        let target = target("DoSomethingElse", &[], None);
        let extracted = expr_in(
            "class C { C() { DoSomethingElse(); } }",
            "DoSomethingElse",
        );
        let Expr::Call(extracted) = extracted else {
            panic!("expected call");
        };
        let plan = plan(vec![], vec![], &[], None, vec![]);
        let ctx = CallerContext {
            old_params: &[],
            plan: &plan,
            target: &target,
            extracted_callee: &extracted.callee,
            extracted_args: &extracted.args,
        };
        let caller_source = "class D { void Caller() { C c = new C(); } }";
        let reference = expr_at(caller_source, caller_source.rfind('C').expect("type name"));
        let rewritten = rewrite_caller(&reference, &ctx).expect("rewritten");
        assert_eq!(print_expr(&rewritten), "new C(DoSomethingElse)");
    }

    #[test]
    fn arity_mismatch_is_not_rewritten() {
        let target = target("DoSomethingElse", &[], None);
        let extracted = expr_in(
            "class C { void M() { DoSomethingElse(); } }",
            "DoSomethingElse",
        );
        let Expr::Call(extracted) = extracted else {
            panic!("expected call");
        };
        let plan = plan(vec![], vec![], &[], None, vec![]);
        let old_params = [ParamInfo {
            ty: "int".to_string(),
            name: "x".to_string(),
        }];
        let ctx = CallerContext {
            old_params: &old_params,
            plan: &plan,
            target: &target,
            extracted_callee: &extracted.callee,
            extracted_args: &extracted.args,
        };
        let reference = expr_in("class C { void Caller() { DoSomething(); } }", "DoSomething");
        assert!(rewrite_caller(&reference, &ctx).is_none());
    }
}
