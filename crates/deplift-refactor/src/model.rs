//! In-memory semantic model over a [`Solution`].
//!
//! This is a deliberately small binder for the supported language subset:
//! one flat class namespace, overload selection by name and arity, and
//! local type inference good enough to resolve qualified calls through
//! parameters, locals, fields, object creations and call return types.

use std::collections::{BTreeMap, HashMap, HashSet};

use deplift_syntax::ast::{
    ClassDecl, CompilationUnit, Expr, MemberDecl, MethodBody, NodeId, Stmt,
};
use deplift_syntax::node_map::{walk_member_exprs, NodeIndex};

use crate::change::{FileId, Solution};
use crate::classify::CallLike;
use crate::semantic::{
    FunctionKind, MethodInfo, MethodKey, ParamInfo, ReferenceLocation, SemanticDatabase,
};

pub struct SolutionModel<'a> {
    units: BTreeMap<FileId, &'a CompilationUnit>,
    indexes: BTreeMap<FileId, NodeIndex<'a>>,
    infos: HashMap<MethodKey, MethodInfo>,
    by_class: HashMap<String, Vec<MethodKey>>,
    classes: HashSet<String>,
}

impl<'a> SolutionModel<'a> {
    #[must_use]
    pub fn new(solution: &'a Solution) -> Self {
        let mut model = SolutionModel {
            units: BTreeMap::new(),
            indexes: BTreeMap::new(),
            infos: HashMap::new(),
            by_class: HashMap::new(),
            classes: HashSet::new(),
        };
        for (file, unit) in solution.documents() {
            model.units.insert(file.clone(), unit);
            model.indexes.insert(file.clone(), NodeIndex::new(unit));
            for class in &unit.types {
                model.classes.insert(class.name.clone());
                for member in &class.members {
                    if let Some(info) = declared_info(file, class, member) {
                        let key = info.key.clone();
                        model
                            .by_class
                            .entry(class.name.clone())
                            .or_default()
                            .push(key.clone());
                        model.infos.insert(key, info);
                    }
                }
            }
        }
        model
    }

    #[must_use]
    pub fn index(&self, file: &FileId) -> Option<&NodeIndex<'a>> {
        self.indexes.get(file)
    }

    #[must_use]
    pub fn unit(&self, file: &FileId) -> Option<&'a CompilationUnit> {
        self.units.get(file).copied()
    }

    fn pick_overload(
        &self,
        class: &str,
        name: &str,
        kind: FunctionKind,
        arity: usize,
    ) -> Option<MethodInfo> {
        let keys = self.by_class.get(class).map(Vec::as_slice).unwrap_or(&[]);
        let mut by_name = Vec::new();
        for info in keys.iter().filter_map(|key| self.infos.get(key)) {
            if info.kind != kind || info.name != name {
                continue;
            }
            if info.arity() == arity {
                return Some(info.clone());
            }
            by_name.push(info);
        }
        // Lone overload wins even on an arity mismatch, mirroring how the
        // rewrites are planned against the declaration rather than the site.
        if by_name.len() == 1 {
            return Some(by_name[0].clone());
        }
        None
    }

    /// Best-effort type of an expression, as the declared type text.
    fn infer_expr_type(&self, file: &FileId, expr: &Expr) -> Option<String> {
        match expr {
            Expr::Name(name) => self.binding_type(file, name.id, &name.name),
            Expr::ObjectCreation(creation) => Some(creation.type_name.clone()),
            Expr::Call(call) => {
                let index = self.indexes.get(file)?;
                let target =
                    self.resolve_invocation(file, index, call.id, &call.callee, call.args.len())?;
                target.return_ty
            }
            _ => None,
        }
    }

    /// Resolve a bare name to its declared type: parameters and locals of the
    /// enclosing member first, then fields of the enclosing class.
    fn binding_type(&self, file: &FileId, at: NodeId, name: &str) -> Option<String> {
        let index = self.indexes.get(file)?;
        let (class, member) = index.enclosing_member(at)?;
        if let Some(ty) = member_binding_type(member, name) {
            return Some(ty);
        }
        class.members.iter().find_map(|m| match m {
            MemberDecl::Field(field) if field.name == name => Some(field.ty.text.clone()),
            _ => None,
        })
    }

    fn resolve_invocation(
        &self,
        file: &FileId,
        index: &NodeIndex<'a>,
        call_id: NodeId,
        callee: &Expr,
        arity: usize,
    ) -> Option<MethodInfo> {
        match callee {
            Expr::Name(name) => {
                let (class, _) = index.enclosing_member(call_id)?;
                self.pick_overload(&class.name, &name.name, FunctionKind::Method, arity)
                    .or_else(|| self.lone_global_method(&name.name))
            }
            Expr::MemberAccess(access) => {
                let class_name = match access.receiver.as_ref() {
                    // A bare name that is a known class qualifies a static
                    // call; otherwise it is a value whose type we infer.
                    Expr::Name(recv) if self.classes.contains(&recv.name) => {
                        Some(recv.name.clone())
                    }
                    other => self.infer_expr_type(file, other),
                };
                self.pick_overload(&class_name?, &access.name, FunctionKind::Method, arity)
            }
            _ => None,
        }
    }

    /// An unqualified call whose name is declared by exactly one method
    /// anywhere in the solution resolves to it without a qualifier.
    fn lone_global_method(&self, name: &str) -> Option<MethodInfo> {
        let mut hit = None;
        for info in self.infos.values() {
            if info.kind != FunctionKind::Method || info.name != name {
                continue;
            }
            if hit.is_some() {
                return None;
            }
            hit = Some(info.clone());
        }
        hit
    }

    fn resolve_construction(&self, creation_ty: &str, arity: usize) -> Option<MethodInfo> {
        self.pick_overload(creation_ty, creation_ty, FunctionKind::Constructor, arity)
    }

    /// Call-like references to `key` within one document, in source order.
    fn references_in(&self, file: &FileId, key: &MethodKey) -> Vec<ReferenceLocation> {
        let Some(unit) = self.units.get(file) else {
            return Vec::new();
        };
        let Some(index) = self.indexes.get(file) else {
            return Vec::new();
        };
        let mut found = Vec::new();
        for class in &unit.types {
            for member in &class.members {
                walk_member_exprs(member, &mut |expr| {
                    let call = match expr {
                        Expr::Call(call) => {
                            let resolved = self.resolve_invocation(
                                file,
                                index,
                                call.id,
                                &call.callee,
                                call.args.len(),
                            );
                            match resolved {
                                Some(info) if &info.key == key => {
                                    Some(CallLike::Invocation(call.id))
                                }
                                _ => None,
                            }
                        }
                        Expr::ObjectCreation(creation) => {
                            let resolved = self
                                .resolve_construction(&creation.type_name, creation.args.len());
                            match resolved {
                                Some(info) if &info.key == key => {
                                    Some(CallLike::Construction(creation.id))
                                }
                                _ => None,
                            }
                        }
                        _ => None,
                    };
                    if let Some(call) = call {
                        found.push(ReferenceLocation {
                            file: file.clone(),
                            call,
                        });
                    }
                });
            }
        }
        found.sort_by_key(|reference| {
            index
                .expr(reference.call.node())
                .map(|expr| expr.range().start)
                .unwrap_or(usize::MAX)
        });
        found
    }
}

impl SemanticDatabase for SolutionModel<'_> {
    fn resolve_call_target(&self, file: &FileId, call: CallLike) -> Option<MethodInfo> {
        let index = self.indexes.get(file)?;
        match call {
            CallLike::Invocation(id) => {
                let Some(Expr::Call(call_expr)) = index.expr(id) else {
                    return None;
                };
                self.resolve_invocation(file, index, id, &call_expr.callee, call_expr.args.len())
            }
            CallLike::Construction(id) => {
                let Some(Expr::ObjectCreation(creation)) = index.expr(id) else {
                    return None;
                };
                self.resolve_construction(&creation.type_name, creation.args.len())
            }
        }
    }

    fn method_info(&self, key: &MethodKey) -> Option<MethodInfo> {
        self.infos.get(key).cloned()
    }

    fn find_references(&self, key: &MethodKey) -> Vec<ReferenceLocation> {
        let mut all = Vec::new();
        for file in self.units.keys() {
            all.extend(self.references_in(file, key));
        }
        all
    }
}

fn declared_info(file: &FileId, class: &ClassDecl, member: &MemberDecl) -> Option<MethodInfo> {
    match member {
        MemberDecl::Method(method) => Some(MethodInfo {
            key: MethodKey {
                file: file.clone(),
                node: method.id,
            },
            kind: FunctionKind::Method,
            class_name: class.name.clone(),
            name: method.name.clone(),
            params: param_infos(&method.params),
            return_ty: if method.returns_void() {
                None
            } else {
                Some(method.return_ty.text.clone())
            },
            is_static: method.is_static(),
        }),
        MemberDecl::Constructor(ctor) => Some(MethodInfo {
            key: MethodKey {
                file: file.clone(),
                node: ctor.id,
            },
            kind: FunctionKind::Constructor,
            class_name: class.name.clone(),
            name: ctor.name.clone(),
            params: param_infos(&ctor.params),
            return_ty: None,
            is_static: ctor.is_static(),
        }),
        MemberDecl::Field(_) => None,
    }
}

fn param_infos(params: &[deplift_syntax::ast::ParamDecl]) -> Vec<ParamInfo> {
    params
        .iter()
        .map(|param| ParamInfo {
            ty: param.ty.text.clone(),
            name: param.name.clone(),
        })
        .collect()
}

fn member_binding_type(member: &MemberDecl, name: &str) -> Option<String> {
    let (params, body) = match member {
        MemberDecl::Method(method) => {
            let body = match &method.body {
                Some(MethodBody::Block(block)) => Some(block),
                _ => None,
            };
            (method.params.as_slice(), body)
        }
        MemberDecl::Constructor(ctor) => (ctor.params.as_slice(), Some(&ctor.body)),
        MemberDecl::Field(_) => (&[][..], None),
    };
    if let Some(param) = params.iter().find(|param| param.name == name) {
        return Some(param.ty.text.clone());
    }
    let block = body?;
    local_type_in_block(block, name)
}

fn local_type_in_block(block: &deplift_syntax::ast::Block, name: &str) -> Option<String> {
    for stmt in &block.statements {
        match stmt {
            Stmt::LocalVar(local) if local.name == name => {
                return Some(local.ty.text.clone());
            }
            Stmt::Block(inner) => {
                if let Some(ty) = local_type_in_block(inner, name) {
                    return Some(ty);
                }
            }
            _ => {}
        }
    }
    None
}
