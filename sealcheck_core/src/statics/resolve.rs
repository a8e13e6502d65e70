/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use super::{AnalysisContext, BuiltinType, Namespace, ScopeId, StaticType};
use crate::ast::{
    Expr, ExprKind, FileAst, ItemKind, MemberKind, Stmt, StmtKind, SwitchLabelKind, TypeDecl,
    TypeRef, TypeRefKind,
};
use std::rc::Rc;
use utils::dlog;
use utils::hash::HashMap;

pub(crate) fn scan_declarations(ctx: &mut AnalysisContext, file_asts: &[Rc<FileAst>]) {
    let mut root = std::mem::take(&mut ctx.root_namespace);
    for file in file_asts {
        for item in file.items.iter() {
            match &*item.kind {
                ItemKind::Using(..) => {}
                ItemKind::Namespace(ns) => {
                    let scope: ScopeId = ns.name.v.clone();
                    let namespace = root.children.entry(scope.clone()).or_default();
                    let mut qualifiers = vec![scope.clone()];
                    for decl in ns.types.iter() {
                        gather_type(ctx, namespace, &mut qualifiers, &scope, decl);
                    }
                }
                ItemKind::Type(decl) => {
                    let scope: ScopeId = ScopeId::new();
                    let mut qualifiers = vec![];
                    gather_type(ctx, &mut root, &mut qualifiers, &scope, decl);
                }
            }
        }
    }
    ctx.root_namespace = root;
}

fn fullname(qualifiers: &[String], unqualified_name: &str) -> String {
    let mut fullname = String::new();
    for qualifier in qualifiers {
        fullname.push_str(qualifier);
        fullname.push('.');
    }
    fullname.push_str(unqualified_name);
    fullname
}

fn gather_type(
    ctx: &mut AnalysisContext,
    namespace: &mut Namespace,
    qualifiers: &mut Vec<String>,
    scope: &ScopeId,
    decl: &Rc<TypeDecl>,
) {
    let name = decl.name.v.clone();

    let fully_qualified_name = fullname(qualifiers, &name);
    dlog!("declaring type {}", fully_qualified_name);
    ctx.fully_qualified_names
        .insert(decl.id, fully_qualified_name);
    ctx.scope_of.insert(decl.id, scope.clone());

    // first declaration wins; a clash is the compiler's problem, not ours
    namespace.types.entry(name.clone()).or_insert_with(|| decl.clone());

    let nested: Vec<Rc<TypeDecl>> = decl.nested_types().cloned().collect();
    if !nested.is_empty() {
        let child = namespace.children.entry(name.clone()).or_default();
        qualifiers.push(name);
        for n in &nested {
            gather_type(ctx, child, qualifiers, scope, n);
        }
        qualifiers.pop();
    }
}

pub(crate) fn resolve(ctx: &mut AnalysisContext, file_asts: &[Rc<FileAst>]) {
    let root = std::mem::take(&mut ctx.root_namespace);
    for file in file_asts {
        for item in file.items.iter() {
            match &*item.kind {
                ItemKind::Using(..) => {}
                ItemKind::Namespace(ns) => {
                    let mut chain: Vec<&Namespace> = vec![&root];
                    if let Some(child) = root.children.get(&ns.name.v) {
                        chain.push(child);
                    }
                    for decl in ns.types.iter() {
                        resolve_type_decl(ctx, &chain, decl);
                    }
                }
                ItemKind::Type(decl) => {
                    let chain: Vec<&Namespace> = vec![&root];
                    resolve_type_decl(ctx, &chain, decl);
                }
            }
        }
    }
    ctx.root_namespace = root;
}

fn resolve_type_decl(ctx: &mut AnalysisContext, chain: &[&Namespace], decl: &Rc<TypeDecl>) {
    // base lists are resolved in the enclosing scope
    for base in &decl.bases {
        if let Some(target) = resolve_type_ref(chain, base) {
            ctx.resolution_map.insert(base.id, target.clone());
            ctx.derived_index
                .entry(target.id)
                .or_default()
                .push(decl.clone());
        }
        // an unresolvable base contributes nothing; never fatal
    }

    // members see this type's own nested types unqualified
    let mut inner_chain: Vec<&Namespace> = chain.to_vec();
    if let Some(child) = chain.last().and_then(|ns| ns.children.get(&decl.name.v)) {
        inner_chain.push(child);
    }
    let inner_chain = &inner_chain[..];

    // field declared types are visible to every method body of this type
    let mut fields: HashMap<String, StaticType> = HashMap::default();
    for member in &decl.members {
        if let MemberKind::Field { ty, name, .. } = &*member.kind
            && let Some(st) = static_type_of_ref(ctx, inner_chain, ty)
        {
            fields.insert(name.v.clone(), st);
        }
    }

    for member in &decl.members {
        match &*member.kind {
            MemberKind::Field { init, .. } => {
                if let Some(init) = init {
                    let mut scopes = Scopes::new(&fields);
                    resolve_expr(ctx, inner_chain, &mut scopes, init);
                }
            }
            MemberKind::Method { params, body, .. } => {
                let mut scopes = Scopes::new(&fields);
                scopes.push();
                for param in params {
                    if let Some(st) = static_type_of_ref(ctx, inner_chain, &param.ty) {
                        scopes.define(param.name.v.clone(), st);
                    }
                }
                for stmt in body {
                    resolve_stmt(ctx, inner_chain, &mut scopes, stmt);
                }
                scopes.pop();
            }
            MemberKind::Nested(nested) => {
                resolve_type_decl(ctx, inner_chain, nested);
            }
        }
    }
}

/// Resolve a dotted type name by walking from the innermost enclosing scope
/// outward; builtins never resolve to a declaration.
fn resolve_type_ref(chain: &[&Namespace], tyref: &Rc<TypeRef>) -> Option<Rc<TypeDecl>> {
    let TypeRefKind::Named(segments) = &*tyref.kind else {
        return None;
    };
    let names: Vec<&str> = segments.iter().map(|s| s.v.as_str()).collect();
    for namespace in chain.iter().rev() {
        if let Some(decl) = namespace.get_type(&names) {
            return Some(decl);
        }
    }
    dlog!("could not resolve type reference {}", names.join("."));
    None
}

fn static_type_of_ref(
    ctx: &mut AnalysisContext,
    chain: &[&Namespace],
    tyref: &Rc<TypeRef>,
) -> Option<StaticType> {
    match &*tyref.kind {
        TypeRefKind::Named(_) => {
            let decl = resolve_type_ref(chain, tyref)?;
            ctx.resolution_map.insert(tyref.id, decl.clone());
            Some(StaticType::Nominal(decl))
        }
        TypeRefKind::Void => Some(StaticType::Builtin(BuiltinType::Void)),
        TypeRefKind::Int => Some(StaticType::Builtin(BuiltinType::Int)),
        TypeRefKind::Float => Some(StaticType::Builtin(BuiltinType::Float)),
        TypeRefKind::Bool => Some(StaticType::Builtin(BuiltinType::Bool)),
        TypeRefKind::Str => Some(StaticType::Builtin(BuiltinType::Str)),
    }
}

/// Lexical scopes of one method body, innermost last, with the enclosing
/// type's fields at the bottom.
struct Scopes<'a> {
    fields: &'a HashMap<String, StaticType>,
    scopes: Vec<HashMap<String, StaticType>>,
}

impl<'a> Scopes<'a> {
    fn new(fields: &'a HashMap<String, StaticType>) -> Self {
        Scopes {
            fields,
            scopes: vec![],
        }
    }

    fn push(&mut self) {
        self.scopes.push(HashMap::default());
    }

    fn pop(&mut self) {
        self.scopes.pop();
    }

    fn define(&mut self, name: String, st: StaticType) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, st);
        }
    }

    fn lookup(&self, name: &str) -> Option<StaticType> {
        for scope in self.scopes.iter().rev() {
            if let Some(st) = scope.get(name) {
                return Some(st.clone());
            }
        }
        self.fields.get(name).cloned()
    }
}

fn resolve_stmt(
    ctx: &mut AnalysisContext,
    chain: &[&Namespace],
    scopes: &mut Scopes,
    stmt: &Rc<Stmt>,
) {
    match &*stmt.kind {
        StmtKind::Local { ty, name, init } => {
            if let Some(init) = init {
                resolve_expr(ctx, chain, scopes, init);
            }
            let st = match ty {
                Some(tyref) => static_type_of_ref(ctx, chain, tyref),
                // `var`: take the initializer's type, if shallowly known
                None => init
                    .as_ref()
                    .and_then(|e| ctx.expr_types.get(&e.id).cloned()),
            };
            if let Some(st) = st {
                scopes.define(name.v.clone(), st);
            }
        }
        StmtKind::Assign(lhs, rhs) => {
            resolve_expr(ctx, chain, scopes, lhs);
            resolve_expr(ctx, chain, scopes, rhs);
        }
        StmtKind::Expr(expr) => resolve_expr(ctx, chain, scopes, expr),
        StmtKind::Return(value) => {
            if let Some(value) = value {
                resolve_expr(ctx, chain, scopes, value);
            }
        }
        StmtKind::Break => {}
        StmtKind::Throw(value) => resolve_expr(ctx, chain, scopes, value),
        StmtKind::Block(stmts) => {
            scopes.push();
            for stmt in stmts {
                resolve_stmt(ctx, chain, scopes, stmt);
            }
            scopes.pop();
        }
        StmtKind::If(cond, then, els) => {
            resolve_expr(ctx, chain, scopes, cond);
            scopes.push();
            resolve_stmt(ctx, chain, scopes, then);
            scopes.pop();
            if let Some(els) = els {
                scopes.push();
                resolve_stmt(ctx, chain, scopes, els);
                scopes.pop();
            }
        }
        StmtKind::Switch(sw) => {
            resolve_expr(ctx, chain, scopes, &sw.scrutinee);
            for section in &sw.sections {
                scopes.push();
                for label in &section.labels {
                    match &*label.kind {
                        SwitchLabelKind::Type { ty, binder } => {
                            let st = static_type_of_ref(ctx, chain, ty);
                            if let (Some(st), Some(binder)) = (st, binder) {
                                scopes.define(binder.v.clone(), st);
                            }
                        }
                        SwitchLabelKind::Value(expr) => {
                            resolve_expr(ctx, chain, scopes, expr)
                        }
                        SwitchLabelKind::Default => {}
                    }
                }
                for stmt in &section.stmts {
                    resolve_stmt(ctx, chain, scopes, stmt);
                }
                scopes.pop();
            }
        }
    }
}

fn resolve_expr(
    ctx: &mut AnalysisContext,
    chain: &[&Namespace],
    scopes: &mut Scopes,
    expr: &Rc<Expr>,
) {
    match &*expr.kind {
        ExprKind::Int(_) => {
            ctx.expr_types
                .insert(expr.id, StaticType::Builtin(BuiltinType::Int));
        }
        ExprKind::Str(_) => {
            ctx.expr_types
                .insert(expr.id, StaticType::Builtin(BuiltinType::Str));
        }
        ExprKind::Bool(_) => {
            ctx.expr_types
                .insert(expr.id, StaticType::Builtin(BuiltinType::Bool));
        }
        ExprKind::Null => {}
        ExprKind::Name(ident) => {
            if let Some(st) = scopes.lookup(&ident.v) {
                ctx.expr_types.insert(expr.id, st);
            }
        }
        ExprKind::Member(base, _name) => {
            // member types are not tracked; only the base is walked
            resolve_expr(ctx, chain, scopes, base);
        }
        ExprKind::Call(callee, args) => {
            resolve_expr(ctx, chain, scopes, callee);
            for arg in args {
                resolve_expr(ctx, chain, scopes, arg);
            }
        }
        ExprKind::New(ty, args) => {
            if let Some(st) = static_type_of_ref(ctx, chain, ty) {
                ctx.expr_types.insert(expr.id, st);
            }
            for arg in args {
                resolve_expr(ctx, chain, scopes, arg);
            }
        }
        ExprKind::Cast(inner, ty) => {
            resolve_expr(ctx, chain, scopes, inner);
            if let Some(st) = static_type_of_ref(ctx, chain, ty) {
                ctx.expr_types.insert(expr.id, st);
            }
        }
        ExprKind::Unary(_, operand) => resolve_expr(ctx, chain, scopes, operand),
        ExprKind::Binary(lhs, _, rhs) => {
            resolve_expr(ctx, chain, scopes, lhs);
            resolve_expr(ctx, chain, scopes, rhs);
        }
    }
}
