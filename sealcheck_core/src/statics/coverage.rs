/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use super::hierarchy::{self, HierarchyClosure};
use super::switch_site::{self, DefaultKind, SwitchSite};
use super::{AnalysisContext, Finding, ScopeId};
use crate::ast::{FileAst, ItemKind, MemberKind, NodeId, Stmt, StmtKind, SwitchStmt, TypeDecl};
use std::rc::Rc;
use utils::hash::HashSet;

/// Analyze every switch statement in the given files. Sites are independent:
/// a site that cannot be analyzed is dropped without affecting its siblings.
pub(crate) fn check_switch_coverage(ctx: &mut AnalysisContext, file_asts: &[Rc<FileAst>]) {
    let sites = collect_switches(file_asts);
    for (sw, scope) in sites {
        if ctx.cancel.is_cancelled() {
            // cancelled runs report nothing for the remaining sites
            return;
        }
        analyze_switch(ctx, &sw, &scope);
    }
}

fn analyze_switch(ctx: &mut AnalysisContext, sw: &Rc<SwitchStmt>, scope: &ScopeId) {
    let Ok(site) = switch_site::extract(ctx, sw) else {
        return;
    };
    let Ok(closure) = hierarchy::resolve_implementors(ctx, &site.marker, scope) else {
        return;
    };
    if closure.is_empty() {
        return;
    }

    let result = analyze(ctx, &site, &closure);
    if !result.asserting || result.missing.is_empty() {
        return;
    }

    let Some(default_label) = site.default_label.clone() else {
        // unreachable in practice: a non-asserting site has an empty missing set
        return;
    };
    let missing = result
        .missing
        .iter()
        .map(|decl| ctx.fully_qualified_name(decl))
        .collect();
    ctx.findings.push(Finding {
        anchor: site.scrutinee.clone(),
        default_label,
        default_branch_ix: site.default_branch_ix,
        marker: ctx.fully_qualified_name(&site.marker),
        missing,
    });
}

/// Ephemeral result of one site's coverage computation.
#[derive(Debug)]
pub(crate) struct CoverageResult {
    /// Must-cover implementors with no covering branch, in the order the
    /// hierarchy traversal discovered them.
    pub(crate) missing: Vec<Rc<TypeDecl>>,
    /// Whether the site's default branch asserts exhaustiveness at all.
    pub(crate) asserting: bool,
}

/// Compute the missing-type set of one site against one closure.
///
/// Branches that share a body through fallthrough contribute the union of
/// their matched types as a single unit of evidence; the merge never grants
/// coverage to a type no label names. Branches naming types unrelated to the
/// closure cannot occur in well-typed source but are simply ignored.
pub(crate) fn analyze(
    ctx: &AnalysisContext,
    site: &SwitchSite,
    closure: &HierarchyClosure,
) -> CoverageResult {
    let asserting = site.default_kind == Some(DefaultKind::UnconditionalFailure);
    if !asserting {
        // an ordinary default reads "remaining cases handled generically";
        // the author asserted nothing, so there is nothing to report
        return CoverageResult {
            missing: vec![],
            asserting,
        };
    }

    let mut covered: HashSet<NodeId> = HashSet::default();
    for group in site.branch_groups() {
        for branch in group {
            let Some(ty) = &branch.ty else {
                continue;
            };
            if ty.id == closure.marker.id {
                // a branch on the marker itself covers the whole family
                for imp in &closure.implementors {
                    covered.insert(imp.decl.id);
                }
                continue;
            }
            if !closure.contains(ty.id) {
                continue;
            }
            covered.insert(ty.id);
            // supertype covers subtypes: one expansion pass over the closure
            for id in hierarchy::descendants_within(ctx, closure, ty.id) {
                covered.insert(id);
            }
        }
    }

    let missing = closure
        .implementors
        .iter()
        .filter(|imp| imp.must_cover && !covered.contains(&imp.decl.id))
        .map(|imp| imp.decl.clone())
        .collect();

    CoverageResult { missing, asserting }
}

/// Collect every switch statement together with the top-level scope it sits
/// in, in file order then source order.
fn collect_switches(file_asts: &[Rc<FileAst>]) -> Vec<(Rc<SwitchStmt>, ScopeId)> {
    let mut out = vec![];
    for file in file_asts {
        for item in file.items.iter() {
            match &*item.kind {
                ItemKind::Using(..) => {}
                ItemKind::Namespace(ns) => {
                    let scope: ScopeId = ns.name.v.clone();
                    for decl in ns.types.iter() {
                        collect_in_type(decl, &scope, &mut out);
                    }
                }
                ItemKind::Type(decl) => {
                    collect_in_type(decl, &ScopeId::new(), &mut out);
                }
            }
        }
    }
    out
}

fn collect_in_type(decl: &Rc<TypeDecl>, scope: &ScopeId, out: &mut Vec<(Rc<SwitchStmt>, ScopeId)>) {
    for member in &decl.members {
        match &*member.kind {
            MemberKind::Field { .. } => {}
            MemberKind::Method { body, .. } => {
                for stmt in body {
                    collect_in_stmt(stmt, scope, out);
                }
            }
            MemberKind::Nested(nested) => collect_in_type(nested, scope, out),
        }
    }
}

fn collect_in_stmt(stmt: &Rc<Stmt>, scope: &ScopeId, out: &mut Vec<(Rc<SwitchStmt>, ScopeId)>) {
    match &*stmt.kind {
        StmtKind::Switch(sw) => {
            out.push((sw.clone(), scope.clone()));
            for section in &sw.sections {
                for inner in &section.stmts {
                    collect_in_stmt(inner, scope, out);
                }
            }
        }
        StmtKind::Block(stmts) => {
            for inner in stmts {
                collect_in_stmt(inner, scope, out);
            }
        }
        StmtKind::If(_, then, els) => {
            collect_in_stmt(then, scope, out);
            if let Some(els) = els {
                collect_in_stmt(els, scope, out);
            }
        }
        StmtKind::Local { .. }
        | StmtKind::Assign(..)
        | StmtKind::Expr(_)
        | StmtKind::Return(_)
        | StmtKind::Break
        | StmtKind::Throw(_) => {}
    }
}
