/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use super::{AnalysisContext, Skip, StaticType};
use crate::ast::{
    Expr, Stmt, StmtKind, SwitchLabel, SwitchLabelKind, SwitchStmt, TypeDecl, TypeKeyword,
};
use std::rc::Rc;
use utils::hash::HashMap;

/// Normalized view of one switch statement.
#[derive(Debug)]
pub(crate) struct SwitchSite {
    pub(crate) scrutinee: Rc<Expr>,
    /// The scrutinee's declared type.
    pub(crate) marker: Rc<TypeDecl>,
    /// Non-default branches, one per label, in source order.
    pub(crate) branches: Vec<Branch>,
    pub(crate) default_kind: Option<DefaultKind>,
    pub(crate) default_label: Option<Rc<SwitchLabel>>,
    /// Flattened index of the default label among all the switch's labels.
    pub(crate) default_branch_ix: usize,
}

impl SwitchSite {
    /// Branches grouped by body-identity, preserving source order. Each group
    /// is one unit of coverage evidence carrying the union of its matched
    /// types.
    pub(crate) fn branch_groups(&self) -> Vec<Vec<&Branch>> {
        let mut order: Vec<usize> = vec![];
        let mut groups: HashMap<usize, Vec<&Branch>> = HashMap::default();
        for branch in &self.branches {
            if !groups.contains_key(&branch.body) {
                order.push(branch.body);
            }
            groups.entry(branch.body).or_default().push(branch);
        }
        order
            .into_iter()
            .map(|body| groups.remove(&body).unwrap())
            .collect()
    }
}

#[derive(Debug)]
pub(crate) struct Branch {
    /// The matched nominal type, when the label is a type-test pattern whose
    /// name resolved. Value patterns and unresolvable names contribute none,
    /// which can over-report missing types but never under-report.
    pub(crate) ty: Option<Rc<TypeDecl>>,
    /// Body-identity: index of the section whose statements actually execute
    /// for this label, after fallthrough merging. Labels sharing a body are
    /// one unit of coverage evidence.
    pub(crate) body: usize,
}

/// How the trailing default branch reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DefaultKind {
    /// Every control path through the default throws before any normal exit.
    /// This is the author asserting "all real cases are listed above" — the
    /// single rule that arms this analysis.
    UnconditionalFailure,
    /// The default handles remaining cases generically; nothing to report.
    Ordinary,
}

pub(crate) fn extract(ctx: &AnalysisContext, sw: &Rc<SwitchStmt>) -> Result<SwitchSite, Skip> {
    let Some(StaticType::Nominal(marker)) = ctx.expr_types.get(&sw.scrutinee.id) else {
        // primitive or unresolvable scrutinee
        return Err(Skip::UnsupportedScrutinee);
    };

    // The declared type must be able to head a hierarchy: an interface, an
    // abstract class, or a class something actually derives from.
    let has_derived = ctx.derived_index.contains_key(&marker.id);
    let marker_candidate = matches!(marker.keyword, TypeKeyword::Interface)
        || marker.is_abstract
        || has_derived;
    if !marker_candidate {
        return Err(Skip::UnsupportedScrutinee);
    }

    // A section with no statements executes the next section's body; chains
    // of empty sections collapse onto the first non-empty one.
    let section_count = sw.sections.len();
    let mut body_of: Vec<usize> = (0..section_count).collect();
    for i in (0..section_count).rev() {
        if sw.sections[i].stmts.is_empty() && i + 1 < section_count {
            body_of[i] = body_of[i + 1];
        }
    }

    let mut branches = vec![];
    let mut default_kind = None;
    let mut default_label = None;
    let mut default_branch_ix = 0;
    let mut flat_ix = 0;
    for (i, section) in sw.sections.iter().enumerate() {
        for label in &section.labels {
            match &*label.kind {
                SwitchLabelKind::Type { ty, .. } => {
                    branches.push(Branch {
                        ty: ctx.resolution_map.get(&ty.id).cloned(),
                        body: body_of[i],
                    });
                }
                SwitchLabelKind::Value(_) => {
                    branches.push(Branch {
                        ty: None,
                        body: body_of[i],
                    });
                }
                SwitchLabelKind::Default => {
                    let executed = &sw.sections[body_of[i]].stmts;
                    default_kind = Some(if is_unconditional_failure(executed) {
                        DefaultKind::UnconditionalFailure
                    } else {
                        DefaultKind::Ordinary
                    });
                    default_label = Some(label.clone());
                    default_branch_ix = flat_ix;
                }
            }
            flat_ix += 1;
        }
    }

    Ok(SwitchSite {
        scrutinee: sw.scrutinee.clone(),
        marker: marker.clone(),
        branches,
        default_kind,
        default_label,
        default_branch_ix,
    })
}

/// Whether a statement sequence can only terminate by throwing: no path
/// breaks, returns, or falls off the end before a throw is reached.
pub(crate) fn is_unconditional_failure(stmts: &[Rc<Stmt>]) -> bool {
    matches!(flow_of_sequence(stmts), FlowOutcome::Fails)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlowOutcome {
    /// Control reaches the statement after this one.
    FallsThrough,
    /// Control cannot get past a failure-signaling statement.
    Fails,
    /// Some path exits normally (break, return, completed dispatch).
    ExitsNormally,
}

fn flow_of_sequence(stmts: &[Rc<Stmt>]) -> FlowOutcome {
    for stmt in stmts {
        match flow_of_stmt(stmt) {
            FlowOutcome::FallsThrough => continue,
            other => return other,
        }
    }
    FlowOutcome::FallsThrough
}

fn flow_of_stmt(stmt: &Rc<Stmt>) -> FlowOutcome {
    match &*stmt.kind {
        StmtKind::Throw(_) => FlowOutcome::Fails,
        StmtKind::Break | StmtKind::Return(_) => FlowOutcome::ExitsNormally,
        StmtKind::Block(stmts) => flow_of_sequence(stmts),
        StmtKind::If(_, then, els) => {
            let then_flow = flow_of_stmt(then);
            let else_flow = match els {
                Some(els) => flow_of_stmt(els),
                // no else: the false path simply continues
                None => FlowOutcome::FallsThrough,
            };
            match (then_flow, else_flow) {
                (FlowOutcome::ExitsNormally, _) | (_, FlowOutcome::ExitsNormally) => {
                    FlowOutcome::ExitsNormally
                }
                (FlowOutcome::Fails, FlowOutcome::Fails) => FlowOutcome::Fails,
                _ => FlowOutcome::FallsThrough,
            }
        }
        // a nested dispatch is assumed able to complete normally
        StmtKind::Switch(_) => FlowOutcome::ExitsNormally,
        StmtKind::Local { .. } | StmtKind::Assign(..) | StmtKind::Expr(_) => {
            FlowOutcome::FallsThrough
        }
    }
}
