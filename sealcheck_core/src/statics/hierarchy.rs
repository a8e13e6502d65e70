/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use super::{AnalysisContext, ScopeId, Skip};
use crate::ast::{NodeId, TypeDecl};
use std::collections::VecDeque;
use std::rc::Rc;
use utils::dlog;
use utils::hash::HashSet;

/// The transitive implementor set of one marker type, as visible from one
/// top-level scope. Order is breadth-first discovery order and is what
/// missing-type reporting follows, so it must stay deterministic.
#[derive(Debug)]
pub(crate) struct HierarchyClosure {
    pub(crate) marker: Rc<TypeDecl>,
    pub(crate) implementors: Vec<Implementor>,
    members: HashSet<NodeId>,
}

#[derive(Debug)]
pub(crate) struct Implementor {
    pub(crate) decl: Rc<TypeDecl>,
    /// Whether this type must be named (or covered through an ancestor) for
    /// the switch to count as exhaustive.
    pub(crate) must_cover: bool,
}

impl HierarchyClosure {
    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.members.contains(&id)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.implementors.is_empty()
    }
}

/// Compute (or fetch, within this run) every type implementing or deriving
/// from `marker`, restricted to types declared in `scope`. Implementors
/// declared in other top-level scopes are invisible: the author of the switch
/// cannot be expected to handle types they could not see.
///
/// The marker itself is never a member. Zero implementors is a valid result,
/// not an error.
pub(crate) fn resolve_implementors(
    ctx: &mut AnalysisContext,
    marker: &Rc<TypeDecl>,
    scope: &ScopeId,
) -> Result<Rc<HierarchyClosure>, Skip> {
    if ctx.cancel.is_cancelled() {
        return Err(Skip::Cancelled);
    }

    let key = (marker.id, scope.clone());
    if let Some(closure) = ctx.closures.get(&key) {
        return Ok(closure.clone());
    }

    if !ctx.scope_of.contains_key(&marker.id) {
        // the marker was never gathered, so its scope's symbols are unknown
        return Err(Skip::ScopeUnavailable);
    }

    // Breadth-first over the declares-as-base relation. The relation is
    // acyclic in well-formed input, but the host may hand us duplicate
    // symbol entries, so membership is tracked by declaration identity.
    let mut discovered: Vec<Rc<TypeDecl>> = vec![];
    let mut visited: HashSet<NodeId> = HashSet::default();
    visited.insert(marker.id);
    let mut queue: VecDeque<NodeId> = VecDeque::new();
    queue.push_back(marker.id);

    while let Some(id) = queue.pop_front() {
        let Some(children) = ctx.derived_index.get(&id) else {
            continue;
        };
        for child in children {
            if ctx.scope_of.get(&child.id) != Some(scope) {
                continue;
            }
            if !visited.insert(child.id) {
                continue;
            }
            queue.push_back(child.id);
            discovered.push(child.clone());
        }
    }

    let members: HashSet<NodeId> = discovered.iter().map(|decl| decl.id).collect();

    // Must-cover marking. Every descendant chain inside the closure bottoms
    // out in a must-cover leaf (concrete, or abstract with nothing below it),
    // so an abstract/interface member is redundant exactly when it still has
    // a child inside the closure. Reporting stays minimal: the most specific
    // missing types, not every ancestor along the way.
    let implementors = discovered
        .iter()
        .map(|decl| {
            let has_closure_child = ctx
                .derived_index
                .get(&decl.id)
                .is_some_and(|children| children.iter().any(|c| members.contains(&c.id)));
            Implementor {
                decl: decl.clone(),
                must_cover: decl.is_concrete() || !has_closure_child,
            }
        })
        .collect();

    dlog!(
        "closure of {} in scope `{}`: {} implementor(s)",
        ctx.fully_qualified_name(marker),
        scope,
        discovered.len()
    );

    let closure = Rc::new(HierarchyClosure {
        marker: marker.clone(),
        implementors,
        members,
    });
    ctx.closures.insert(key, closure.clone());
    Ok(closure)
}

/// Every closure member reachable strictly below `from`, used for the
/// supertype-covers-subtypes expansion.
pub(crate) fn descendants_within(
    ctx: &AnalysisContext,
    closure: &HierarchyClosure,
    from: NodeId,
) -> Vec<NodeId> {
    let mut out = vec![];
    let mut visited: HashSet<NodeId> = HashSet::default();
    visited.insert(from);
    let mut queue: VecDeque<NodeId> = VecDeque::new();
    queue.push_back(from);
    while let Some(id) = queue.pop_front() {
        let Some(children) = ctx.derived_index.get(&id) else {
            continue;
        };
        for child in children {
            if !closure.contains(child.id) {
                continue;
            }
            if !visited.insert(child.id) {
                continue;
            }
            queue.push_back(child.id);
            out.push(child.id);
        }
    }
    out
}
