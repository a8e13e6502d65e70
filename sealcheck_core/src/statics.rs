/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::FileProvider;
use crate::ast::{Expr, FileAst, FileDatabase, FileId, Location, NodeId, SwitchLabel, TypeDecl};
use crate::parse::Span;
use hierarchy::HierarchyClosure;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use utils::hash::HashMap;
use utils::swrite;

mod coverage;
mod error;
pub mod fix;
mod hierarchy;
mod resolve;
mod switch_site;

pub(crate) use coverage::check_switch_coverage;

pub(crate) struct AnalysisContext {
    pub(crate) file_db: FileDatabase,
    pub(crate) file_provider: Box<dyn FileProvider>,

    pub(crate) root_namespace: Namespace,
    // maps each type reference the analysis cares about to the declaration it
    // resolves to (base-list entries, case patterns, annotations, casts, news)
    pub(crate) resolution_map: HashMap<NodeId, Rc<TypeDecl>>,
    // fully qualified name of every type declaration
    pub(crate) fully_qualified_names: HashMap<NodeId, String>,
    // top-level scope each type declaration lives in
    pub(crate) scope_of: HashMap<NodeId, ScopeId>,
    // reverse edges of the declares-as-base relation
    pub(crate) derived_index: HashMap<NodeId, Vec<Rc<TypeDecl>>>,
    // declared (static) type of expressions, where shallowly known
    pub(crate) expr_types: HashMap<NodeId, StaticType>,

    // one hierarchy closure per (marker, scope). Lives for this run only:
    // the symbol graph may change between runs, so nothing is retained.
    pub(crate) closures: HashMap<(NodeId, ScopeId), Rc<HierarchyClosure>>,

    pub(crate) cancel: CancelFlag,

    // host-level errors (lexing, parsing)
    pub(crate) errors: Vec<Error>,
    // analysis output
    pub(crate) findings: Vec<Finding>,
}

impl AnalysisContext {
    pub(crate) fn new(file_provider: Box<dyn FileProvider>) -> Self {
        Self::with_cancel(file_provider, CancelFlag::new())
    }

    pub(crate) fn with_cancel(file_provider: Box<dyn FileProvider>, cancel: CancelFlag) -> Self {
        Self {
            file_db: FileDatabase::new(),
            file_provider,

            root_namespace: Default::default(),
            resolution_map: Default::default(),
            fully_qualified_names: Default::default(),
            scope_of: Default::default(),
            derived_index: Default::default(),
            expr_types: Default::default(),

            closures: Default::default(),

            cancel,

            errors: Default::default(),
            findings: Default::default(),
        }
    }

    pub(crate) fn fully_qualified_name(&self, decl: &TypeDecl) -> String {
        match self.fully_qualified_names.get(&decl.id) {
            Some(fqn) => fqn.clone(),
            None => decl.name.v.clone(),
        }
    }
}

/// The top-level scope a type is declared in: the enclosing namespace's name,
/// or the empty string for types outside any namespace.
pub(crate) type ScopeId = String;

/// Maps simple names to type declarations, and holds child scopes: one per
/// namespace and one per type with nested type declarations.
#[derive(Debug, Default)]
pub(crate) struct Namespace {
    pub(crate) types: HashMap<String, Rc<TypeDecl>>,
    pub(crate) children: HashMap<String, Namespace>,
}

impl Namespace {
    /// Walk a dotted path: all but the last segment through child scopes, the
    /// last into `types`.
    pub(crate) fn get_type(&self, segments: &[&str]) -> Option<Rc<TypeDecl>> {
        let mut current: &Namespace = self;
        for segment in &segments[0..segments.len().saturating_sub(1)] {
            current = current.children.get(*segment)?;
        }
        current.types.get(*segments.last()?).cloned()
    }
}

/// The declared type of an expression, where one is shallowly known.
#[derive(Debug, Clone)]
pub(crate) enum StaticType {
    Nominal(Rc<TypeDecl>),
    Builtin(BuiltinType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BuiltinType {
    Void,
    Int,
    Float,
    Bool,
    Str,
}

/// Cooperative cancellation. Checked between pipeline stages; a cancelled run
/// produces no findings for sites it had not finished.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }
}

/// Outcomes that end one site's analysis without producing anything.
/// None of these are user-facing: the affected switch is skipped and analysis
/// of sibling sites continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Skip {
    /// Symbol information for the requested scope could not be obtained.
    ScopeUnavailable,
    /// The switch does not dispatch on a hierarchy-bearing nominal type.
    UnsupportedScrutinee,
    Cancelled,
}

#[derive(Debug, Clone)]
pub(crate) enum Error {
    UnrecognizedToken(FileId, usize),
    UnrecognizedEscapeSequence(FileId, Span),
    /// expected, found
    UnexpectedToken(String, String, Location),
}

/// One switch statement that fails to cover part of its marker hierarchy.
#[derive(Debug, Clone)]
pub struct Finding {
    // the scrutinee expression, anchor for the diagnostic
    pub(crate) anchor: Rc<Expr>,
    pub(crate) default_label: Rc<SwitchLabel>,
    // flattened index of the default label among the switch's labels
    pub(crate) default_branch_ix: usize,
    pub(crate) marker: String,
    pub(crate) missing: Vec<String>,
}

impl Finding {
    /// Fully qualified name of the marker type the switch dispatches on.
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Fully qualified names of the unhandled types, in the order the
    /// hierarchy traversal discovered them.
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    pub fn message(&self) -> String {
        let s = &mut String::new();
        swrite!(s, "Switch case should check type implementation of type(s): ");
        for (i, name) in self.missing.iter().enumerate() {
            if i > 0 {
                swrite!(s, ", ");
            }
            swrite!(s, "{}", name);
        }
        std::mem::take(s)
    }

    pub fn file_id(&self) -> FileId {
        self.anchor.loc.file_id
    }

    pub fn span(&self) -> std::ops::Range<usize> {
        self.anchor.loc.range()
    }
}

/// Run the analysis proper over parsed files. Parse errors are the caller's
/// to check beforehand; this never fails, it only accumulates findings.
pub(crate) fn analyze(ctx: &mut AnalysisContext, file_asts: &[Rc<FileAst>]) {
    // gather declarations across all files
    resolve::scan_declarations(ctx, file_asts);

    // bind type references and declared expression types
    resolve::resolve(ctx, file_asts);

    // per-site exhaustiveness checking
    check_switch_coverage(ctx, file_asts);
}

pub(crate) fn check_errors(ctx: &AnalysisContext) -> Result<(), crate::ErrorSummary> {
    if ctx.errors.is_empty() {
        return Ok(());
    }

    Err(crate::ErrorSummary::from_errors(
        ctx.file_db.clone(),
        ctx.errors.clone(),
    ))
}
