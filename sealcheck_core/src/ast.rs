/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::fmt::Display;
use std::ops::Range;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug, Clone)]
pub struct FileData {
    pub path: PathBuf,
    pub source: String,
    /// The starting byte indices in the source code.
    line_starts: Vec<usize>,
}

pub fn line_starts(source: &str) -> impl '_ + Iterator<Item = usize> {
    std::iter::once(0).chain(source.match_indices('\n').map(|(i, _)| i + 1))
}

impl FileData {
    pub fn new(path: PathBuf, source: String) -> FileData {
        FileData {
            path,
            line_starts: line_starts(source.as_ref()).collect(),
            source,
        }
    }

    pub fn name(&self) -> &str {
        self.path.to_str().unwrap_or("<non-utf8 path>")
    }

    /// Return the starting byte index of the line with the specified line index.
    fn line_start(&self, line_index: usize) -> Result<usize, codespan_reporting::files::Error> {
        use std::cmp::Ordering;

        match line_index.cmp(&self.line_starts.len()) {
            Ordering::Less => Ok(self
                .line_starts
                .get(line_index)
                .cloned()
                .expect("failed despite previous check")),
            Ordering::Equal => Ok(self.source.len()),
            Ordering::Greater => Err(codespan_reporting::files::Error::LineTooLarge {
                given: line_index,
                max: self.line_starts.len() - 1,
            }),
        }
    }

    /// returns the 1-indexed line number in which the target index lies.
    pub fn line_number_for_index(&self, index: usize) -> usize {
        match self.line_starts.binary_search(&index) {
            Ok(line) => line + 1, // found the line
            Err(line) => line,    // it must be the previous index
        }
    }

    fn line_index(&self, byte_index: usize) -> Result<usize, codespan_reporting::files::Error> {
        Ok(self
            .line_starts
            .binary_search(&byte_index)
            .unwrap_or_else(|next_line| next_line - 1))
    }

    fn line_range(
        &self,
        line_index: usize,
    ) -> Result<Range<usize>, codespan_reporting::files::Error> {
        let line_start = self.line_start(line_index)?;
        let next_line_start = self.line_start(line_index + 1)?;

        Ok(line_start..next_line_start)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileDatabase {
    pub files: Vec<FileData>,
}

impl FileDatabase {
    pub fn new() -> FileDatabase {
        FileDatabase { files: Vec::new() }
    }

    /// Add a file to the database, returning the handle that can be used to
    /// refer to it again.
    pub fn add(&mut self, file_data: FileData) -> FileId {
        let file_id = self.files.len() as FileId;
        self.files.push(file_data);
        file_id
    }

    /// Get the file corresponding to the given id.
    pub fn get(&self, file_id: FileId) -> Result<&FileData, codespan_reporting::files::Error> {
        self.files
            .get(file_id as usize)
            .ok_or(codespan_reporting::files::Error::FileMissing)
    }
}

pub type FileId = u32;

impl<'a> codespan_reporting::files::Files<'a> for FileDatabase {
    type FileId = FileId;
    type Name = &'a str;
    type Source = &'a str;

    fn name(&'a self, file_id: FileId) -> Result<Self::Name, codespan_reporting::files::Error> {
        Ok(self.get(file_id)?.name())
    }

    fn source(&'a self, file_id: FileId) -> Result<&'a str, codespan_reporting::files::Error> {
        Ok(&self.get(file_id)?.source)
    }

    fn line_index(
        &'a self,
        file_id: FileId,
        byte_index: usize,
    ) -> Result<usize, codespan_reporting::files::Error> {
        self.get(file_id)?.line_index(byte_index)
    }

    fn line_range(
        &'a self,
        file_id: FileId,
        line_index: usize,
    ) -> Result<Range<usize>, codespan_reporting::files::Error> {
        self.get(file_id)?.line_range(line_index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct NodeId {
    pub(crate) id: u32,
}

impl NodeId {
    pub(crate) fn new() -> Self {
        static ID_COUNTER: AtomicU32 = AtomicU32::new(1);
        let id = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self { id }
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Id[{}]", self.id)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        NodeId::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Location {
    pub(crate) file_id: FileId,
    pub(crate) lo: usize,
    pub(crate) hi: usize,
}

impl Location {
    pub fn range(&self) -> Range<usize> {
        self.lo..self.hi
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Identifier {
    pub(crate) v: String,

    pub(crate) loc: Location,
    pub(crate) id: NodeId,
}

#[derive(Debug, Clone)]
pub(crate) struct FileAst {
    pub(crate) items: Vec<Rc<Item>>,

    pub(crate) loc: Location,
    pub(crate) id: NodeId,
}

#[derive(Debug, Clone)]
pub(crate) struct Item {
    pub(crate) kind: Rc<ItemKind>,
    pub(crate) loc: Location,
    pub(crate) id: NodeId,
}

#[derive(Debug, Clone)]
pub(crate) enum ItemKind {
    /// `using A.B;` — parsed but semantically inert.
    Using(Vec<Rc<Identifier>>),
    Namespace(Rc<NamespaceDecl>),
    /// A type declared outside any namespace (global scope).
    Type(Rc<TypeDecl>),
}

#[derive(Debug, Clone)]
pub(crate) struct NamespaceDecl {
    pub(crate) name: Rc<Identifier>,
    pub(crate) types: Vec<Rc<TypeDecl>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypeKeyword {
    Interface,
    Class,
    Struct,
}

#[derive(Debug, Clone)]
pub(crate) struct TypeDecl {
    pub(crate) keyword: TypeKeyword,
    pub(crate) is_abstract: bool,
    pub(crate) name: Rc<Identifier>,
    pub(crate) bases: Vec<Rc<TypeRef>>,
    pub(crate) members: Vec<Rc<Member>>,

    pub(crate) loc: Location,
    pub(crate) id: NodeId,
}

impl TypeDecl {
    /// Whether values of this type can exist at runtime. Structs always can;
    /// classes can unless declared abstract; interfaces never can.
    pub(crate) fn is_concrete(&self) -> bool {
        match self.keyword {
            TypeKeyword::Struct => true,
            TypeKeyword::Class => !self.is_abstract,
            TypeKeyword::Interface => false,
        }
    }

    pub(crate) fn nested_types(&self) -> impl Iterator<Item = &Rc<TypeDecl>> {
        self.members.iter().filter_map(|m| match &*m.kind {
            MemberKind::Nested(decl) => Some(decl),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Member {
    pub(crate) kind: Rc<MemberKind>,
    pub(crate) loc: Location,
    pub(crate) id: NodeId,
}

#[derive(Debug, Clone)]
pub(crate) enum MemberKind {
    Field {
        ty: Rc<TypeRef>,
        name: Rc<Identifier>,
        init: Option<Rc<Expr>>,
    },
    Method {
        ret: Rc<TypeRef>,
        name: Rc<Identifier>,
        params: Vec<Param>,
        body: Vec<Rc<Stmt>>,
    },
    Nested(Rc<TypeDecl>),
}

#[derive(Debug, Clone)]
pub(crate) struct Param {
    pub(crate) ty: Rc<TypeRef>,
    pub(crate) name: Rc<Identifier>,
}

#[derive(Debug, Clone)]
pub(crate) struct TypeRef {
    pub(crate) kind: Rc<TypeRefKind>,
    pub(crate) loc: Location,
    pub(crate) id: NodeId,
}

#[derive(Debug, Clone)]
pub(crate) enum TypeRefKind {
    /// A (possibly dotted) type name: `Shape`, `App.Outer.Inner`.
    Named(Vec<Rc<Identifier>>),
    Void,
    Int,
    Float,
    Bool,
    Str,
}

#[derive(Debug, Clone)]
pub(crate) struct Stmt {
    pub(crate) kind: Rc<StmtKind>,
    pub(crate) loc: Location,
    pub(crate) id: NodeId,
}

#[derive(Debug, Clone)]
pub(crate) enum StmtKind {
    /// `Type x = e;` or `var x = e;` (no annotation).
    Local {
        ty: Option<Rc<TypeRef>>,
        name: Rc<Identifier>,
        init: Option<Rc<Expr>>,
    },
    Assign(Rc<Expr>, Rc<Expr>),
    Expr(Rc<Expr>),
    Return(Option<Rc<Expr>>),
    Break,
    Throw(Rc<Expr>),
    Block(Vec<Rc<Stmt>>),
    If(Rc<Expr>, Rc<Stmt>, Option<Rc<Stmt>>),
    Switch(Rc<SwitchStmt>),
}

#[derive(Debug, Clone)]
pub(crate) struct SwitchStmt {
    pub(crate) scrutinee: Rc<Expr>,
    pub(crate) sections: Vec<Rc<SwitchSection>>,

    pub(crate) loc: Location,
    pub(crate) id: NodeId,
}

/// One run of labels followed by the statements they share. A section with no
/// statements falls through to the next section.
#[derive(Debug, Clone)]
pub(crate) struct SwitchSection {
    pub(crate) labels: Vec<Rc<SwitchLabel>>,
    pub(crate) stmts: Vec<Rc<Stmt>>,

    pub(crate) loc: Location,
    pub(crate) id: NodeId,
}

#[derive(Debug, Clone)]
pub(crate) struct SwitchLabel {
    pub(crate) kind: Rc<SwitchLabelKind>,
    pub(crate) loc: Location,
    pub(crate) id: NodeId,
}

#[derive(Debug, Clone)]
pub(crate) enum SwitchLabelKind {
    /// `case TypeName binder:` — the binder may be a discard (`_`).
    Type {
        ty: Rc<TypeRef>,
        binder: Option<Rc<Identifier>>,
    },
    /// `case <constant expression>:`
    Value(Rc<Expr>),
    Default,
}

#[derive(Debug, Clone)]
pub(crate) struct Expr {
    pub(crate) kind: Rc<ExprKind>,
    pub(crate) loc: Location,
    pub(crate) id: NodeId,
}

#[derive(Debug, Clone)]
pub(crate) enum ExprKind {
    Int(i64),
    Str(String),
    Bool(bool),
    Null,
    Name(Rc<Identifier>),
    Member(Rc<Expr>, Rc<Identifier>),
    Call(Rc<Expr>, Vec<Rc<Expr>>),
    New(Rc<TypeRef>, Vec<Rc<Expr>>),
    Cast(Rc<Expr>, Rc<TypeRef>),
    Unary(UnaryOperator, Rc<Expr>),
    Binary(Rc<Expr>, BinaryOperator, Rc<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOperator {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // comparison
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    // numeric
    Add,
    Subtract,
    Multiply,
    Divide,
    Mod,
    // boolean
    And,
    Or,
}

impl BinaryOperator {
    pub(crate) fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::Equal | BinaryOperator::NotEqual => 3,
            BinaryOperator::LessThan
            | BinaryOperator::LessThanOrEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterThanOrEqual => 4,
            BinaryOperator::Add | BinaryOperator::Subtract => 5,
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Mod => 6,
        }
    }
}
