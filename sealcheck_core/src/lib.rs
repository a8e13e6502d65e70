/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! sealcheck verifies that switch-on-type dispatch over a closed marker
//! hierarchy handles every implementor the author could see, and synthesizes
//! placeholder cases for the ones it misses.

use ast::FileAst;
use ast::FileDatabase;
use ast::FileId;
use core::fmt;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::path::PathBuf;
use std::rc::Rc;

pub mod ast;
mod parse;
pub mod statics;

use crate::statics::AnalysisContext;
pub use ast::FileData;
pub use statics::fix::{CaseInsertion, Edit};
pub use statics::{CancelFlag, Finding};
use statics::Error;

/// Analyze a set of source files as one compilation unit.
///
/// Findings are warnings; `Err` is reserved for host-level failures (a file
/// that cannot be read, or syntax errors).
pub fn check_files(
    roots: &[&str],
    file_provider: Box<dyn FileProvider>,
) -> Result<CheckReport, ErrorSummary> {
    check_files_with(roots, file_provider, CancelFlag::new())
}

/// Like [`check_files`], with cooperative cancellation. A cancelled run
/// simply stops producing findings; it never reports partial results for a
/// half-analyzed switch.
pub fn check_files_with(
    roots: &[&str],
    file_provider: Box<dyn FileProvider>,
    cancel: CancelFlag,
) -> Result<CheckReport, ErrorSummary> {
    let mut ctx = AnalysisContext::with_cancel(file_provider, cancel);
    let file_asts = get_files(&mut ctx, roots)?;
    statics::check_errors(&ctx)?;

    statics::analyze(&mut ctx, &file_asts);

    Ok(CheckReport {
        file_db: ctx.file_db,
        findings: ctx.findings,
    })
}

fn get_files(ctx: &mut AnalysisContext, roots: &[&str]) -> Result<Vec<Rc<FileAst>>, ErrorSummary> {
    let mut file_asts: Vec<Rc<FileAst>> = vec![];

    for root in roots {
        let file_data = match ctx.file_provider.search_for_file(Path::new(root)) {
            Err(e) => {
                return Err(ErrorSummary {
                    msg: e.to_string(),
                    more: None,
                });
            }
            Ok(file_data) => file_data,
        };
        let file_id = ctx.file_db.add(file_data);
        let file_ast = parse::parse_file(ctx, file_id);
        file_asts.push(file_ast);
    }

    Ok(file_asts)
}

/// Everything one analysis run produced.
#[derive(Debug)]
pub struct CheckReport {
    file_db: FileDatabase,
    findings: Vec<Finding>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn files(&self) -> &FileDatabase {
        &self.file_db
    }

    pub fn emit(&self) {
        for finding in &self.findings {
            finding.emit(&self.file_db);
        }
    }

    pub fn to_string_ansi(&self) -> String {
        let mut s = String::new();
        for finding in &self.findings {
            s.push_str(&finding.to_string(&self.file_db, true));
        }
        s
    }

    /// One edit per finding, in finding order.
    pub fn synthesize_fixes(&self) -> Vec<Edit> {
        self.findings
            .iter()
            .map(|finding| statics::fix::synthesize(finding, &self.file_db))
            .collect()
    }

    /// Apply every synthesized fix, returning the rewritten source of each
    /// affected file. Edits within a file are applied back-to-front so their
    /// offsets stay valid.
    pub fn apply_fixes(&self) -> Vec<(FileId, String)> {
        let mut edits_by_file: HashMap<FileId, Vec<Edit>> = HashMap::new();
        for edit in self.synthesize_fixes() {
            edits_by_file.entry(edit.file_id).or_default().push(edit);
        }

        let mut out: Vec<(FileId, String)> = vec![];
        let mut file_ids: Vec<FileId> = edits_by_file.keys().cloned().collect();
        file_ids.sort_unstable();
        for file_id in file_ids {
            let Ok(file_data) = self.file_db.get(file_id) else {
                continue;
            };
            let mut edits = edits_by_file.remove(&file_id).unwrap();
            edits.sort_by_key(|e| std::cmp::Reverse(e.insert_at()));
            let mut source = file_data.source.clone();
            for edit in &edits {
                source = edit.apply(&source);
            }
            out.push((file_id, source));
        }
        out
    }
}

impl Display for CheckReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for finding in &self.findings {
            write!(f, "{}", finding.to_string(&self.file_db, false))?;
        }
        Ok(())
    }
}

/// Host-level failure: unreadable input or syntax errors. Analysis findings
/// never travel through this type.
#[derive(Debug)]
pub struct ErrorSummary {
    msg: String,
    more: Option<(FileDatabase, Vec<Error>)>,
}

use std::io::IsTerminal;

fn c(code: &str) -> &str {
    let use_color = std::io::stdout().is_terminal();

    if use_color { code } else { "" }
}

impl ErrorSummary {
    pub(crate) fn from_errors(file_db: FileDatabase, errors: Vec<Error>) -> Self {
        ErrorSummary {
            msg: String::new(),
            more: Some((file_db, errors)),
        }
    }

    pub fn emit(&self) {
        if !self.msg.is_empty() {
            let red = c("\x1B[1;31m");
            let bold = c("\x1b[1m");
            let reset = c("\x1b[0m");
            eprintln!("{red}{bold}error:{reset} {}", self.msg);
        }
        if let Some((file_db, errors)) = &self.more {
            for error in errors {
                error.emit(file_db);
            }
        }
    }

    pub fn to_string_ansi(&self) -> String {
        let mut s = String::new();
        s.push_str(&self.msg);
        if let Some((file_db, errors)) = &self.more {
            for error in errors {
                s.push_str(&error.to_string(file_db, true));
            }
        }
        s
    }
}

impl Display for ErrorSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.msg)?;
        if let Some((file_db, errors)) = &self.more {
            for error in errors {
                writeln!(f, "{}", error.to_string(file_db, false))?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ErrorSummary {}

#[derive(Debug)]
struct MyError(String);

impl fmt::Display for MyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MyError {}

pub trait FileProvider {
    /// Given a path, return the contents of the file as a String,
    /// or an error if the file cannot be found.
    fn search_for_file(&self, path: &Path) -> Result<FileData, Box<dyn std::error::Error>>;
}

#[derive(Default, Debug)]
pub struct OsFileProvider {
    base_dir: PathBuf,
}

impl OsFileProvider {
    pub fn new(base_dir: PathBuf) -> Box<Self> {
        Box::new(Self { base_dir })
    }
}

impl FileProvider for OsFileProvider {
    fn search_for_file(&self, relative_path: &Path) -> Result<FileData, Box<dyn std::error::Error>> {
        let desired = self.base_dir.join(relative_path);
        match std::fs::read_to_string(&desired) {
            Ok(contents) => Ok(FileData::new(relative_path.to_owned(), contents)),
            Err(_) => Err(Box::new(MyError(format!(
                "could not find file `{}`",
                desired.display()
            )))),
        }
    }
}

#[derive(Default, Debug)]
pub struct MockFileProvider {
    path_to_file: HashMap<PathBuf, String>,
}

impl MockFileProvider {
    pub fn new(path_to_file: HashMap<PathBuf, String>) -> Box<Self> {
        Box::new(Self { path_to_file })
    }

    pub fn single_file(contents: &str) -> Box<Self> {
        let mut path_to_file = HashMap::new();
        path_to_file.insert(Path::new("main.cs").to_path_buf(), contents.into());
        Box::new(Self { path_to_file })
    }
}

impl FileProvider for MockFileProvider {
    fn search_for_file(&self, relative_path: &Path) -> Result<FileData, Box<dyn std::error::Error>> {
        match self.path_to_file.get(relative_path) {
            Some(contents) => Ok(FileData::new(relative_path.into(), contents.into())),
            None => Err(Box::new(MyError(format!(
                "could not find file `{}`",
                relative_path.display()
            )))),
        }
    }
}
