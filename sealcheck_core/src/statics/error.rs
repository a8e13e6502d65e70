/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use super::{Error, Finding};
use crate::ast::{FileDatabase, FileId};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{Buffer, ColorChoice, StandardStream};

impl Error {
    fn make_diagnostic(&self) -> Diagnostic<FileId> {
        let mut diagnostic = Diagnostic::error();
        let mut labels = Vec::new();

        match self {
            Error::UnrecognizedToken(file, index) => {
                diagnostic = diagnostic.with_message("Unrecognized token");
                labels.push(Label::secondary(*file, *index..index + 1).with_message("here"));
            }
            Error::UnrecognizedEscapeSequence(file, span) => {
                diagnostic = diagnostic.with_message("Unrecognized escape sequence");
                labels.push(Label::secondary(*file, span.lo..span.hi));
            }
            Error::UnexpectedToken(expected, found, loc) => {
                diagnostic = diagnostic.with_message("Unexpected token");
                labels.push(
                    Label::secondary(loc.file_id, loc.lo..loc.hi)
                        .with_message(format!("Found `{found}` when expecting `{expected}`")),
                );
            }
        };

        diagnostic.with_labels(labels)
    }

    pub fn emit(&self, files: &FileDatabase) {
        emit_to_stderr(files, &self.make_diagnostic());
    }

    pub fn to_string(&self, files: &FileDatabase, ansi: bool) -> String {
        render(files, &self.make_diagnostic(), ansi)
    }
}

impl Finding {
    /// One diagnostic per switch site, anchored at the scrutinee expression,
    /// all missing types batched into a single message.
    fn make_diagnostic(&self) -> Diagnostic<FileId> {
        let loc = &self.anchor.loc;
        Diagnostic::warning()
            .with_code("missing-case-coverage")
            .with_message(self.message())
            .with_labels(vec![Label::primary(loc.file_id, loc.range())])
    }

    pub fn emit(&self, files: &FileDatabase) {
        emit_to_stderr(files, &self.make_diagnostic());
    }

    pub fn to_string(&self, files: &FileDatabase, ansi: bool) -> String {
        render(files, &self.make_diagnostic(), ansi)
    }
}

fn emit_to_stderr(files: &FileDatabase, diagnostic: &Diagnostic<FileId>) {
    let writer = StandardStream::stderr(ColorChoice::Always);
    let config = term::Config::default();

    term::emit(&mut writer.lock(), &config, files, diagnostic).unwrap();
}

fn render(files: &FileDatabase, diagnostic: &Diagnostic<FileId>, ansi: bool) -> String {
    let mut buffer = if ansi {
        Buffer::ansi()
    } else {
        Buffer::no_color()
    };
    let config = term::Config::default();

    term::emit(&mut buffer, &config, files, diagnostic).unwrap();
    String::from_utf8(buffer.into_inner()).unwrap()
}
