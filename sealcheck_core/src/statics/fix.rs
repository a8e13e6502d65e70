/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use super::Finding;
use crate::ast::{FileDatabase, FileId};
use utils::swrite;

/// A source edit that adds one placeholder case per missing type, directly
/// before the default branch. Applying it once fully resolves the finding:
/// re-analyzing the fixed source yields an empty missing set.
#[derive(Debug, Clone)]
pub struct Edit {
    pub file_id: FileId,
    pub insertions: Vec<CaseInsertion>,
    /// Byte offset in the original source where the new labels go.
    insert_at: usize,
    /// `Some(indent)` when each label gets its own line; `None` when the
    /// default label shares a line with earlier text and the new labels are
    /// spliced inline before it.
    indent: Option<String>,
}

/// One synthesized `case <Type> _:` label. The body is empty on purpose: the
/// new label passes through to the default branch, preserving behavior until
/// someone writes the real handling.
#[derive(Debug, Clone)]
pub struct CaseInsertion {
    /// Index of the branch the new case goes in front of, relative to the
    /// original site's flattened label list. All insertions of one edit point
    /// at the default branch and keep their listed order.
    pub insert_before_branch: usize,
    /// Fully qualified name of the missing type.
    pub pattern_type: String,
}

impl Edit {
    pub fn insert_at(&self) -> usize {
        self.insert_at
    }

    /// Splice the synthesized labels into `source`. Pre-existing branches are
    /// untouched and keep their order; the default branch stays last.
    pub fn apply(&self, source: &str) -> String {
        let mut text = String::new();
        for insertion in &self.insertions {
            match &self.indent {
                Some(indent) => {
                    swrite!(&mut text, "{}case {} _:\n", indent, insertion.pattern_type)
                }
                None => swrite!(&mut text, "case {} _: ", insertion.pattern_type),
            }
        }
        let mut fixed = String::with_capacity(source.len() + text.len());
        fixed.push_str(&source[..self.insert_at]);
        fixed.push_str(&text);
        fixed.push_str(&source[self.insert_at..]);
        fixed
    }
}

/// Turn one finding's missing-type set into the minimal patch for its site.
pub(crate) fn synthesize(finding: &Finding, files: &FileDatabase) -> Edit {
    let label_loc = &finding.default_label.loc;
    let file_id = label_loc.file_id;
    let source: &str = match files.get(file_id) {
        Ok(file_data) => &file_data.source,
        Err(_) => "",
    };

    let lo = label_loc.lo.min(source.len());
    let line_start = source[..lo].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let prefix = &source[line_start..lo];
    let (insert_at, indent) = if prefix.chars().all(|c| c == ' ' || c == '\t') {
        // default sits at the start of its line: give each new label a line
        (line_start, Some(prefix.to_string()))
    } else {
        // default shares a line; splice the labels right before it
        (lo, None)
    };

    let insertions = finding
        .missing
        .iter()
        .map(|fqn| CaseInsertion {
            insert_before_branch: finding.default_branch_ix,
            pattern_type: fqn.clone(),
        })
        .collect();

    Edit {
        file_id,
        insertions,
        insert_at,
        indent,
    }
}
