/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

// functions used for testing

use sealcheck_core::{CheckReport, ErrorSummary, MockFileProvider, check_files};

pub fn unwrap_or_panic(result: Result<CheckReport, ErrorSummary>) -> CheckReport {
    match result {
        Ok(report) => report,
        Err(e) => {
            panic!("{}", e.to_string_ansi());
        }
    }
}

/// Analyze one embedded source file.
pub fn check(src: &str) -> CheckReport {
    unwrap_or_panic(check_files(&["main.cs"], MockFileProvider::single_file(src)))
}

/// Assert the analysis produced no findings.
pub fn assert_clean(src: &str) {
    let report = check(src);
    assert!(
        report.is_clean(),
        "expected no findings, got:\n{}",
        report
            .findings()
            .iter()
            .map(|f| f.message())
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Assert exactly one finding whose missing list is `expected`.
pub fn assert_missing(src: &str, expected: &[&str]) {
    let report = check(src);
    assert_eq!(
        report.findings().len(),
        1,
        "expected exactly one finding, got {}",
        report.findings().len()
    );
    assert_eq!(report.findings()[0].missing(), expected);
}
