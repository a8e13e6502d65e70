/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use sealcheck_core::MockFileProvider;
use sealcheck_core::check_files;
use std::fmt::Write;

/// A namespace with one marker, `implementors` deriving types, and a switch
/// naming the first `cased` of them before a throwing default.
fn synthetic_source(implementors: usize, cased: usize) -> String {
    let mut src = String::from("namespace Bench {\n    interface Node { }\n");
    for i in 0..implementors {
        writeln!(src, "    class Node{i} : Node {{ }}").unwrap();
    }
    src.push_str("    class Walker {\n        int Walk(Node n) {\n            switch (n) {\n");
    for i in 0..cased {
        writeln!(src, "                case Node{i} a: return {i};").unwrap();
    }
    src.push_str("                default: throw new NotImplementedException();\n");
    src.push_str("            }\n        }\n    }\n}\n");
    src
}

fn run_benchmark(c: &mut Criterion, name: &str, src: &str) {
    c.bench_function(name, |b| {
        b.iter(|| {
            let report =
                check_files(&["main.cs"], MockFileProvider::single_file(src)).unwrap();
            black_box(report.findings().len())
        });
    });
}

pub fn wide_hierarchy_benchmark(c: &mut Criterion) {
    let src = synthetic_source(200, 100);
    run_benchmark(c, "wide_hierarchy_half_cased", &src);
}

pub fn exhaustive_benchmark(c: &mut Criterion) {
    let src = synthetic_source(100, 100);
    run_benchmark(c, "wide_hierarchy_fully_cased", &src);
}

criterion_group!(benches, wide_hierarchy_benchmark, exhaustive_benchmark);
criterion_main!(benches);
