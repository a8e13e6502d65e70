/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::helper::{assert_clean, assert_missing, check, unwrap_or_panic};
use sealcheck_core::{CancelFlag, MockFileProvider, check_files, check_files_with};
use std::collections::HashMap;
use std::path::PathBuf;

// POSITIVE TESTS
// Every reachable implementor is handled; nothing should be reported.

#[test]
fn simple_valid() {
    let src = r#"
namespace ConsoleApplication1 {
    class OuterClass {
        interface union { }
        struct NestedStructA : union { }
        struct NestedStructB : union { }
    }

    class Program {
        void Main() {
            int x = 0;
            OuterClass.union test = new OuterClass.NestedStructA();
            switch (test) {
                case OuterClass.NestedStructA a: x = 1; break;
                case OuterClass.NestedStructB b: x = 2; break;
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    assert_clean(src);
}

#[test]
fn branch_on_marker_covers_family() {
    let src = r#"
namespace App {
    interface union { }
    class A : union { }
    class B : union { }

    class Program {
        void Main(union test) {
            switch (test) {
                case union u: break;
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    assert_clean(src);
}

#[test]
fn supertype_branch_covers_descendants() {
    let src = r#"
namespace App {
    interface Shape { }
    abstract class Base : Shape { }
    class Circle : Base { }
    class Square : Base { }

    class Program {
        void Main(Shape s) {
            switch (s) {
                case Base b: break;
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    assert_clean(src);
}

#[test]
fn shared_body_branches_all_count() {
    // two labels stacked onto one body, and one stacked onto the failing
    // default, are each their own coverage evidence
    let src = r#"
namespace App {
    interface union { }
    class TestClass : union { }
    class OneMoreInheritor : union { }
    interface IChildInterface : union { }

    class Program {
        void Main(union test) {
            int x = 0;
            switch (test) {
                case TestClass a:
                case OneMoreInheritor b: x = 1; break;
                case IChildInterface i:
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    assert_clean(src);
}

#[test]
fn ordinary_default_asserts_nothing() {
    let src = r#"
namespace App {
    interface union { }
    class A : union { }
    class B : union { }

    class Program {
        void Main(union test) {
            int x = 0;
            switch (test) {
                case A a: x = 1; break;
                default: x = 2; break;
            }
        }
    }
}
"#;
    assert_clean(src);
}

#[test]
fn no_default_asserts_nothing() {
    let src = r#"
namespace App {
    interface union { }
    class A : union { }
    class B : union { }

    class Program {
        void Main(union test) {
            switch (test) {
                case A a: break;
            }
        }
    }
}
"#;
    assert_clean(src);
}

#[test]
fn default_with_conditional_throw_is_ordinary() {
    // only one arm of the if fails, so a path exits normally
    let src = r#"
namespace App {
    interface union { }
    class A : union { }
    class B : union { }

    class Program {
        void Main(union test, bool flag) {
            switch (test) {
                case A a: break;
                default:
                    if (flag) {
                        throw new NotImplementedException();
                    }
                    break;
            }
        }
    }
}
"#;
    assert_clean(src);
}

#[test]
fn implementors_from_other_namespaces_are_invisible() {
    let src = r#"
namespace OtherNamespace {
    interface union { }
    class OneMoreInheritor : union { }
    class Another : union { }
}

namespace ConsoleApplication1 {
    class Program {
        void Main() {
            OtherNamespace.union test = new OtherNamespace.OneMoreInheritor();
            switch (test) {
                case OtherNamespace.OneMoreInheritor o: break;
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    // no check for items from other namespaces not visible in current place
    assert_clean(src);
}

#[test]
fn switch_on_builtin_is_skipped() {
    let src = r#"
namespace App {
    class Program {
        void Main() {
            int x = 2;
            switch (x) {
                case 1: break;
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    assert_clean(src);
}

#[test]
fn switch_on_unresolvable_scrutinee_is_skipped() {
    let src = r#"
namespace App {
    interface union { }
    class A : union { }

    class Program {
        void Main() {
            switch (Helpers.make()) {
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    assert_clean(src);
}

#[test]
fn switch_on_childless_struct_is_skipped() {
    let src = r#"
namespace App {
    struct Point { }

    class Program {
        void Main(Point p) {
            switch (p) {
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    assert_clean(src);
}

// NEGATIVE TESTS
// The switch asserts exhaustiveness but misses part of the hierarchy.

#[test]
fn simple_invalid() {
    let src = r#"
namespace ConsoleApplication1 {
    class OuterClass {
        interface union { }
        struct NestedStructA : union { }
        struct NestedStructB : union { }
    }

    class Program {
        void Main() {
            int x = 0;
            OuterClass.union test = new OuterClass.NestedStructA();
            switch (test) {
                case OuterClass.NestedStructA a: x = 1; break;
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    assert_missing(src, &["ConsoleApplication1.OuterClass.NestedStructB"]);
}

#[test]
fn diagnostic_message_lists_all_missing_types() {
    let src = r#"
namespace App {
    interface union { }
    class A : union { }
    class B : union { }
    class C : union { }

    class Program {
        void Main(union test) {
            switch (test) {
                case A a: break;
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    let report = check(src);
    assert_eq!(report.findings().len(), 1);
    let finding = &report.findings()[0];
    assert_eq!(finding.marker(), "App.union");
    assert_eq!(
        finding.message(),
        "Switch case should check type implementation of type(s): App.B, App.C"
    );
}

#[test]
fn missing_types_follow_discovery_order() {
    // breadth-first: direct implementors in declaration order, then deeper
    // levels; the leaf under IChildInterface replaces it in the report
    let src = r#"
namespace App {
    interface union { }
    class TestClass : union { }
    class OneMoreInheritor : union { }
    interface IChildInterface : union { }
    class CustomClass : IChildInterface { }

    class Program {
        void Main(union test) {
            switch (test) {
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    assert_missing(
        src,
        &["App.TestClass", "App.OneMoreInheritor", "App.CustomClass"],
    );
}

#[test]
fn abstract_leaf_is_reported() {
    // an interface nothing in scope implements still needs a case
    let src = r#"
namespace App {
    interface union { }
    class TestClass : union { }
    interface IChildInterface : union { }

    class Program {
        void Main(union test) {
            switch (test) {
                case TestClass a: break;
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    assert_missing(src, &["App.IChildInterface"]);
}

#[test]
fn cast_scrutinee_is_analyzed() {
    let src = r#"
namespace App {
    interface union { }
    class TestClass : union { }
    class OneMoreInheritor : union { }

    class Program {
        void Main() {
            switch (new TestClass() as union) {
                case TestClass a: break;
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    assert_missing(src, &["App.OneMoreInheritor"]);
}

#[test]
fn throw_inside_block_still_asserts() {
    let src = r#"
namespace App {
    interface union { }
    class TestClass : union { }
    class OneMoreInheritor : union { }

    class Program {
        void Main(union test) {
            switch (test) {
                case TestClass a: break;
                default: {
                    var s = test;
                    throw new NotImplementedException();
                }
            }
        }
    }
}
"#;
    assert_missing(src, &["App.OneMoreInheritor"]);
}

#[test]
fn if_else_that_always_throws_asserts() {
    let src = r#"
namespace App {
    interface union { }
    class A : union { }
    class B : union { }

    class Program {
        void Main(union test, bool flag) {
            switch (test) {
                case A a: break;
                default:
                    if (flag) {
                        throw new BadFlag();
                    } else {
                        throw new NotImplementedException();
                    }
            }
        }
    }
}
"#;
    assert_missing(src, &["App.B"]);
}

#[test]
fn value_and_unresolvable_patterns_contribute_nothing() {
    // the `case Unknown u` branch names a type that never resolves; it is
    // ignored rather than fatal, which over-reports but never under-reports
    let src = r#"
namespace App {
    interface union { }
    class A : union { }
    class B : union { }

    class Program {
        void Main(union test) {
            int x = 0;
            switch (test) {
                case A a: x = 1; break;
                case Unknown u: x = 2; break;
                case 42: x = 3; break;
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    assert_missing(src, &["App.B"]);
}

#[test]
fn duplicate_base_entries_report_once() {
    let src = r#"
namespace App {
    interface union { }
    class A : union, union { }

    class Program {
        void Main(union test) {
            switch (test) {
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    assert_missing(src, &["App.A"]);
}

#[test]
fn sites_are_independent() {
    // one broken site (unresolvable scrutinee) must not stop its sibling
    let src = r#"
namespace App {
    interface union { }
    class A : union { }
    class B : union { }

    class Program {
        void First() {
            switch (Helpers.make()) {
                default: throw new NotImplementedException();
            }
        }

        void Second(union test) {
            switch (test) {
                case A a: break;
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    assert_missing(src, &["App.B"]);
}

#[test]
fn implementors_across_files_are_seen() {
    let mut files = HashMap::new();
    files.insert(
        PathBuf::from("a.cs"),
        r#"
namespace App {
    interface union { }
    class A : union { }

    class Program {
        void Main(union test) {
            switch (test) {
                case A a: break;
                default: throw new NotImplementedException();
            }
        }
    }
}
"#
        .to_string(),
    );
    files.insert(
        PathBuf::from("b.cs"),
        r#"
namespace App {
    class B : union { }
}
"#
        .to_string(),
    );
    let report = unwrap_or_panic(check_files(
        &["a.cs", "b.cs"],
        MockFileProvider::new(files),
    ));
    assert_eq!(report.findings().len(), 1);
    assert_eq!(report.findings()[0].missing(), &["App.B"]);
}

#[test]
fn cancelled_run_reports_nothing() {
    let src = r#"
namespace App {
    interface union { }
    class A : union { }
    class B : union { }

    class Program {
        void Main(union test) {
            switch (test) {
                case A a: break;
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    let cancel = CancelFlag::new();
    cancel.cancel();
    let report = unwrap_or_panic(check_files_with(
        &["main.cs"],
        MockFileProvider::single_file(src),
        cancel,
    ));
    assert!(report.is_clean());
}

// HOST-LEVEL FAILURES

fn should_fail(src: &str) {
    check_files(&["main.cs"], MockFileProvider::single_file(src)).unwrap_err();
}

#[test]
fn syntax_error_aborts_analysis() {
    should_fail("class { }");
}

#[test]
fn missing_file_aborts_analysis() {
    check_files(
        &["nope.cs"],
        MockFileProvider::single_file("namespace App { }"),
    )
    .unwrap_err();
}
