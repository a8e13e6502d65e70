/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::helper::{assert_clean, check};

/// Apply every synthesized fix to the single-file source under test.
fn apply_fixes(src: &str) -> String {
    let report = check(src);
    assert!(
        !report.is_clean(),
        "fix tests need at least one finding to fix"
    );
    let mut fixed = report.apply_fixes();
    assert_eq!(fixed.len(), 1);
    fixed.remove(0).1
}

#[test]
fn fix_simple() {
    let src = r#"
namespace App {
    interface union { }
    class TestClass : union { }
    class OneMoreInheritor : union { }

    class Program {
        int Run(union test) {
            switch (test) {
                case TestClass a: return 1;
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    let expected = src.replace(
        "                default: throw new NotImplementedException();",
        "                case App.OneMoreInheritor _:\n                default: throw new NotImplementedException();",
    );

    let fixed = apply_fixes(src);
    assert_eq!(fixed, expected);

    // applying the fix once fully resolves the diagnostic
    assert_clean(&fixed);
}

#[test]
fn fix_interface() {
    let src = r#"
namespace App {
    interface union { }
    class TestClass : union { }
    class OneMoreInheritor : union { }
    interface IChildInterface : union { }

    class Program {
        int Run(union test) {
            switch (test) {
                case TestClass a: return 2;
                case OneMoreInheritor o: return 1;
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    let expected = src.replace(
        "                default: throw new NotImplementedException();",
        "                case App.IChildInterface _:\n                default: throw new NotImplementedException();",
    );

    let fixed = apply_fixes(src);
    assert_eq!(fixed, expected);
    assert_clean(&fixed);
}

#[test]
fn fix_inserts_every_missing_type_in_order() {
    let src = r#"
namespace App {
    interface union { }
    class A : union { }
    class B : union { }
    class C : union { }

    class Program {
        void Run(union test) {
            switch (test) {
                case A a: break;
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    let expected = src.replace(
        "                default: throw new NotImplementedException();",
        "                case App.B _:\n                case App.C _:\n                default: throw new NotImplementedException();",
    );

    let fixed = apply_fixes(src);
    assert_eq!(fixed, expected);
    assert_clean(&fixed);
}

#[test]
fn fix_edit_points_at_the_default_branch() {
    let src = r#"
namespace App {
    interface union { }
    class A : union { }
    class B : union { }

    class Program {
        void Run(union test) {
            switch (test) {
                case A a: break;
                case 7: break;
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    let report = check(src);
    let edits = report.synthesize_fixes();
    assert_eq!(edits.len(), 1);
    let edit = &edits[0];
    assert_eq!(edit.insertions.len(), 1);
    // the default is the third label of the site
    assert_eq!(edit.insertions[0].insert_before_branch, 2);
    assert_eq!(edit.insertions[0].pattern_type, "App.B");
}

#[test]
fn fix_when_default_shares_a_line() {
    let src = r#"
namespace App {
    interface union { }
    class A : union { }
    class B : union { }

    class Program {
        void Run(union test) {
            switch (test) {
                case A a: default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    let fixed = apply_fixes(src);
    assert!(fixed.contains("case A a: case App.B _: default:"));
    assert_clean(&fixed);
}

#[test]
fn fixed_output_is_stable() {
    // a second pipeline round has nothing left to add
    let src = r#"
namespace App {
    interface union { }
    class A : union { }
    class B : union { }
    class C : union { }

    class Program {
        void Run(union test) {
            switch (test) {
                default: throw new NotImplementedException();
            }
        }
    }
}
"#;
    let fixed = apply_fixes(src);
    let report = check(&fixed);
    assert!(report.is_clean());
    assert!(report.synthesize_fixes().is_empty());
}
