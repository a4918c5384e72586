//! End-to-end extraction of method entry points.

use hack_slicer::project::ProgramDb;
use serde_json::json;

fn db(value: serde_json::Value) -> ProgramDb {
    ProgramDb::new(serde_json::from_value(value).expect("valid program"))
}

#[test]
fn method_entry_emits_property_constructor_and_reached_class() {
    let body = "public function m(): void { $this->p; }";
    let text = format!("<?hh\nclass C {{\n  {body}\n}}\n");
    let start = text.find(body).unwrap();
    let db = db(json!({
        "files": {"c.php": text},
        "classes": [
            {
                "name": "\\C",
                "kind": "Class",
                "pos": {"file": "c.php"},
                "props": [{"name": "p", "ty": {"Apply": {"name": "\\B"}}}],
                "methods": [{
                    "name": "m",
                    "ty": {"ret": {"Prim": "Void"}},
                    "pos": {"file": "c.php", "start": start, "end": start + body.len()}
                }]
            },
            {
                "name": "\\B",
                "kind": "Class",
                "pos": {"file": "b.php"},
                "consts": [{"name": "K", "ty": {"Prim": "Int"}}]
            }
        ],
        "class_edges": {"\\C": [{
            "source": {"Method": {"class": "\\C", "name": "m"}},
            "target": {"Prop": {"class": "\\C", "name": "p"}}
        }]}
    }));

    let out = hack_slicer::extract(db.services(), "\\C::m");
    assert!(out.contains("class C {"), "got: {out}");
    assert!(out.contains("public \\B $p;"), "got: {out}");
    assert!(out.contains("public function __construct()"), "got: {out}");
    assert!(out.contains("$this->p = default_factory();"), "got: {out}");
    assert!(out.contains("class B {"), "reached class missing: {out}");
    assert!(out.contains("const int K = 0;"), "got: {out}");
    // The entry body is inlined exactly once, never stubbed.
    assert_eq!(out.matches("$this->p;").count(), 1, "got: {out}");
    assert!(!out.contains("function m(): void { throw"), "entry was stubbed: {out}");
}

#[test]
fn interface_methods_provided_by_the_class_are_forced() {
    let body = "public function m(): void {}";
    let text = format!("<?hh\nclass D implements I {{\n  {body}\n}}\n");
    let start = text.find(body).unwrap();
    let db = db(json!({
        "files": {"d.php": text},
        "classes": [
            {
                "name": "\\I",
                "kind": "Interface",
                "pos": {"file": "i.php"},
                "methods": [{"name": "k", "ty": {"ret": {"Prim": "Void"}}}]
            },
            {
                "name": "\\D",
                "kind": "Class",
                "pos": {"file": "d.php"},
                "ancestors": [{"name": "\\I", "ty": {"Apply": {"name": "\\I"}}}],
                "methods": [
                    {"name": "k", "ty": {"ret": {"Prim": "Void"}}},
                    {
                        "name": "m",
                        "ty": {"ret": {"Prim": "Void"}},
                        "pos": {"file": "d.php", "start": start, "end": start + body.len()}
                    }
                ]
            }
        ]
    }));

    let out = hack_slicer::extract(db.services(), "\\D::m");
    assert!(out.contains("class D implements \\I {"), "got: {out}");
    assert!(
        out.contains("public function k(): void { throw new \\Exception(); }"),
        "forced interface method missing: {out}"
    );
    assert!(out.contains("interface I {}"), "got: {out}");
    assert!(out.contains(body), "entry body missing: {out}");
}

#[test]
fn inherited_members_are_not_redeclared() {
    let body = "public function m(): void { $this->q; }";
    let text = format!("<?hh\nclass Sub extends Base {{\n  {body}\n}}\n");
    let start = text.find(body).unwrap();
    let db = db(json!({
        "files": {"sub.php": text},
        "classes": [
            {
                "name": "\\Base",
                "kind": "Class",
                "pos": {"file": "base.php"},
                "props": [{"name": "q", "ty": {"Prim": "Int"}}]
            },
            {
                "name": "\\Sub",
                "kind": "Class",
                "pos": {"file": "sub.php"},
                "ancestors": [{"name": "\\Base", "ty": {"Apply": {"name": "\\Base"}}}],
                "props": [{"name": "q", "ty": {"Prim": "Int"}, "origin": "\\Base"}],
                "methods": [{
                    "name": "m",
                    "ty": {"ret": {"Prim": "Void"}},
                    "pos": {"file": "sub.php", "start": start, "end": start + body.len()}
                }]
            }
        ],
        "class_edges": {"\\Sub": [{
            "source": {"Method": {"class": "\\Sub", "name": "m"}},
            "target": {"Prop": {"class": "\\Sub", "name": "q"}}
        }]}
    }));

    let out = hack_slicer::extract(db.services(), "\\Sub::m");
    assert!(out.contains("class Sub extends \\Base {"), "got: {out}");
    assert!(out.contains("class Base {}"), "got: {out}");
    // The folded copy on Sub originates in Base, so Sub must not redeclare it.
    assert!(!out.contains("$q;"), "inherited property redeclared: {out}");
}

#[test]
fn dependency_free_method_still_emits_its_class() {
    let body = "public static function id(int $x): int { return $x; }";
    let text = format!("<?hh\nfinal class Util {{\n  {body}\n}}\n");
    let start = text.find(body).unwrap();
    let db = db(json!({
        "files": {"util.php": text},
        "classes": [{
            "name": "\\Lib\\Util",
            "kind": "Class",
            "pos": {"file": "util.php"},
            "smethods": [{
                "name": "id",
                "ty": {
                    "params": [{"name": "x", "ty": {"Prim": "Int"}}],
                    "ret": {"Prim": "Int"}
                },
                "pos": {"file": "util.php", "start": start, "end": start + body.len()}
            }]
        }]
    }));

    let out = hack_slicer::extract(db.services(), "\\Lib\\Util::id");
    assert!(out.contains("namespace Lib {"), "got: {out}");
    assert!(out.contains("class Util {"), "got: {out}");
    assert!(out.contains(body), "entry body missing: {out}");
}

#[test]
fn missing_method_reports_not_found() {
    let db = db(json!({
        "classes": [{"name": "\\C", "kind": "Class", "pos": {"file": "c.php"}}]
    }));
    assert_eq!(hack_slicer::extract(db.services(), "\\C::nope"), "Not found!");
}
