//! End-to-end extraction of function entry points.

use hack_slicer::project::ProgramDb;
use serde_json::json;

fn db(value: serde_json::Value) -> ProgramDb {
    ProgramDb::new(serde_json::from_value(value).expect("valid program"))
}

#[test]
fn namespaced_function_without_dependencies() {
    let body = "function foo(): int { return 1; }";
    let text = format!("<?hh\nnamespace N;\n{body}\n");
    let start = text.find(body).unwrap();
    let db = db(json!({
        "files": {"n.php": text},
        "funs": [{
            "name": "\\N\\foo",
            "ty": {"ret": {"Prim": "Int"}},
            "pos": {"file": "n.php", "start": start, "end": start + body.len()}
        }],
        "fun_edges": {"\\N\\foo": [{"Fun": "\\N\\foo"}]}
    }));

    let out = hack_slicer::extract(db.services(), "\\N\\foo");
    assert!(out.starts_with("////toplevel.php"), "got: {out}");
    assert!(out.contains("////namespaces.php"));
    assert!(out.contains("function default_factory(): nothing { throw new \\Exception(); }"));
    assert!(out.contains("namespace N {"));
    assert!(out.contains(body), "literal body missing: {out}");
    // The literal body appears exactly once; no stub shadows the entry.
    assert_eq!(out.matches("return 1;").count(), 1, "got: {out}");
}

#[test]
fn extraction_is_idempotent() {
    let body = "function foo(): int { return 1; }";
    let text = format!("<?hh\nnamespace N;\n{body}\n");
    let start = text.find(body).unwrap();
    let db = db(json!({
        "files": {"n.php": text},
        "funs": [{
            "name": "\\N\\foo",
            "ty": {"ret": {"Prim": "Int"}},
            "pos": {"file": "n.php", "start": start, "end": start + body.len()}
        }]
    }));

    let first = hack_slicer::extract(db.services(), "\\N\\foo");
    let second = hack_slicer::extract(db.services(), "\\N\\foo");
    assert_eq!(first, second);
}

#[test]
fn enum_dependency_gets_representative_entry_and_parameter_default() {
    let body = "function f(): void { g(E::A); }";
    let text = format!("<?hh\n{body}\n");
    let start = text.find(body).unwrap();
    let db = db(json!({
        "files": {"f.php": text, "g.php": ""},
        "classes": [{
            "name": "\\E",
            "kind": "Enum",
            "pos": {"file": "e.php"},
            "consts": [
                {"name": "A", "ty": {"Prim": "Int"}},
                {"name": "B", "ty": {"Prim": "Int"}}
            ],
            "enum_ty": {"base": {"Prim": "Int"}}
        }],
        "funs": [
            {
                "name": "\\f",
                "ty": {"ret": {"Prim": "Void"}},
                "pos": {"file": "f.php", "start": start, "end": start + body.len()}
            },
            {
                "name": "\\g",
                "ty": {
                    "params": [{"name": "x", "ty": {"Apply": {"name": "\\E"}}}],
                    "ret": {"Prim": "Void"},
                    "min_arity": 0
                },
                "pos": {"file": "g.php"}
            }
        ],
        "fun_edges": {"\\f": [{"Fun": "\\g"}]}
    }));

    let out = hack_slicer::extract(db.services(), "\\f");
    assert!(out.contains("enum E: int {"), "got: {out}");
    assert!(out.contains("A = 0;"), "got: {out}");
    assert!(!out.contains("B = 0;"), "only one representative expected: {out}");
    assert!(
        out.contains("function g(\\E $x = default_factory()): void { throw new \\Exception(); }"),
        "got: {out}"
    );
    assert!(out.contains(body));
}

#[test]
fn shape_constant_omits_optional_fields() {
    let body = "function f(): void { DEFAULTS; }";
    let text = format!("<?hh\n{body}\n");
    let start = text.find(body).unwrap();
    let db = db(json!({
        "files": {"f.php": text},
        "funs": [{
            "name": "\\f",
            "ty": {"ret": {"Prim": "Void"}},
            "pos": {"file": "f.php", "start": start, "end": start + body.len()}
        }],
        "gconsts": [{
            "name": "\\DEFAULTS",
            "ty": {"Shape": {"open": false, "fields": [
                {"name": "x", "ty": {"Prim": "Int"}},
                {"name": "y", "optional": true, "ty": {"Prim": "String"}}
            ]}},
            "pos": {"file": "consts.php"}
        }],
        "fun_edges": {"\\f": [{"GConst": "\\DEFAULTS"}]}
    }));

    let out = hack_slicer::extract(db.services(), "\\f");
    assert!(
        out.contains("const shape('x' => int, ?'y' => string) DEFAULTS = shape('x' => 0);"),
        "got: {out}"
    );
}

#[test]
fn typedef_dependency_is_synthesized_with_its_target() {
    let body = "function f(): void {}";
    let text = format!("<?hh\n{body}\n");
    let start = text.find(body).unwrap();
    let db = db(json!({
        "files": {"f.php": text},
        "classes": [{"name": "\\B2", "kind": "Class", "pos": {"file": "b2.php"}}],
        "typedefs": [
            {"name": "\\Alias", "ty": {"Apply": {"name": "\\B2"}}, "pos": {"file": "t.php"}},
            {
                "name": "\\Opaque",
                "ty": {"Prim": "Int"},
                "transparent": false,
                "pos": {"file": "t.php"}
            }
        ],
        "funs": [{
            "name": "\\f",
            "ty": {"ret": {"Prim": "Void"}},
            "pos": {"file": "f.php", "start": start, "end": start + body.len()}
        }],
        "fun_edges": {"\\f": [{"Class": "\\Alias"}, {"Class": "\\Opaque"}]}
    }));

    let out = hack_slicer::extract(db.services(), "\\f");
    assert!(out.contains("type Alias = \\B2;"), "got: {out}");
    assert!(out.contains("newtype Opaque = int;"), "got: {out}");
    assert!(out.contains("class B2 {}"), "typedef target missing: {out}");
}

#[test]
fn builtins_are_never_synthesized() {
    let body = "function f(): void {}";
    let text = format!("<?hh\n{body}\n");
    let start = text.find(body).unwrap();
    let db = db(json!({
        "files": {"f.php": text},
        "classes": [{
            "name": "\\HH\\Vector",
            "kind": "Class",
            "pos": {"file": "collections.hhi"}
        }],
        "funs": [{
            "name": "\\f",
            "ty": {"ret": {"Prim": "Void"}},
            "pos": {"file": "f.php", "start": start, "end": start + body.len()}
        }],
        "fun_edges": {"\\f": [{"Class": "\\HH\\Vector"}]}
    }));

    let out = hack_slicer::extract(db.services(), "\\f");
    assert!(!out.contains("class Vector"), "builtin leaked: {out}");
}

#[test]
fn type_access_chain_collects_one_constant_per_hop() {
    let body = "function f(): void {}";
    let text = format!("<?hh\n{body}\n");
    let start = text.find(body).unwrap();
    let db = db(json!({
        "files": {"f.php": text, "g2.php": ""},
        "classes": [
            {
                "name": "\\T0",
                "kind": "Class",
                "pos": {"file": "t0.php"},
                "typeconsts": [{"name": "TC1", "ty": {"Apply": {"name": "\\T1"}}}]
            },
            {
                "name": "\\T1",
                "kind": "Class",
                "pos": {"file": "t1.php"},
                "typeconsts": [{"name": "TC2", "ty": {"Prim": "Int"}}]
            }
        ],
        "funs": [
            {
                "name": "\\f",
                "ty": {"ret": {"Prim": "Void"}},
                "pos": {"file": "f.php", "start": start, "end": start + body.len()}
            },
            {
                "name": "\\g2",
                "ty": {
                    "params": [{
                        "name": "t",
                        "ty": {"Access": {
                            "root": {"Access": {
                                "root": {"Apply": {"name": "\\T0"}},
                                "name": "TC1"
                            }},
                            "name": "TC2"
                        }}
                    }],
                    "ret": {"Prim": "Void"}
                },
                "pos": {"file": "g2.php"}
            }
        ],
        "fun_edges": {"\\f": [{"Fun": "\\g2"}]}
    }));

    let out = hack_slicer::extract(db.services(), "\\f");
    assert!(out.contains("const type TC1 = \\T1;"), "got: {out}");
    assert!(out.contains("const type TC2 = int;"), "got: {out}");
    assert!(out.contains("\\T0::TC1::TC2 $t"), "got: {out}");
}

#[test]
fn static_reference_to_instance_method_is_rewritten() {
    let body = "function f(): void {}";
    let text = format!("<?hh\n{body}\n");
    let start = text.find(body).unwrap();
    let db = db(json!({
        "files": {"f.php": text},
        "classes": [{
            "name": "\\C2",
            "kind": "Class",
            "pos": {"file": "c2.php"},
            "methods": [{"name": "s", "ty": {"ret": {"Prim": "Void"}}}]
        }],
        "funs": [{
            "name": "\\f",
            "ty": {"ret": {"Prim": "Void"}},
            "pos": {"file": "f.php", "start": start, "end": start + body.len()}
        }],
        "fun_edges": {"\\f": [{"SMethod": {"class": "\\C2", "name": "s"}}]}
    }));

    let out = hack_slicer::extract(db.services(), "\\f");
    assert!(
        out.contains("public function s(): void { throw new \\Exception(); }"),
        "got: {out}"
    );
    assert!(!out.contains("static function s"), "got: {out}");
}

#[test]
fn class_literal_reference_is_satisfied_without_synthesis() {
    let body = "function f(): void { Foo::class; }";
    let text = format!("<?hh\n{body}\n");
    let start = text.find(body).unwrap();
    let db = db(json!({
        "files": {"f.php": text},
        "classes": [{"name": "\\Foo", "kind": "Class", "pos": {"file": "foo.php"}}],
        "funs": [{
            "name": "\\f",
            "ty": {"ret": {"Prim": "Void"}},
            "pos": {"file": "f.php", "start": start, "end": start + body.len()}
        }],
        "fun_edges": {"\\f": [{"Const": {"class": "\\Foo", "name": "class"}}]}
    }));

    let out = hack_slicer::extract(db.services(), "\\f");
    assert!(out.contains("class Foo {}"), "got: {out}");
    // Every class carries `::class` implicitly; nothing is declared for it.
    assert!(!out.contains("Dependency not found"), "got: {out}");
    assert!(!out.contains("const"), "got: {out}");
}

#[test]
fn enum_without_usable_constant_is_unsupported_in_value_position() {
    let body = "function f(): void {}";
    let text = format!("<?hh\n{body}\n");
    let start = text.find(body).unwrap();
    let db = db(json!({
        "files": {"f.php": text},
        "classes": [{
            "name": "\\EOnly",
            "kind": "Enum",
            "pos": {"file": "eonly.php"},
            "consts": [{"name": "class", "ty": {"Prim": "String"}}],
            "enum_ty": {"base": {"Prim": "Int"}}
        }],
        "gconsts": [{
            "name": "\\BAD",
            "ty": {"Apply": {"name": "\\EOnly"}},
            "pos": {"file": "consts.php"}
        }],
        "funs": [{
            "name": "\\f",
            "ty": {"ret": {"Prim": "Void"}},
            "pos": {"file": "f.php", "start": start, "end": start + body.len()}
        }],
        "fun_edges": {"\\f": [{"GConst": "\\BAD"}]}
    }));

    let out = hack_slicer::extract(db.services(), "\\f");
    assert!(out.contains("no usable constant on \\EOnly"), "got: {out}");
}
