//! End-to-end tests driving the public `Driver` against in-memory sources
//! and asserting on the projected JSON document.

use std::path::{Path, PathBuf};

use serde_json::Value;

use sapc::reporting::Message;
use sapc::resolver::MemoryResolver;
use sapc::{Compilation, Driver, Status};

fn driver_for(sources: &[(&str, &str)]) -> (Driver, MemoryResolver) {
    let mut resolver = MemoryResolver::new();
    for (path, source) in sources {
        resolver = resolver.with(*path, *source);
    }
    (Driver::new(), resolver)
}

/// Compile, expecting no errors, and return the driver and compilation.
fn compile_ok(sources: &[(&str, &str)]) -> (Driver, Compilation) {
    let (mut driver, resolver) = driver_for(sources);
    let compilation = driver.compile(&resolver, Path::new(sources[0].0), &[]);
    assert!(
        !Message::any_errors(&compilation.messages),
        "unexpected errors: {:?}",
        compilation.messages
    );
    assert!(compilation.root.is_some());
    (driver, compilation)
}

fn json_of(sources: &[(&str, &str)]) -> Value {
    let (driver, compilation) = compile_ok(sources);
    driver.to_json(&compilation).expect("a root module")
}

fn types_of(doc: &Value) -> &Vec<Value> {
    doc["types"].as_array().expect("a types array")
}

fn find_type<'a>(doc: &'a Value, qualified: &str) -> &'a Value {
    types_of(doc)
        .iter()
        .find(|ty| ty["qualified"] == qualified)
        .unwrap_or_else(|| panic!("no type `{qualified}` in {doc}"))
}

#[test]
fn minimal_module() {
    let (driver, compilation) = compile_ok(&[("m.sap", "module m;")]);
    assert!(compilation.messages.is_empty());

    let validation = driver.validate(&compilation);
    assert!(validation.is_empty(), "unexpected: {validation:?}");

    let doc = driver.to_json(&compilation).unwrap();
    assert_eq!(doc["module"]["name"], "m");
    assert_eq!(doc["types"], serde_json::json!([]));
    assert_eq!(doc["constants"], serde_json::json!([]));
    assert_eq!(doc["namespaces"], serde_json::json!([]));
}

#[test]
fn enum_values_and_enum_defaults() {
    let doc = json_of(&[(
        "m.sap",
        "module m; enum E { A, B = 3, C }; struct S { E e = B; };",
    )]);

    let e = find_type(&doc, "E");
    let values: Vec<i64> = e["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["value"].as_i64().unwrap())
        .collect();
    assert_eq!(values, vec![0, 3, 4]);

    let s = find_type(&doc, "S");
    let default = &s["fields"][0]["default"];
    assert_eq!(default["kind"], "enum");
    assert_eq!(default["type"], "E");
    assert_eq!(default["name"], "B");
    assert_eq!(default["value"], 3);
}

#[test]
fn pointer_and_array_interning() {
    let doc = json_of(&[(
        "m.sap",
        "module m; struct S { int* a; int* b; int[] c; int[] d; }",
    )]);

    let pointers: Vec<&Value> = types_of(&doc)
        .iter()
        .filter(|ty| ty["kind"] == "pointer")
        .collect();
    let arrays: Vec<&Value> = types_of(&doc)
        .iter()
        .filter(|ty| ty["kind"] == "array")
        .collect();
    assert_eq!(pointers.len(), 1);
    assert_eq!(arrays.len(), 1);

    let s = find_type(&doc, "S");
    let fields = s["fields"].as_array().unwrap();
    assert_eq!(fields[0]["type"], fields[1]["type"]);
    assert_eq!(fields[2]["type"], fields[3]["type"]);
    assert_eq!(fields[0]["type"], "int*");
    assert_eq!(fields[2]["type"], "int[]");
}

#[test]
fn generic_specialization_aliases() {
    let doc = json_of(&[(
        "m.sap",
        "module m; struct List<T> { T[] items; } struct U { List<int> a; List<int> b; }",
    )]);

    let specialized: Vec<&Value> = types_of(&doc)
        .iter()
        .filter(|ty| ty["kind"] == "specialized")
        .collect();
    assert_eq!(specialized.len(), 1);
    assert_eq!(specialized[0]["refType"], "List");
    assert_eq!(specialized[0]["typeArgs"], serde_json::json!(["int"]));

    let u = find_type(&doc, "U");
    assert_eq!(u["fields"][0]["type"], u["fields"][1]["type"]);
    assert_eq!(u["fields"][0]["type"], "List<int>");
}

#[test]
fn import_cycle_compiles_to_completion() {
    let doc = json_of(&[
        ("a.sap", "module a; import b; struct A { B* other; }"),
        ("b.sap", "module b; import a; struct B { int x; }"),
    ]);

    assert_eq!(doc["module"]["imports"], serde_json::json!(["b"]));

    // no duplicates in the type list
    let mut qualified: Vec<(&str, &str)> = types_of(&doc)
        .iter()
        .map(|ty| {
            (
                ty["qualified"].as_str().unwrap(),
                ty["module"].as_str().unwrap(),
            )
        })
        .collect();
    let total = qualified.len();
    qualified.sort();
    qualified.dedup();
    assert_eq!(qualified.len(), total, "type list contains duplicates");
}

#[test]
fn attribute_defaulting() {
    let doc = json_of(&[(
        "m.sap",
        "module m; attribute Doc { string text = \"tbd\"; } [Doc] struct S {};",
    )]);

    let s = find_type(&doc, "S");
    assert_eq!(s["annotations"][0]["type"], "Doc");
    assert_eq!(s["annotations"][0]["args"], serde_json::json!(["tbd"]));
}

#[test]
fn custom_tag_declarations() {
    let doc = json_of(&[(
        "m.sap",
        "module m; attribute Doc { string text; } use entity : struct; [Doc(\"x\")] entity E {};",
    )]);

    let e = find_type(&doc, "E");
    assert_eq!(e["kind"], "struct");
    let annotations = e["annotations"].as_array().unwrap();
    assert_eq!(annotations.len(), 2);
    assert_eq!(annotations[0]["type"], "Doc");
    assert_eq!(annotations[0]["args"], serde_json::json!(["x"]));
    assert_eq!(annotations[1]["type"], "$sapc.customtag");
    assert_eq!(annotations[1]["args"], serde_json::json!(["entity"]));
}

#[test]
fn custom_tags_propagate_across_imports() {
    let doc = json_of(&[
        (
            "m.sap",
            "module m; import tags; widget W { int id; }",
        ),
        ("tags.sap", "module tags; use widget : struct;"),
    ]);

    let w = find_type(&doc, "W");
    assert_eq!(w["kind"], "struct");
    let annotations = w["annotations"].as_array().unwrap();
    assert_eq!(annotations[0]["type"], "$sapc.customtag");
    assert_eq!(annotations[0]["args"], serde_json::json!(["widget"]));
}

#[test]
fn duplicate_field_fails_validation() {
    let (mut driver, resolver) = driver_for(&[(
        "m.sap",
        "module m; struct S { int x; int x; }",
    )]);
    let compilation = driver.compile(&resolver, Path::new("m.sap"), &[]);
    assert!(!Message::any_errors(&compilation.messages));

    let validation = driver.validate(&compilation);
    assert!(Message::any_errors(&validation));
    assert_eq!(validation.len(), 1);
    // the CLI maps a validation failure to exit code 4
    assert_eq!(Status::ValidateError.exit_code(), 4);
}

#[test]
fn module_name_mismatch_is_a_warning_only() {
    let (mut driver, resolver) = driver_for(&[("file.sap", "module other;")]);
    let compilation = driver.compile(&resolver, Path::new("file.sap"), &[]);
    assert!(!Message::any_errors(&compilation.messages));

    let validation = driver.validate(&compilation);
    assert_eq!(validation.len(), 1);
    assert!(!Message::any_errors(&validation));
}

#[test]
fn typename_outside_attribute_fails_validation() {
    let (mut driver, resolver) = driver_for(&[(
        "m.sap",
        "module m; struct S { typename t; }",
    )]);
    let compilation = driver.compile(&resolver, Path::new("m.sap"), &[]);
    assert!(!Message::any_errors(&compilation.messages));

    let validation = driver.validate(&compilation);
    assert!(Message::any_errors(&validation));
}

#[test]
fn json_round_trip_is_byte_identical() {
    let (driver, compilation) = compile_ok(&[(
        "m.sap",
        "module m; namespace n { enum E { A, B } struct S { E e = A; int* p; } } const string GREETING = \"hi\\n\";",
    )]);

    let first = driver.to_json_string(&compilation).unwrap();
    let parsed: Value = serde_json::from_str(&first).unwrap();
    let second = serde_json::to_string_pretty(&parsed).unwrap();
    assert_eq!(first, second);
}

#[test]
fn compiling_twice_is_deterministic() {
    let sources: &[(&str, &str)] = &[
        ("m.sap", "module m; import lib; struct S { T t; int[3] xs; }"),
        ("lib.sap", "module lib; struct T { bool flag = true; }"),
    ];

    let (driver_a, compilation_a) = compile_ok(sources);
    let (driver_b, compilation_b) = compile_ok(sources);
    assert_eq!(
        driver_a.to_json_string(&compilation_a).unwrap(),
        driver_b.to_json_string(&compilation_b).unwrap()
    );
}

#[test]
fn dependencies_accumulate_in_compile_order() {
    let (_, compilation) = compile_ok(&[
        ("m.sap", "module m; import a; import b;"),
        ("a.sap", "module a;"),
        ("b.sap", "module b;"),
    ]);
    assert_eq!(
        compilation.dependencies,
        vec![
            PathBuf::from("m.sap"),
            PathBuf::from("a.sap"),
            PathBuf::from("b.sap"),
        ]
    );
}

#[test]
fn missing_import_is_a_compile_error() {
    let (mut driver, resolver) = driver_for(&[("m.sap", "module m; import nowhere;")]);
    let compilation = driver.compile(&resolver, Path::new("m.sap"), &[]);
    assert!(Message::any_errors(&compilation.messages));
    assert_eq!(Status::CompileError.exit_code(), 2);
}

#[test]
fn search_paths_resolve_imports() {
    let (mut driver, resolver) = driver_for(&[
        ("src/m.sap", "module m; import lib; struct S { T t; }"),
        ("vendor/lib.sap", "module lib; struct T { int x; }"),
    ]);
    let compilation = driver.compile(
        &resolver,
        Path::new("src/m.sap"),
        &[PathBuf::from("vendor")],
    );
    assert!(
        !Message::any_errors(&compilation.messages),
        "unexpected errors: {:?}",
        compilation.messages
    );
}

#[test]
fn namespaces_project_with_members() {
    let doc = json_of(&[(
        "m.sap",
        "module m; namespace gfx { struct Color { int r; int g; int b; } const int DEPTH = 32; namespace detail { } }",
    )]);

    let namespaces = doc["namespaces"].as_array().unwrap();
    assert_eq!(namespaces.len(), 2);
    assert_eq!(namespaces[0]["qualified"], "gfx");
    assert_eq!(namespaces[0]["types"], serde_json::json!(["gfx.Color"]));
    assert_eq!(namespaces[0]["constants"], serde_json::json!(["gfx.DEPTH"]));
    assert_eq!(
        namespaces[0]["namespaces"],
        serde_json::json!(["gfx.detail"])
    );
    assert_eq!(namespaces[1]["qualified"], "gfx.detail");
    assert_eq!(namespaces[1]["namespace"], "gfx");

    let color = find_type(&doc, "gfx.Color");
    assert_eq!(color["namespace"], "gfx");
    assert_eq!(color["module"], "m");
}

#[test]
fn module_annotations_attach_to_the_module() {
    let doc = json_of(&[(
        "m.sap",
        "module m; attribute Version { int major; int minor = 0; } [Version(2)] module m;",
    )]);

    let annotations = doc["module"]["annotations"].as_array().unwrap();
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0]["type"], "Version");
    assert_eq!(annotations[0]["args"], serde_json::json!([2, 0]));
}

#[test]
fn typename_values_in_annotations() {
    let doc = json_of(&[(
        "m.sap",
        "module m; attribute Uses { typename target; } struct Other { int x; } [Uses(Other)] struct S {}",
    )]);

    let s = find_type(&doc, "S");
    let arg = &s["annotations"][0]["args"][0];
    assert_eq!(arg["kind"], "typename");
    assert_eq!(arg["type"], "Other");
}

#[test]
fn list_literals_translate_elementwise() {
    let doc = json_of(&[(
        "m.sap",
        "module m; const int[] SIZES = { 1, 2, 3 };",
    )]);

    let constants = doc["constants"].as_array().unwrap();
    assert_eq!(constants[0]["name"], "SIZES");
    assert_eq!(constants[0]["type"], "int[]");
    assert_eq!(constants[0]["value"], serde_json::json!([1, 2, 3]));
}

#[test]
fn aliases_project_their_target() {
    let doc = json_of(&[(
        "m.sap",
        "module m; struct S { int x; } using Handle = S*; using Opaque;",
    )]);

    let handle = find_type(&doc, "Handle");
    assert_eq!(handle["kind"], "alias");
    assert_eq!(handle["refType"], "S*");

    let opaque = find_type(&doc, "Opaque");
    assert_eq!(opaque["kind"], "alias");
    assert!(opaque.get("refType").is_none());
}

#[test]
fn locations_carry_line_and_column() {
    let doc = json_of(&[("m.sap", "module m;\nstruct S {\n  int x;\n}\n")]);

    let s = find_type(&doc, "S");
    assert_eq!(s["location"]["filename"], "m.sap");
    assert_eq!(s["location"]["line"], 2);
    assert_eq!(s["location"]["column"], 8);

    let field = &s["fields"][0];
    assert_eq!(field["location"]["line"], 3);
}
