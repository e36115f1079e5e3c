//! Compile the demo modules end-to-end through the filesystem resolver.

use std::path::PathBuf;

use sapc::reporting::Message;
use sapc::resolver::FsResolver;
use sapc::Driver;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join(name)
}

#[test]
fn demo_modules_compile_and_validate() {
    for name in ["math.sap", "render.sap"] {
        let mut driver = Driver::new();
        let compilation = driver.compile(&FsResolver, &demo(name), &[]);
        assert!(
            !Message::any_errors(&compilation.messages),
            "{name}: {:?}",
            compilation.messages
        );

        let validation = driver.validate(&compilation);
        assert!(
            !Message::any_errors(&validation),
            "{name}: {validation:?}"
        );

        let json = driver.to_json_string(&compilation).expect("a document");
        assert!(json.contains("\"$schema\""));
    }
}

#[test]
fn render_demo_lists_imported_types() {
    let mut driver = Driver::new();
    let compilation = driver.compile(&FsResolver, &demo("render.sap"), &[]);
    assert!(!Message::any_errors(&compilation.messages));

    let doc = driver.to_json(&compilation).expect("a document");
    assert_eq!(doc["module"]["name"], "render");
    assert_eq!(doc["module"]["imports"], serde_json::json!(["math"]));

    // Vec2 comes along from the math module so a generator can emit a
    // self-contained header for render alone
    let types = doc["types"].as_array().unwrap();
    assert!(types
        .iter()
        .any(|ty| ty["qualified"] == "math.Vec2" && ty["module"] == "math"));
    assert!(types
        .iter()
        .any(|ty| ty["qualified"] == "Batch<Sprite>" && ty["kind"] == "specialized"));
}
