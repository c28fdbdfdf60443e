//! Tests over the demo build descriptions in the repository's `demos/`
//! directory.

use crate::file::SourceFile;
use crate::nom_tools::State;
use crate::types::TypeContext;
use crate::{evaluate, parse_source, EvalOptions};

/// Loads a file from the demos directory, wherever the tests are run from.
fn load_demo(filename: &str) -> Result<String, std::io::Error> {
    for prefix in ["demos", "../demos", "../../demos"] {
        if let Ok(content) = std::fs::read_to_string(format!("{prefix}/{filename}")) {
            return Ok(content);
        }
    }

    std::fs::read_to_string(format!("demos/{filename}"))
}

#[test]
fn demo_fabfile_builds() {
    let content = load_demo("fabfile").expect("demos/fabfile should exist");
    let state = State::new(SourceFile::new("demos/fabfile", content));
    let ast = parse_source(&state).expect("demo fabfile should parse");

    let mut types = TypeContext::new();
    let dag = evaluate(&ast, &mut types, EvalOptions::default())
        .expect("demo fabfile should evaluate");

    // Two compiles, one link, plus the synthesized mkdir for build/.
    assert!(dag.rules().contains_key("cc"));
    assert!(dag.rules().contains_key("link"));
    assert!(dag.rules().contains_key("mkdir"));

    let compile_count = dag
        .builds()
        .iter()
        .filter(|build| build.rule().name() == "cc")
        .count();
    assert_eq!(compile_count, 2);

    let link = dag
        .builds()
        .iter()
        .find(|build| build.rule().name() == "link")
        .expect("link build");
    assert_eq!(link.inputs().len(), 2);
    assert_eq!(link.outputs()[0].full_name(), "build/demo");

    assert!(dag.targets().contains_key("demo"));
    assert!(dag.variables().contains_key("flags"));
}
