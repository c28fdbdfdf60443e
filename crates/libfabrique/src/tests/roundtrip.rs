//! Pretty-printing round trips: parse → print → re-parse → evaluate.

use pretty_assertions::assert_eq;

use crate::dag::Dag;
use crate::file::SourceFile;
use crate::nom_tools::State;
use crate::types::TypeContext;
use crate::{evaluate, parse_source, EvalOptions};

fn evaluate_code(code: &str) -> (TypeContext, Dag) {
    let state = State::new(SourceFile::new("test.fab", code));
    let ast = parse_source(&state).expect("parse failed");

    let mut types = TypeContext::new();
    let dag = evaluate(&ast, &mut types, EvalOptions::default()).expect("evaluation failed");
    (types, dag)
}

fn fingerprint(dag: &Dag, types: &TypeContext) -> Vec<String> {
    let mut lines = Vec::new();

    for file in dag.files() {
        lines.push(format!("file {}", file.full_name()));
    }

    for build in dag.builds() {
        let inputs: Vec<String> = build.inputs().iter().map(|f| f.full_name()).collect();
        let outputs: Vec<String> = build.outputs().iter().map(|f| f.full_name()).collect();
        lines.push(format!(
            "build {} <- {} [{}]",
            outputs.join(","),
            build.rule().name(),
            inputs.join(",")
        ));
    }

    let mut rules: Vec<&String> = dag.rules().keys().collect();
    rules.sort();
    for name in rules {
        lines.push(format!("rule {name} '{}'", dag.rules()[name].command()));
    }

    for (name, value) in dag.variables() {
        lines.push(format!("var {name} = {}", value.render(types)));
    }

    lines
}

fn assert_roundtrip(code: &str) {
    let state = State::new(SourceFile::new("test.fab", code));
    let ast = parse_source(&state).expect("parse failed");
    let printed = ast.to_string();

    let reparsed_state = State::new(SourceFile::new("printed.fab", printed.clone()));
    let reparsed = parse_source(&reparsed_state)
        .unwrap_or_else(|e| panic!("re-parse of pretty-printed source failed: {e}\n{printed}"));

    let mut types = TypeContext::new();
    let original = evaluate(&ast, &mut types, EvalOptions::default()).expect("evaluation failed");
    let original_print = fingerprint(&original, &types);

    let mut types = TypeContext::new();
    let roundtripped =
        evaluate(&reparsed, &mut types, EvalOptions::default()).expect("evaluation failed");
    let roundtripped_print = fingerprint(&roundtripped, &types);

    assert_eq!(original_print, roundtripped_print, "source:\n{printed}");
}

#[test]
fn primitives_roundtrip() {
    assert_roundtrip("x = 1 + 2 * 3; y = 'a' + 'b'; z = not (true and false);");
}

#[test]
fn build_graph_roundtrips() {
    assert_roundtrip(
        "cc = action('cc -c ${src} -o ${obj}', description = 'Compiling ${src}' \
         <- src: file[in], obj: file[out]);
         objs = foreach s <- ['a', 'b'] cc(src = file(s + '.c'), obj = file(s + '.o'));",
    );
}

#[test]
fn functions_and_records_roundtrip() {
    assert_roundtrip(
        "k = 2;
         f = function(x: int, y: int = 1): int x * y + k;
         r = record { a = f(3); b = if true 1 else 0; };
         v = r.a;",
    );
}

#[test]
fn file_lists_roundtrip() {
    assert_roundtrip("srcs = files(a.c b.c, subdir = 'src');");
}

#[test]
fn backends_render_without_error() {
    use crate::backend::Format;

    let (types, dag) = evaluate_code(
        "cc = action('cc -c ${src} -o ${obj}' <- src: file[in], obj: file[out]);
         o = cc(src = file('a.c'), obj = file('out/a.o'));",
    );

    for format in [Format::Ninja, Format::Dot, Format::Make, Format::Shell] {
        let mut output = Vec::new();
        format
            .format(&dag, &types, &mut output)
            .expect("backend failed");

        let text = String::from_utf8(output).expect("backend wrote invalid UTF-8");
        assert!(!text.is_empty());

        if format == Format::Ninja {
            assert!(text.contains("rule cc"), "{text}");
            assert!(text.contains("build out/a.o: cc a.c"), "{text}");
            assert!(text.contains("rule mkdir"), "{text}");
        }

        if format == Format::Make {
            assert!(text.contains("out/a.o: a.c"), "{text}");
            assert!(text.contains("cc -c a.c -o out/a.o"), "{text}");
        }
    }
}
