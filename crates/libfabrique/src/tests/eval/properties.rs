//! Quantified invariants of the finished build graph.

use pretty_assertions::assert_eq;

use super::{evaluate_source, expect_dag};
use crate::error::FabError;

static RULE_AND_BUILDS: &str =
    "cc = action('cc -c ${src} -o ${obj}' <- src: file[in], obj: file[out]);
     a = cc(src = file('a.c'), obj = file('a.o'));
     b = cc(src = file('a.c'), obj = file('b.o'));";

#[test]
fn files_are_unique_by_full_name() {
    // 'a.c' is opened twice and used by two builds; it appears once.
    let (_, dag) = expect_dag(RULE_AND_BUILDS);

    let mut names: Vec<String> = dag.files().iter().map(|f| f.full_name()).collect();
    let before = names.len();
    names.dedup();
    assert_eq!(before, names.len());
    assert_eq!(
        names.iter().filter(|name| name.as_str() == "a.c").count(),
        1
    );
}

#[test]
fn files_are_sorted_by_full_name() {
    let (_, dag) = expect_dag(RULE_AND_BUILDS);

    let names: Vec<String> = dag.files().iter().map(|f| f.full_name()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[test]
fn every_build_has_generated_outputs() {
    let (_, dag) = expect_dag(RULE_AND_BUILDS);

    for build in dag.builds() {
        assert!(!build.outputs().is_empty());
        for output in build.outputs() {
            assert!(output.generated());
        }
    }
}

#[test]
fn top_level_targets_have_bindings() {
    let (_, dag) = expect_dag(RULE_AND_BUILDS);

    for (name, _) in dag.top_level_targets() {
        assert!(dag.targets().contains_key(name), "missing target '{name}'");
    }
}

#[test]
fn evaluation_is_idempotent() {
    let (_, first) = expect_dag(RULE_AND_BUILDS);
    let (_, second) = expect_dag(RULE_AND_BUILDS);

    let files = |dag: &crate::dag::Dag| -> Vec<String> {
        dag.files().iter().map(|f| f.full_name()).collect()
    };
    let rules = |dag: &crate::dag::Dag| -> Vec<String> {
        dag.rules().keys().cloned().collect()
    };
    let builds = |dag: &crate::dag::Dag| -> Vec<String> {
        dag.builds()
            .iter()
            .map(|b| {
                format!(
                    "{}:{}",
                    b.rule().name(),
                    b.outputs()
                        .iter()
                        .map(|f| f.full_name())
                        .collect::<Vec<_>>()
                        .join(",")
                )
            })
            .collect()
    };

    assert_eq!(files(&first), files(&second));
    assert_eq!(rules(&first), rules(&second));
    assert_eq!(builds(&first), builds(&second));
}

#[test]
fn target_may_name_its_own_output() {
    // A target called 'out' that itself produces the file 'out' is fine.
    let (_, dag) = expect_dag(
        "cc = action('cp ${src} ${obj}' <- src: file[in], obj: file[out]);
         out = cc(src = file('in.txt'), obj = file('out'));",
    );
    assert!(dag.targets().contains_key("out"));
    assert_eq!(dag.builds()[0].outputs()[0].full_name(), "out");
}

#[test]
fn target_conflicting_with_unrelated_file_is_rejected() {
    let result = evaluate_source(
        "cc = action('cp ${src} ${obj}' <- src: file[in], obj: file[out]);
         out = cc(src = file('out'), obj = file('made.txt'));",
    );

    assert!(
        matches!(result, Err(FabError::TargetConflict(_))),
        "a target named 'out' unrelated to the file 'out' must be rejected"
    );
}

#[test]
fn absolute_files_cannot_be_generated() {
    let result = evaluate_source(
        "cc = action('cp ${src} ${obj}' <- src: file[in], obj: file[out]);
         x = cc(src = file('a.c'), obj = file('/etc/passwd'));",
    );

    assert!(matches!(result, Err(FabError::AbsoluteOutput(_))));
}

#[test]
fn generated_flag_is_monotone() {
    // a.o is an output of one build and an input of another; it stays
    // generated.
    let (_, dag) = expect_dag(
        "cc = action('cc -c ${src} -o ${obj}' <- src: file[in], obj: file[out]);
         ld = action('ld ${obj} -o ${bin}' <- obj: file[in], bin: file[out]);
         o = cc(src = file('a.c'), obj = file('a.o'));
         b = ld(obj = o, bin = file('a.out'));",
    );

    let object = dag
        .files()
        .iter()
        .find(|f| f.full_name() == "a.o")
        .expect("a.o in DAG");
    assert!(object.generated());
}

#[test]
fn regeneration_links_build_files_to_sources() {
    use crate::{EvalOptions, Regeneration};

    let options = EvalOptions {
        regeneration: Some(Regeneration {
            command: "fabc fabfile".to_string(),
            outputs: vec!["build.ninja".to_string()],
        }),
        ..EvalOptions::default()
    };

    let (_, dag) = super::evaluate_with_options("x = 1;", options).expect("evaluation failed");

    let rule = dag
        .rules()
        .get("_fabrique_regenerate")
        .expect("regeneration rule");
    assert!(rule.command().contains("${rootInput}"));
    assert_eq!(rule.arguments()["pool"].as_string(), Some("console"));

    let build = dag
        .builds()
        .iter()
        .find(|build| build.rule().name() == "_fabrique_regenerate")
        .expect("regeneration build");
    assert_eq!(build.inputs()[0].full_name(), "test.fab");
    assert_eq!(build.outputs()[0].full_name(), "build.ninja");
}

#[test]
fn empty_record_is_a_supertype_of_all_records() {
    // Width subtyping: a record with fields can be passed where an empty
    // record is expected.
    let (_, dag) = expect_dag(
        "f = function(r: record[]): int 7;
         x = f(record { a = 1; });",
    );

    assert_eq!(dag.variables()["x"].as_integer(), Some(7));
}
