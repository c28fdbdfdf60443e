//! End-to-end scenarios over the whole pipeline.

use pretty_assertions::assert_eq;

use super::expect_dag;

#[test]
fn primitive_values() {
    let (_, dag) = expect_dag("x = 1 + 2; y = 'a' + 'b'; z = true and false;");

    assert_eq!(dag.variables()["x"].as_integer(), Some(3));
    assert_eq!(dag.variables()["y"].as_string(), Some("ab"));
    assert_eq!(dag.variables()["z"].as_boolean(), Some(false));
}

#[test]
fn arithmetic_and_logic() {
    let (_, dag) = expect_dag(
        "a = 7 - 2 * 3;
         b = 9 / 3;
         c = -4;
         d = not true;
         e = 1 == 1;
         f = 1 != 1;
         g = true or false;
         h = true xor true;",
    );

    assert_eq!(dag.variables()["a"].as_integer(), Some(1));
    assert_eq!(dag.variables()["b"].as_integer(), Some(3));
    assert_eq!(dag.variables()["c"].as_integer(), Some(-4));
    assert_eq!(dag.variables()["d"].as_boolean(), Some(false));
    assert_eq!(dag.variables()["e"].as_boolean(), Some(true));
    assert_eq!(dag.variables()["f"].as_boolean(), Some(false));
    assert_eq!(dag.variables()["g"].as_boolean(), Some(true));
    assert_eq!(dag.variables()["h"].as_boolean(), Some(false));
}

#[test]
fn simple_rule_and_build() {
    let (_, dag) = expect_dag(
        "cc = action('cc -c ${src} -o ${obj}' <- src: file[in], obj: file[out]);
         o = cc(src = file('a.c'), obj = file('a.o'));",
    );

    assert!(dag.rules().contains_key("cc"));
    assert_eq!(dag.builds().len(), 1);

    let build = &dag.builds()[0];
    assert_eq!(build.inputs().len(), 1);
    assert_eq!(build.inputs()[0].full_name(), "a.c");
    assert_eq!(build.outputs().len(), 1);
    assert_eq!(build.outputs()[0].full_name(), "a.o");
    assert!(build.outputs()[0].generated());
    assert!(!build.inputs()[0].generated());

    assert!(dag.targets().contains_key("o"));
}

#[test]
fn foreach_produces_ordered_builds() {
    let (_, dag) = expect_dag(
        "cc = action('cc -c ${src} -o ${obj}' <- src: file[in], obj: file[out]);
         outs = foreach s <- ['a', 'b'] cc(src = file(s + '.c'), obj = file(s + '.o'));",
    );

    assert_eq!(dag.builds().len(), 2);
    assert_eq!(dag.builds()[0].outputs()[0].full_name(), "a.o");
    assert_eq!(dag.builds()[1].outputs()[0].full_name(), "b.o");
}

#[test]
fn closures_capture_their_definition_site() {
    let (_, dag) = expect_dag(
        "k = 10;
         f = function(x: int): int x + k;
         k2 = 20;
         r = f(5);",
    );

    assert_eq!(dag.variables()["r"].as_integer(), Some(15));
}

#[test]
fn function_defaults_and_positional_arguments() {
    let (_, dag) = expect_dag(
        "add = function(x: int, y: int = 4): int x + y;
         a = add(1, 2);
         b = add(1);
         c = add(y = 10, x = 1);",
    );

    assert_eq!(dag.variables()["a"].as_integer(), Some(3));
    assert_eq!(dag.variables()["b"].as_integer(), Some(5));
    assert_eq!(dag.variables()["c"].as_integer(), Some(11));
}

#[test]
fn record_width_subtyping_in_calls() {
    let (_, dag) = expect_dag(
        "first = function(r: record[a: int]): int 1;
         x = first(record { a = 1; b = 2; });",
    );

    assert_eq!(dag.variables()["x"].as_integer(), Some(1));
}

#[test]
fn directory_synthesis_precedes_compilation() {
    let (_, dag) = expect_dag(
        "cc = action('cc -c ${src} -o ${obj}' <- src: file[in], obj: file[out]);
         o = cc(src = file('x.c'), obj = file('build/sub/x.o'));",
    );

    assert!(dag.rules().contains_key("mkdir"));

    let mkdir_builds: Vec<_> = dag
        .builds()
        .iter()
        .take_while(|build| build.rule().name() == "mkdir")
        .collect();
    assert_eq!(mkdir_builds.len(), 2, "one mkdir per directory level");

    let directories: Vec<String> = mkdir_builds
        .iter()
        .map(|build| build.outputs()[0].full_name())
        .collect();
    assert!(directories.contains(&"build/sub".to_string()));
    assert!(directories.contains(&"build".to_string()));

    // The compile step comes after the directories it needs.
    let last = dag.builds().last().unwrap();
    assert_eq!(last.rule().name(), "cc");

    // The synthesized directories are files in the DAG too.
    let names: Vec<String> = dag.files().iter().map(|f| f.full_name()).collect();
    assert!(names.contains(&"build".to_string()));
    assert!(names.contains(&"build/sub".to_string()));
}

#[test]
fn conditional_evaluates_one_branch() {
    let (_, dag) = expect_dag(
        "pick = if true 'yes' else 'no';
         other = if 1 == 2 'yes' else 'no';",
    );

    assert_eq!(dag.variables()["pick"].as_string(), Some("yes"));
    assert_eq!(dag.variables()["other"].as_string(), Some("no"));
}

#[test]
fn files_with_subdir() {
    let (_, dag) = expect_dag("srcs = files(a.c sub/b.c, subdir = 'src');");

    let names: Vec<String> = dag.files().iter().map(|f| f.full_name()).collect();
    assert!(names.contains(&"src/a.c".to_string()));
    assert!(names.contains(&"src/sub/b.c".to_string()));
}

#[test]
fn file_name_arithmetic() {
    let (_, dag) = expect_dag(
        "src = file('main.c');
         obj = src + '.o';
         pre = 'lib' :: file('fab.a');",
    );

    let mut files = Vec::new();
    crate::dag::collect_files(dag.targets()["obj"].value(), &mut files);
    assert_eq!(files[0].full_name(), "main.c.o");

    let mut files = Vec::new();
    crate::dag::collect_files(dag.targets()["pre"].value(), &mut files);
    assert_eq!(files[0].full_name(), "libfab.a");
}

#[test]
fn file_fields() {
    let (_, dag) = expect_dag(
        "src = file('sub/main.c');
         base = src.basename;
         ext = src.extension;
         full = src.fullName;
         gen = src.generated;",
    );

    assert_eq!(dag.variables()["base"].as_string(), Some("main"));
    assert_eq!(dag.variables()["ext"].as_string(), Some("c"));
    assert_eq!(dag.variables()["full"].as_string(), Some("sub/main.c"));
    assert_eq!(dag.variables()["gen"].as_boolean(), Some(false));
}

#[test]
fn list_operations() {
    let (_, dag) = expect_dag(
        "both = ['a'] + ['b'];
         suffixed = ['x', 'y'] + '.c';
         prefixed = 'z' :: ['a', 'b'];",
    );

    let both = dag.variables()["both"].as_list().unwrap();
    assert_eq!(both.len(), 2);

    let suffixed = dag.variables()["suffixed"].as_list().unwrap();
    assert_eq!(suffixed[0].as_string(), Some("x.c"));
    assert_eq!(suffixed[1].as_string(), Some("y.c"));

    let prefixed = dag.variables()["prefixed"].as_list().unwrap();
    assert_eq!(prefixed.len(), 3);
    assert_eq!(prefixed[0].as_string(), Some("z"));
}

#[test]
fn records_and_field_access() {
    let (_, dag) = expect_dag(
        "flags = record { debug = true; level = 3; };
         lvl = flags.level;",
    );

    assert_eq!(dag.variables()["lvl"].as_integer(), Some(3));
    assert!(dag.variables()["flags"].as_record().is_some());
}

#[test]
fn compound_expressions_scope_locals() {
    let (_, dag) = expect_dag(
        "r = { tmp = 6; tmp * 7 };
         s = 1;",
    );

    assert_eq!(dag.variables()["r"].as_integer(), Some(42));
    assert!(!dag.variables().contains_key("tmp"));
}

#[test]
fn type_declarations_are_first_class() {
    let (_, dag) = expect_dag(
        "pair = type record[a: int, b: int];
         f = function(p: pair): int 1;
         x = f(record { a = 1; b = 2; });",
    );

    assert_eq!(dag.variables()["x"].as_integer(), Some(1));
    assert!(dag.variables()["pair"].as_type().is_some());
}

#[test]
fn builtin_reflection() {
    let (_, dag) = expect_dag(
        "s = string(42);
         t = type(3);
         n = string(file('a.c'));",
    );

    assert_eq!(dag.variables()["s"].as_string(), Some("42"));
    assert!(dag.variables()["t"].as_type().is_some());
    assert_eq!(dag.variables()["n"].as_string(), Some("a.c"));
}

#[test]
fn fields_builtin_reflects_field_names() {
    let (types, dag) = expect_dag(
        "r = record { a = 1; b = 'two'; };
         info = fields(r);",
    );

    let info = dag.variables()["info"].as_record().unwrap();
    assert_eq!(info.len(), 2);
    assert_eq!(info[0].0, "a");
    assert_eq!(info[1].0, "b");

    let a_type = info[0].1.as_type().unwrap();
    assert_eq!(types.display(a_type), "int");
}

#[test]
fn print_passes_its_value_through() {
    let (_, dag) = expect_dag("x = print(40 + 2);");
    assert_eq!(dag.variables()["x"].as_integer(), Some(42));
}

#[test]
fn build_forwards_operators_to_output() {
    let (_, dag) = expect_dag(
        "cc = action('cc ${src} ${obj}' <- src: file[in], obj: file[out]);
         o = cc(src = file('a.c'), obj = file('a.o'));
         derived = o + '.d';",
    );

    let mut files = Vec::new();
    crate::dag::collect_files(dag.targets()["derived"].value(), &mut files);
    assert_eq!(files[0].full_name(), "a.o.d");
}

#[test]
fn builds_chain_through_file_arguments() {
    let (_, dag) = expect_dag(
        "cc = action('cc -c ${src} -o ${obj}' <- src: file[in], obj: file[out]);
         ld = action('ld ${obj} -o ${bin}' <- obj: file[in], bin: file[out]);
         o = cc(src = file('a.c'), obj = file('a.o'));
         bin = ld(obj = o, bin = file('a.out'));",
    );

    assert_eq!(dag.builds().len(), 2);

    let link = &dag.builds()[1];
    assert_eq!(link.inputs()[0].full_name(), "a.o");
    assert_eq!(link.outputs()[0].full_name(), "a.out");
}

#[test]
fn explicit_empty_list_binding() {
    let (_, dag) = expect_dag("e: list[int] = [];");
    assert_eq!(dag.variables()["e"].as_list().unwrap().len(), 0);
}
