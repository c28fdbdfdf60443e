//! Submodule and plugin resolution through `import()`.

use std::path::PathBuf;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use crate::dag::{DagBuilder, Value, ValueMap, ValueRef};
use crate::error::FabError;
use crate::nom_tools::SpanInfo;
use crate::plugin::{Plugin, PluginRegistry};
use crate::types::TypeContext;
use crate::EvalOptions;

use super::evaluate_with_options;

/// Creates a scratch directory tree for import tests; callers clean up.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fabrique-test-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

#[test]
fn import_evaluates_a_submodule() {
    let dir = scratch_dir("submodule");
    std::fs::write(dir.join("lib.fab"), "answer = 42;\nname = 'lib';\n").unwrap();

    let options = EvalOptions {
        srcroot: dir.to_string_lossy().to_string(),
        ..EvalOptions::default()
    };

    let (_, dag) = evaluate_with_options(
        "m = import('lib.fab');
         a = m.answer;",
        options,
    )
    .expect("import failed");

    assert_eq!(dag.variables()["a"].as_integer(), Some(42));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn import_directory_uses_its_fabfile() {
    let dir = scratch_dir("fabfile");
    std::fs::create_dir_all(dir.join("sub")).unwrap();
    std::fs::write(dir.join("sub/fabfile"), "exported = 'from sub';\n").unwrap();

    let options = EvalOptions {
        srcroot: dir.to_string_lossy().to_string(),
        ..EvalOptions::default()
    };

    let (_, dag) = evaluate_with_options(
        "m = import('sub');
         x = m.exported;",
        options,
    )
    .expect("import failed");

    assert_eq!(dag.variables()["x"].as_string(), Some("from sub"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn import_arguments_become_the_args_record() {
    let dir = scratch_dir("args");
    std::fs::write(dir.join("conf.fab"), "level = args.level;\n").unwrap();

    let options = EvalOptions {
        srcroot: dir.to_string_lossy().to_string(),
        ..EvalOptions::default()
    };

    let (_, dag) = evaluate_with_options(
        "m = import('conf.fab', level = 3);
         l = m.level;",
        options,
    )
    .expect("import failed");

    assert_eq!(dag.variables()["l"].as_integer(), Some(3));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn subdir_is_threaded_through_imports() {
    let dir = scratch_dir("subdir");
    std::fs::create_dir_all(dir.join("sub")).unwrap();
    std::fs::write(dir.join("sub/fabfile"), "src = file('a.c');\n").unwrap();

    let options = EvalOptions {
        srcroot: dir.to_string_lossy().to_string(),
        ..EvalOptions::default()
    };

    let (_, dag) = evaluate_with_options("m = import('sub');", options).expect("import failed");

    // The submodule's file lands in its own subdirectory.
    let names: Vec<String> = dag.files().iter().map(|f| f.full_name()).collect();
    assert!(names.contains(&"sub/a.c".to_string()), "{names:?}");

    std::fs::remove_dir_all(&dir).ok();
}

#[derive(Debug)]
struct VersionPlugin;

impl Plugin for VersionPlugin {
    fn name(&self) -> &str {
        "version"
    }

    fn create(
        &self,
        builder: &mut DagBuilder,
        types: &mut TypeContext,
        arguments: ValueMap,
        source: &SpanInfo,
    ) -> Result<ValueRef, FabError> {
        let major: i64 = arguments
            .get("major")
            .and_then(|v| v.as_integer())
            .unwrap_or(1);

        let fields = vec![
            (
                "major".to_string(),
                Value::integer(major, types, source.clone()),
            ),
            (
                "name".to_string(),
                Value::string("fabrique", types, source.clone()),
            ),
        ];

        Ok(builder.record(types, fields, source.clone()))
    }
}

#[test]
fn plugins_resolve_by_name() {
    let mut plugins = PluginRegistry::new();
    plugins.register(Rc::new(VersionPlugin));

    let options = EvalOptions {
        plugins,
        ..EvalOptions::default()
    };

    let (_, dag) = evaluate_with_options(
        "v = import('version', major = 2);
         m = v.major;
         n = v.name;",
        options,
    )
    .expect("plugin import failed");

    assert_eq!(dag.variables()["m"].as_integer(), Some(2));
    assert_eq!(dag.variables()["n"].as_string(), Some("fabrique"));
}

#[derive(Debug)]
struct BrokenPlugin;

impl Plugin for BrokenPlugin {
    fn name(&self) -> &str {
        "broken"
    }

    fn create(
        &self,
        _builder: &mut DagBuilder,
        types: &mut TypeContext,
        _arguments: ValueMap,
        source: &SpanInfo,
    ) -> Result<ValueRef, FabError> {
        // Contract violation: plugins must return records.
        Ok(Value::integer(3, types, source.clone()))
    }
}

#[test]
fn plugins_must_return_records() {
    let mut plugins = PluginRegistry::new();
    plugins.register(Rc::new(BrokenPlugin));

    let options = EvalOptions {
        plugins,
        ..EvalOptions::default()
    };

    let result = evaluate_with_options("v = import('broken');", options);
    assert!(matches!(result, Err(FabError::PluginFailure(_))));
}
