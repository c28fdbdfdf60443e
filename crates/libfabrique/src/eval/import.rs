//! Module and plugin resolution for `import()`.
//!
//! A module name resolves, in order, to: an absolute path to a Fabrique
//! file; a path relative to the source root joined with the current
//! subdirectory; a directory containing a `fabfile`; a registered plugin;
//! a plugin found by the dynamic loader. Submodules evaluate under a fresh
//! scope that reserves `args`, `builddir` and `subdir`, and their
//! top-level bindings come back as a record.

use std::path::Path;

use log::debug;

use crate::dag::{ValueMap, ValueRef};
use crate::error::FabError;
use crate::file::SourceFile;
use crate::nom_tools::{SpanInfo, State};
use crate::platform;

use super::context::EvalContext;
use super::define_value;

pub(crate) fn resolve(
    ctx: &mut EvalContext,
    mut arguments: ValueMap,
    src: SpanInfo,
) -> Result<ValueRef, FabError> {
    let Some(module) = arguments.shift_remove("module") else {
        return Err(FabError::missing_argument("module", src));
    };
    let Some(name) = module.as_string().map(str::to_string) else {
        return Err(FabError::semantic("missing module or file name", src));
    };

    let Some(current_subdir) = arguments.shift_remove("subdir") else {
        return Err(FabError::semantic("missing subdir", src));
    };
    let current_subdir = current_subdir.render_plain();

    debug!("importing '{name}' from subdir '{current_subdir}'");

    let filename = if platform::path_is_absolute(&name) {
        name.clone()
    } else {
        platform::join_paths([
            ctx.srcroot.as_str(),
            current_subdir.as_str(),
            name.as_str(),
        ])
    };

    if Path::new(&filename).is_file() {
        let subdir = platform::join_path(&current_subdir, &platform::directory_of(&name));
        return import_file(ctx, &filename, &subdir, arguments, src);
    }

    if Path::new(&filename).is_dir() {
        let fabfile = platform::join_path(&filename, "fabfile");
        if !Path::new(&fabfile).is_file() {
            return Err(FabError::os_error(
                format!("directory '{filename}' does not contain 'fabfile'"),
                src,
            ));
        }

        let subdir = platform::join_path(&current_subdir, &name);
        return import_file(ctx, &fabfile, &subdir, arguments, src);
    }

    let plugin = ctx
        .plugins
        .lookup(&name)
        .or_else(|| ctx.loader.load(&name));

    if let Some(plugin) = plugin {
        debug!("instantiating plugin '{name}'");
        let record = plugin.create(&mut ctx.builder, ctx.types, arguments, &src)?;

        // Plugins must return a record whose type describes their members.
        if record.as_record().is_none() {
            return Err(FabError::plugin_failure(
                &name,
                "plugin did not return a record",
                src,
            ));
        }

        return Ok(record);
    }

    Err(FabError::import_not_found(name, src))
}

/// Parses and evaluates a Fabrique submodule, returning its top-level
/// bindings as a record.
fn import_file(
    ctx: &mut EvalContext,
    filename: &str,
    subdir: &str,
    arguments: ValueMap,
    src: SpanInfo,
) -> Result<ValueRef, FabError> {
    debug!("importing file '{filename}' (subdir '{subdir}')");

    let content = std::fs::read_to_string(filename)
        .map_err(|error| FabError::os_error(format!("failed to open '{filename}': {error}"), src.clone()))?;

    ctx.record_source_file(filename);

    let state = State::new(SourceFile::new(filename, content));
    let ast = crate::parse_source(&state)?;

    let subdir_file =
        ctx.builder
            .file(ctx.types, subdir, ValueMap::new(), src.clone(), false)?;
    let args_record = ctx
        .builder
        .record(ctx.types, arguments.into_iter().collect(), src.clone());

    let ((), scope) = ctx.with_scope(filename, None, |ctx| {
        ctx.define_local("args", args_record)?;
        ctx.define_local("builddir", subdir_file.clone())?;
        ctx.define_local("subdir", subdir_file)?;

        for value in &ast.values {
            define_value(ctx, value)?;
        }

        Ok(())
    })?;

    let bindings = ctx.scope_bindings(scope);

    // Reserved names are implementation detail, not module exports.
    let exports = bindings
        .into_iter()
        .filter(|(name, _)| !matches!(name.as_str(), "args" | "builddir" | "subdir"))
        .collect();

    Ok(ctx.builder.record(ctx.types, exports, src))
}
