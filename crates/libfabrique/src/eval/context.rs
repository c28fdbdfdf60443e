//! The evaluation context: scope stack, name resolution and builder access.

use log::debug;

use crate::dag::{Dag, DagBuilder, ValueMap, ValueRef};
use crate::error::FabError;
use crate::nom_tools::{Span, SpanInfo};
use crate::plugin::{NullLoader, PluginLoader, PluginRegistry};
use crate::types::TypeContext;

use super::builtins;
use super::scope::{Scope, ScopeId};

/// Everything needed to evaluate a parsed file into a build graph.
///
/// Owns the scope arena and the [`DagBuilder`]; borrows the
/// [`TypeContext`], which outlives the DAG it helps build. Builtins are
/// injected at construction: function builtins live in a separate map
/// consulted before the scope chain, while data builtins (`args`,
/// `srcroot`, `buildroot`, `subdir`) are ordinary bindings in the
/// top-level scope so that submodule evaluation can shadow them.
pub struct EvalContext<'ctx> {
    pub(crate) types: &'ctx mut TypeContext,
    pub(crate) builder: DagBuilder,
    scopes: Vec<Scope>,
    stack: Vec<ScopeId>,
    value_names: Vec<String>,
    builtins: ValueMap,
    pub(crate) plugins: PluginRegistry,
    pub(crate) loader: Box<dyn PluginLoader>,
    pub(crate) srcroot: String,
    /// Every Fabrique file read so far: the root file plus every import.
    pub(crate) source_files: Vec<String>,
}

impl<'ctx> EvalContext<'ctx> {
    /// Creates a context with the standard builtins and the given
    /// command-line argument record.
    pub fn new(
        types: &'ctx mut TypeContext,
        srcroot: impl Into<String>,
        buildroot: &str,
        arguments: ValueMap,
    ) -> Result<Self, FabError> {
        let srcroot = srcroot.into();

        let mut ctx = Self {
            builtins: builtins::function_builtins(types),
            types,
            builder: DagBuilder::new(),
            scopes: vec![Scope::new("top".to_string(), None)],
            stack: vec![ScopeId(0)],
            value_names: Vec::new(),
            plugins: PluginRegistry::new(),
            loader: Box::new(NullLoader),
            srcroot: srcroot.clone(),
            source_files: Vec::new(),
        };

        let nowhere = SpanInfo::none();
        let args = ctx
            .builder
            .record(ctx.types, arguments.into_iter().collect(), nowhere.clone());
        let srcroot_file =
            ctx.builder
                .file(ctx.types, &srcroot, ValueMap::new(), nowhere.clone(), false)?;
        let buildroot_file =
            ctx.builder
                .file(ctx.types, buildroot, ValueMap::new(), nowhere.clone(), true)?;
        let subdir_file = ctx
            .builder
            .file(ctx.types, "", ValueMap::new(), nowhere, false)?;

        ctx.define_local("args", args)?;
        ctx.define_local("srcroot", srcroot_file)?;
        ctx.define_local("buildroot", buildroot_file)?;
        ctx.define_local("subdir", subdir_file)?;

        Ok(ctx)
    }

    pub fn with_plugins(mut self, plugins: PluginRegistry) -> Self {
        self.plugins = plugins;
        self
    }

    pub fn with_loader(mut self, loader: Box<dyn PluginLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Injects an extra builtin, shadowing none of the scope chain.
    pub fn define_builtin(&mut self, name: impl Into<String>, value: ValueRef) {
        self.builtins.insert(name.into(), value);
    }

    pub fn types(&mut self) -> &mut TypeContext {
        self.types
    }

    pub fn builder(&mut self) -> &mut DagBuilder {
        &mut self.builder
    }

    /// The scope currently on top of the stack.
    pub(crate) fn current_scope(&self) -> ScopeId {
        *self
            .stack
            .last()
            .expect("evaluation context has no scopes")
    }

    pub(crate) fn scope_bindings(&self, id: ScopeId) -> Vec<(String, ValueRef)> {
        self.scopes[id.0]
            .bindings()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Runs `f` inside a fresh scope, popping it on every exit path. The
    /// parent is the current stack top unless an explicit capture is
    /// given (function calls resolve against their definition site).
    pub(crate) fn with_scope<T>(
        &mut self,
        name: &str,
        parent: Option<ScopeId>,
        f: impl FnOnce(&mut Self) -> Result<T, FabError>,
    ) -> Result<(T, ScopeId), FabError> {
        let parent = parent.or_else(|| self.stack.last().copied());
        let id = ScopeId(self.scopes.len());

        debug!("entering scope {} '{name}'", id.0);
        self.scopes.push(Scope::new(name.to_string(), parent));
        self.stack.push(id);

        let result = f(self);

        self.stack.pop();
        debug!("left scope {} '{name}'", id.0);

        result.map(|value| (value, id))
    }

    /// Runs `f` with `name` pushed onto the fully-qualified-name stack,
    /// popping on every exit path. Builder products created inside (rules,
    /// targets) acquire canonical dotted names this way.
    pub(crate) fn with_value_name<T>(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut Self) -> Result<T, FabError>,
    ) -> Result<T, FabError> {
        self.value_names.push(name.to_string());
        let result = f(self);
        self.value_names.pop();
        result
    }

    /// The dotted name of the value currently being evaluated.
    pub(crate) fn fully_qualified_name(&self) -> String {
        self.value_names.join(".")
    }

    /// Binds a name in the current scope and registers the value with the
    /// builder under its fully-qualified name. Duplicate bindings in one
    /// scope are fatal.
    pub(crate) fn define(&mut self, name: &Span, value: ValueRef) -> Result<(), FabError> {
        let scope = self.current_scope();
        debug!("defining '{}' in scope {}", name.text, scope.0);

        self.scopes[scope.0].define(name.text.clone(), value.clone())?;

        let qualified = self.fully_qualified_name();
        self.builder.define(qualified, value, self.types);
        Ok(())
    }

    /// Binds a name in the current scope without registering it in the
    /// builder: loop variables, function parameters, reserved import
    /// names.
    pub(crate) fn define_local(
        &mut self,
        name: impl Into<String>,
        value: ValueRef,
    ) -> Result<(), FabError> {
        let scope = self.current_scope();
        self.scopes[scope.0].define(name.into(), value)
    }

    /// Resolves a name: builtins first, then the scope chain bottom-up.
    /// The pseudo-names `builddir` and `subdir` fall back to default
    /// files when undefined.
    pub(crate) fn lookup(&mut self, name: &str, src: &SpanInfo) -> Result<ValueRef, FabError> {
        debug!("lookup '{name}'");

        if let Some(value) = self.builtins.get(name) {
            return Ok(value.clone());
        }

        let mut scope = self.stack.last().copied();
        while let Some(id) = scope {
            let current = &self.scopes[id.0];
            if let Some(value) = current.get(name) {
                return Ok(value.clone());
            }
            scope = current.parent();
        }

        // The top-level build/source subdirectory is ''.
        if name == "builddir" {
            return self
                .builder
                .file(self.types, "", ValueMap::new(), SpanInfo::none(), true);
        }

        if name == "subdir" {
            return self
                .builder
                .file(self.types, "", ValueMap::new(), SpanInfo::none(), false);
        }

        Err(FabError::undefined_name(name, src.clone()))
    }

    /// Records a Fabrique source file as part of this evaluation, for the
    /// regeneration step.
    pub(crate) fn record_source_file(&mut self, path: &str) {
        if !self.source_files.iter().any(|f| f == path) {
            self.source_files.push(path.to_string());
        }
    }

    /// Adds the build-file regeneration rule and build: re-running
    /// `command` regenerates `outputs` from the Fabrique files read during
    /// this evaluation.
    pub fn add_regeneration(
        &mut self,
        command: &str,
        outputs: &[String],
    ) -> Result<(), FabError> {
        let inputs = self.source_files.clone();
        self.builder
            .add_regeneration(self.types, command, &inputs, outputs)?;
        Ok(())
    }

    /// Finishes evaluation, producing the immutable DAG.
    pub fn finish(self, top_level_targets: &[String]) -> Result<Dag, FabError> {
        self.builder.dag(top_level_targets, self.types)
    }
}
