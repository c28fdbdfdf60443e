//! Fabrique build-description language compiler library.
//!
//! Fabrique reads declarative source files describing how to transform
//! input files into output files, evaluates them, and emits build graphs
//! consumable by downstream executors (Ninja, make, Graphviz DOT, shell).
//!
//! # Overview
//!
//! The pipeline has two stages:
//!
//! 1. **Parsing**: convert source text into an Abstract Syntax Tree (AST)
//! 2. **Evaluation**: walk the AST, producing a typed, acyclic build graph
//!    (DAG) of files, builds, rules, variables and targets
//!
//! Backends then render the DAG through its fixed query interface.
//!
//! # Architecture
//!
//! - [`parser`]: nom grammar for the Fabrique language
//! - [`ast`]: AST definitions and pretty-printing
//! - [`types`]: the canonicalising type context and subtype lattice
//! - [`dag`]: runtime values, the graph builder and the final DAG
//! - [`eval`]: the lexically-scoped tree-walking evaluator
//! - [`plugin`]: host plugins reachable through `import()`
//! - [`backend`]: Ninja / DOT / make / shell emitters
//! - [`error`]: diagnostics with labelled source spans
//!
//! # Usage
//!
//! ```ignore
//! use libfabrique::{parse_source, evaluate, EvalOptions};
//! use libfabrique::file::SourceFile;
//! use libfabrique::nom_tools::State;
//! use libfabrique::types::TypeContext;
//!
//! let state = State::new(SourceFile::new("fabfile", "x = 1 + 2;"));
//! let ast = parse_source(&state)?;
//!
//! let mut types = TypeContext::new();
//! let dag = evaluate(&ast, &mut types, EvalOptions::default())?;
//! ```

use nom::Finish;

use ast::FileAst;
use dag::{Dag, ValueMap};
use error::FabError;
use eval::EvalContext;
use nom_tools::State;
use plugin::{NullLoader, PluginLoader, PluginRegistry};
use types::TypeContext;

pub mod ast;
pub mod backend;
pub mod dag;
pub mod error;
pub mod eval;
pub mod file;
pub mod map;
pub mod nom_tools;
pub mod parser;
pub mod platform;
pub mod plugin;
pub mod types;

#[cfg(test)]
mod tests;

/// Parses Fabrique source code into an AST.
///
/// # Errors
///
/// Returns [`FabError::SyntaxError`] with one labelled item per parse
/// failure context.
pub fn parse_source(state: &State) -> Result<FileAst, FabError> {
    let response = parser::parse(state).finish();
    error::handle_parser(response)
}

/// The build-file regeneration step: re-running `command` regenerates
/// `outputs` from the Fabrique sources read during evaluation.
#[derive(Debug, Clone, Default)]
pub struct Regeneration {
    pub command: String,
    pub outputs: Vec<String>,
}

/// Host-side inputs to an evaluation.
pub struct EvalOptions {
    /// Absolute path to the source root
    pub srcroot: String,
    /// Path to the output root
    pub buildroot: String,
    /// Command-line definitions, exposed as the `args` record
    pub arguments: ValueMap,
    pub plugins: PluginRegistry,
    pub loader: Box<dyn PluginLoader>,
    pub regeneration: Option<Regeneration>,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            srcroot: ".".to_string(),
            buildroot: ".".to_string(),
            arguments: ValueMap::new(),
            plugins: PluginRegistry::new(),
            loader: Box::new(NullLoader),
            regeneration: None,
        }
    }
}

/// Evaluates a parsed file into an immutable build graph.
///
/// The type context must outlive the DAG; a fresh one per compilation is
/// the common case.
///
/// # Errors
///
/// Any semantic or type error aborts evaluation; no partial DAG is ever
/// returned.
pub fn evaluate(
    file: &FileAst,
    types: &mut TypeContext,
    options: EvalOptions,
) -> Result<Dag, FabError> {
    let mut ctx = EvalContext::new(types, options.srcroot, &options.buildroot, options.arguments)?
        .with_plugins(options.plugins)
        .with_loader(options.loader);

    let top_level = eval::evaluate_file(&mut ctx, file)?;

    if let Some(regeneration) = &options.regeneration {
        ctx.add_regeneration(&regeneration.command, &regeneration.outputs)?;
    }

    ctx.finish(&top_level)
}
