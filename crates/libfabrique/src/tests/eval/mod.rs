//! Evaluation tests: end-to-end scenarios, error reporting and graph
//! invariants.

mod demo_files;
mod error_handling;
mod imports;
mod properties;
mod scenarios;

use crate::dag::Dag;
use crate::error::FabError;
use crate::file::SourceFile;
use crate::nom_tools::State;
use crate::types::TypeContext;
use crate::{evaluate, parse_source, EvalOptions};

/// Parses and evaluates a program with default options.
pub(crate) fn evaluate_source(code: &str) -> Result<(TypeContext, Dag), FabError> {
    evaluate_with_options(code, EvalOptions::default())
}

pub(crate) fn evaluate_with_options(
    code: &str,
    options: EvalOptions,
) -> Result<(TypeContext, Dag), FabError> {
    let state = State::new(SourceFile::new("test.fab", code));
    let ast = parse_source(&state)?;

    let mut types = TypeContext::new();
    let dag = evaluate(&ast, &mut types, options)?;
    Ok((types, dag))
}

/// Shorthand asserting that evaluation succeeds.
pub(crate) fn expect_dag(code: &str) -> (TypeContext, Dag) {
    match evaluate_source(code) {
        Ok(result) => result,
        Err(error) => panic!("evaluation failed: {error}"),
    }
}

/// Shorthand asserting that evaluation fails.
pub(crate) fn expect_error(code: &str) -> FabError {
    match evaluate_source(code) {
        Ok(_) => panic!("expected an error evaluating:\n{code}"),
        Err(error) => error,
    }
}
