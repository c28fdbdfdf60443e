//! The evaluator: walks the AST, producing DAG values.
//!
//! Evaluation is synchronous recursion over the tree. Each top-level value
//! definition is evaluated under its name (so anonymous builder products
//! acquire canonical dotted names), bound in the current scope, and
//! registered with the builder. Any error aborts evaluation; backends
//! never see a partially-constructed DAG.

mod builtins;
mod call;
mod context;
mod expression;
mod import;
mod scope;
mod typeref;

pub use context::EvalContext;
pub use scope::{Scope, ScopeId};
pub(crate) use typeref::resolve_type;

use crate::ast::{FileAst, ValueAst};
use crate::dag::ValueRef;
use crate::error::FabError;

/// The evaluation contract implemented by every AST node.
pub trait Evaluate {
    fn evaluate(&self, ctx: &mut EvalContext) -> Result<ValueRef, FabError>;
}

/// Evaluates every top-level value in a file, in declaration order.
/// Returns the declared names, which become the DAG's top-level targets.
pub fn evaluate_file(ctx: &mut EvalContext, file: &FileAst) -> Result<Vec<String>, FabError> {
    ctx.record_source_file(file.file.path());

    let mut names = Vec::new();
    for value in &file.values {
        define_value(ctx, value)?;
        names.push(value.name.text.clone());
    }

    Ok(names)
}

/// Evaluates one `name = expr;` definition: evaluates the initializer
/// under the name, checks any explicit type, and binds the result.
pub(crate) fn define_value(ctx: &mut EvalContext, value: &ValueAst) -> Result<ValueRef, FabError> {
    ctx.with_value_name(&value.name.text, |ctx| {
        let evaluated = value.value.evaluate(ctx)?;

        if let Some(explicit) = &value.explicit_type {
            let declared = resolve_type(explicit, ctx)?;
            if !ctx.types.is_subtype(evaluated.type_id(), declared) {
                return Err(FabError::wrong_type(
                    ctx.types.display(declared),
                    ctx.types.display(evaluated.type_id()),
                    value.value.span().info(),
                ));
            }
        }

        ctx.define(&value.name, evaluated.clone())?;
        Ok(evaluated)
    })
}
