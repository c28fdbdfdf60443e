//! Resolution of type syntax against the type context.
//!
//! Reserved type names (`int`, `file`, `list`, ...) resolve directly;
//! other names must be bound to first-class type values in the enclosing
//! scopes.

use crate::ast::TypeAst;
use crate::error::FabError;
use crate::types::TypeId;

use super::context::EvalContext;

static RESERVED_TYPE_NAMES: &[&str] = &[
    "nil", "bool", "int", "string", "file", "list", "type", "in", "out",
];

pub(crate) fn resolve_type(ast: &TypeAst, ctx: &mut EvalContext) -> Result<TypeId, FabError> {
    match ast {
        TypeAst::Named { name, params } => {
            let resolved_params = params
                .iter()
                .map(|param| resolve_type(param, ctx))
                .collect::<Result<Vec<_>, _>>()?;

            if RESERVED_TYPE_NAMES.contains(&name.text.as_str()) {
                if resolved_params.is_empty() {
                    let found = ctx.types.find(&name.text, &[]);
                    debug_assert!(found.valid() || name.text == "nil");
                    return Ok(found);
                }

                return ctx
                    .types
                    .parameterise(&name.text, &resolved_params, &name.info());
            }

            // Other type names must be user-defined type values.
            let value = ctx.lookup(&name.text, &name.info())?;
            match value.as_type() {
                Some(typ) if resolved_params.is_empty() => Ok(typ),
                Some(_) => Err(FabError::semantic(
                    format!("'{}' cannot take type parameters", name.text),
                    name.info(),
                )),
                None => Err(FabError::wrong_type(
                    "type",
                    ctx.types.display(value.type_id()),
                    name.info(),
                )),
            }
        }

        TypeAst::Function { params, result, .. } => {
            let params = params
                .iter()
                .map(|param| resolve_type(param, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            let result = resolve_type(result, ctx)?;
            Ok(ctx.types.function_type(params, result))
        }

        TypeAst::Record { fields, .. } => {
            let fields = fields
                .iter()
                .map(|(name, t)| Ok((name.text.clone(), resolve_type(t, ctx)?)))
                .collect::<Result<Vec<_>, FabError>>()?;
            Ok(ctx.types.record_type(fields))
        }
    }
}
