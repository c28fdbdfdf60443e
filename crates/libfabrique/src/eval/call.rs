//! Call evaluation: argument naming, checking and invocation.

use indexmap::IndexMap;

use crate::ast::{CallAst, ExpressionAst};
use crate::dag::{Callable, FunctionBody, ValueMap, ValueRef};
use crate::error::FabError;
use crate::nom_tools::SpanInfo;

use super::context::EvalContext;
use super::{builtins, import, Evaluate};

/// Evaluates a call: the target must be callable, arguments are named
/// positionally then by keyword, checked against the signature, and the
/// callable is invoked.
pub(crate) fn evaluate_call(call: &CallAst, ctx: &mut EvalContext) -> Result<ValueRef, FabError> {
    let target = call.target.evaluate(ctx)?;
    let Some(callable) = target.as_callable() else {
        return Err(FabError::not_callable(
            ctx.types.display(target.type_id()),
            call.target.span().info(),
        ));
    };

    let named = callable.name_arguments(&call.arguments)?;

    let mut arguments = ValueMap::new();
    let mut locations: IndexMap<String, SpanInfo> = IndexMap::new();
    for (name, expression) in named {
        let value = expression.evaluate(ctx)?;
        locations.insert(name.clone(), expression.span().info());
        arguments.insert(name, value);
    }

    // Calls to the builtins `file` and `import` implicitly receive the
    // current `subdir` unless one was passed explicitly.
    if let ExpressionAst::Name(name) = &call.target {
        if let [only] = name.components.as_slice() {
            if (only.text == "file" || only.text == "import")
                && !arguments.contains_key("subdir")
            {
                let subdir = ctx.lookup("subdir", &call.span.info())?;
                locations.insert("subdir".to_string(), call.span.info());
                arguments.insert("subdir".to_string(), subdir);
            }
        }
    }

    callable.check_arguments(&mut arguments, &locations, ctx.types, &call.span.info())?;

    invoke(&callable, arguments, ctx, call.span.info())
}

/// Invokes a checked callable: rules construct builds; functions run their
/// builtin, native or closure body.
pub(crate) fn invoke(
    callable: &Callable,
    arguments: ValueMap,
    ctx: &mut EvalContext,
    src: SpanInfo,
) -> Result<ValueRef, FabError> {
    match callable {
        Callable::Rule(rule) => ctx.builder.build(rule.clone(), arguments, ctx.types, src),

        Callable::Function(function) => match function.body().clone() {
            FunctionBody::Builtin(crate::dag::Builtin::Import) => {
                import::resolve(ctx, arguments, src)
            }

            FunctionBody::Builtin(builtin) => builtins::call_builtin(ctx, builtin, arguments, src),

            FunctionBody::Native(native) => {
                native.call(arguments, &mut ctx.builder, ctx.types, &src)
            }

            // A closure: run the body in a fresh scope whose parent is the
            // captured definition-site scope, with the parameters bound.
            FunctionBody::Expression(ast) => {
                let (result, _) = ctx.with_scope("function call", function.captured_scope(), |ctx| {
                    for parameter in function.parameters() {
                        let value = arguments
                            .get(&parameter.name)
                            .expect("checked arguments are complete")
                            .clone();
                        ctx.define_local(parameter.name.clone(), value)?;
                    }

                    ast.body.evaluate(ctx)
                })?;

                if !ctx.types.is_subtype(result.type_id(), function.result_type()) {
                    return Err(FabError::wrong_type(
                        ctx.types.display(function.result_type()),
                        ctx.types.display(result.type_id()),
                        ast.body.span().info(),
                    ));
                }

                Ok(result)
            }
        },
    }
}
