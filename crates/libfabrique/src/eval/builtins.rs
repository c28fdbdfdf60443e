//! The builtin functions injected into every evaluation.

use std::rc::Rc;

use crate::dag::{Builtin, Function, FunctionBody, Parameter, Value, ValueData, ValueMap, ValueRef};
use crate::error::FabError;
use crate::nom_tools::SpanInfo;
use crate::types::{TypeContext, TypeId};

use super::context::EvalContext;

fn builtin_function(
    types: &mut TypeContext,
    parameters: Vec<Parameter>,
    result: TypeId,
    builtin: Builtin,
    allow_extra_args: bool,
) -> ValueRef {
    let param_types = parameters.iter().map(|p| p.typ).collect();
    let typ = types.function_type(param_types, result);

    let function = Function::new(
        parameters,
        result,
        FunctionBody::Builtin(builtin),
        None,
        allow_extra_args,
        SpanInfo::none(),
    );

    Value::new(
        ValueData::Function(Rc::new(function)),
        typ,
        SpanInfo::none(),
    )
}

/// The standard function builtins: `file`, `import`, `print`, `fields`,
/// `type` and `string`.
pub(crate) fn function_builtins(types: &mut TypeContext) -> ValueMap {
    let string = types.string_type();
    let file = types.file_type();
    let nil = types.nil_type();
    let type_type = types.type_type();

    let mut builtins = ValueMap::new();

    // file() and import() forward unrecognised keywords: file attributes
    // and module arguments respectively.
    builtins.insert(
        "file".to_string(),
        builtin_function(
            types,
            vec![Parameter::new("name", string, None)],
            file,
            Builtin::OpenFile,
            true,
        ),
    );

    builtins.insert(
        "import".to_string(),
        builtin_function(
            types,
            vec![Parameter::new("module", string, None)],
            nil,
            Builtin::Import,
            true,
        ),
    );

    builtins.insert(
        "print".to_string(),
        builtin_function(
            types,
            vec![Parameter::new("value", nil, None)],
            nil,
            Builtin::Print,
            true,
        ),
    );

    builtins.insert(
        "fields".to_string(),
        builtin_function(
            types,
            vec![Parameter::new("value", nil, None)],
            nil,
            Builtin::Fields,
            false,
        ),
    );

    builtins.insert(
        "type".to_string(),
        builtin_function(
            types,
            vec![Parameter::new("value", nil, None)],
            type_type,
            Builtin::TypeOf,
            false,
        ),
    );

    builtins.insert(
        "string".to_string(),
        builtin_function(
            types,
            vec![Parameter::new("value", nil, None)],
            string,
            Builtin::Stringify,
            false,
        ),
    );

    builtins
}

fn required<'m>(
    arguments: &'m ValueMap,
    name: &str,
    src: &SpanInfo,
) -> Result<&'m ValueRef, FabError> {
    arguments
        .get(name)
        .ok_or_else(|| FabError::missing_argument(name, src.clone()))
}

/// Dispatches a builtin call. `import` is handled separately because it
/// re-enters the evaluator.
pub(crate) fn call_builtin(
    ctx: &mut EvalContext,
    builtin: Builtin,
    mut arguments: ValueMap,
    src: SpanInfo,
) -> Result<ValueRef, FabError> {
    match builtin {
        Builtin::OpenFile => {
            let name = required(&arguments, "name", &src)?;
            let Some(name) = name.as_string().map(str::to_string) else {
                return Err(FabError::semantic("missing 'name' in file() call", src));
            };

            arguments.shift_remove("name");
            let subdir = match arguments.shift_remove("subdir") {
                Some(subdir) => subdir.render_plain(),
                None => String::new(),
            };

            // Remaining keyword arguments become file attributes.
            ctx.builder
                .file_in_subdir(ctx.types, &subdir, &name, arguments, src, false)
        }

        Builtin::Print => {
            let value = required(&arguments, "value", &src)?;
            println!("{}", value.render(ctx.types));
            Ok(value.clone())
        }

        Builtin::Fields => {
            let value = required(&arguments, "value", &src)?;
            let fields = ctx.types.fields(value.type_id()).unwrap_or_default();

            let references = fields
                .into_iter()
                .map(|(name, typ)| (name, Value::type_reference(typ, ctx.types, src.clone())))
                .collect();

            Ok(ctx.builder.record(ctx.types, references, src))
        }

        Builtin::TypeOf => {
            let value = required(&arguments, "value", &src)?;
            Ok(Value::type_reference(value.type_id(), ctx.types, src.clone()))
        }

        Builtin::Stringify => {
            let value = required(&arguments, "value", &src)?;
            let rendered = value.render(ctx.types);
            Ok(Value::string(rendered, ctx.types, src))
        }

        Builtin::Import => unreachable!("import is dispatched by the call evaluator"),
    }
}
