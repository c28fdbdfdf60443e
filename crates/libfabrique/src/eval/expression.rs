//! `Evaluate` implementations for every expression node.

use std::rc::Rc;

use crate::ast::{
    ActionAst, BinaryAst, BinaryOperator, ConditionalAst, ExpressionAst, FileListAst, ForeachAst,
    FunctionAst, ListAst, NameReferenceAst, ParameterAst, RecordAst, UnaryAst, UnaryOperator,
};
use crate::dag::{Function, FunctionBody, Parameter, Value, ValueData, ValueMap, ValueRef};
use crate::error::FabError;
use crate::platform;

use super::call::evaluate_call;
use super::context::EvalContext;
use super::typeref::resolve_type;
use super::{define_value, Evaluate};

impl Evaluate for ExpressionAst {
    fn evaluate(&self, ctx: &mut EvalContext) -> Result<ValueRef, FabError> {
        match self {
            ExpressionAst::Boolean { value, span } => {
                Ok(Value::boolean(*value, ctx.types, span.info()))
            }
            ExpressionAst::Integer { value, span } => {
                Ok(Value::integer(*value, ctx.types, span.info()))
            }
            ExpressionAst::Str { value, span } => {
                Ok(Value::string(value.clone(), ctx.types, span.info()))
            }
            ExpressionAst::Name(name) => evaluate_name(name, ctx),
            ExpressionAst::Binary(op) => evaluate_binary(op, ctx),
            ExpressionAst::Unary(op) => evaluate_unary(op, ctx),
            ExpressionAst::Call(call) => evaluate_call(call, ctx),
            ExpressionAst::Conditional(conditional) => evaluate_conditional(conditional, ctx),
            ExpressionAst::Foreach(foreach) => evaluate_foreach(foreach, ctx),
            ExpressionAst::List(list) => evaluate_list(list, ctx),
            ExpressionAst::Record(record) => evaluate_record(record, ctx),
            ExpressionAst::Function(function) => evaluate_function_literal(function, ctx),
            ExpressionAst::Action(action) => evaluate_action(action, ctx),
            ExpressionAst::FileList(files) => evaluate_file_list(files, ctx),
            ExpressionAst::Compound(compound) => ctx
                .with_scope("compound", None, |ctx| {
                    for value in &compound.values {
                        define_value(ctx, value)?;
                    }
                    compound.result.evaluate(ctx)
                })
                .map(|(value, _)| value),
            ExpressionAst::TypeDeclaration(declaration) => {
                let typ = resolve_type(&declaration.declared, ctx)?;
                Ok(Value::type_reference(typ, ctx.types, declaration.span.info()))
            }
        }
    }
}

/// A dotted reference: look up the first component, then project fields.
fn evaluate_name(name: &NameReferenceAst, ctx: &mut EvalContext) -> Result<ValueRef, FabError> {
    let first = &name.components[0];
    let mut value = ctx.lookup(&first.text, &first.info())?;

    for component in &name.components[1..] {
        match Value::field(&value, &component.text, ctx.types, &component.info())? {
            Some(projected) => value = projected,
            None => {
                return Err(FabError::no_such_field(
                    &component.text,
                    ctx.types.display(value.type_id()),
                    component.info(),
                ));
            }
        }
    }

    Ok(value)
}

fn evaluate_binary(op: &BinaryAst, ctx: &mut EvalContext) -> Result<ValueRef, FabError> {
    let lhs = op.lhs.evaluate(ctx)?;
    let rhs = op.rhs.evaluate(ctx)?;
    let src = op.span.info();

    match op.op {
        BinaryOperator::Add => Value::add(&lhs, &rhs, ctx.types, &src),
        BinaryOperator::Prefix => Value::prefix_with(&rhs, &lhs, ctx.types, &src),
        BinaryOperator::Subtract => Value::subtract(&lhs, &rhs, ctx.types, &src),
        BinaryOperator::Multiply => Value::multiply_by(&lhs, &rhs, ctx.types, &src),
        BinaryOperator::Divide => Value::divide_by(&lhs, &rhs, ctx.types, &src),
        BinaryOperator::Equal => Value::equals(&lhs, &rhs, ctx.types, &src),
        BinaryOperator::NotEqual => {
            let equal = Value::equals(&lhs, &rhs, ctx.types, &src)?;
            Value::logical_not(&equal, ctx.types, &src)
        }
        BinaryOperator::And => Value::and(&lhs, &rhs, ctx.types, &src),
        BinaryOperator::Or => Value::or(&lhs, &rhs, ctx.types, &src),
        BinaryOperator::Xor => Value::xor(&lhs, &rhs, ctx.types, &src),
    }
}

fn evaluate_unary(op: &UnaryAst, ctx: &mut EvalContext) -> Result<ValueRef, FabError> {
    let operand = op.operand.evaluate(ctx)?;
    let src = op.span.info();

    match op.op {
        UnaryOperator::Negate => Value::negate(&operand, ctx.types, &src),
        UnaryOperator::Not => Value::logical_not(&operand, ctx.types, &src),
    }
}

/// Evaluates the condition (which must be boolean) and then exactly one
/// branch.
fn evaluate_conditional(
    conditional: &ConditionalAst,
    ctx: &mut EvalContext,
) -> Result<ValueRef, FabError> {
    let condition = conditional.condition.evaluate(ctx)?;
    let Some(taken) = condition.as_boolean() else {
        return Err(FabError::wrong_type(
            "bool",
            ctx.types.display(condition.type_id()),
            conditional.condition.span().info(),
        ));
    };

    if taken {
        conditional.then_branch.evaluate(ctx)
    } else {
        conditional.else_branch.evaluate(ctx)
    }
}

/// Iterates over an ordered sequence, evaluating the body in a fresh child
/// scope that binds the loop variable; the results form a list.
fn evaluate_foreach(foreach: &ForeachAst, ctx: &mut EvalContext) -> Result<ValueRef, FabError> {
    let source = foreach.source_sequence.evaluate(ctx)?;

    let source = match source.data() {
        ValueData::Build(build) => build.output_value(ctx.types)?,
        _ => source,
    };

    let Some(elements) = source.as_list() else {
        return Err(FabError::not_iterable(
            ctx.types.display(source.type_id()),
            foreach.source_sequence.span().info(),
        ));
    };

    let declared = foreach
        .explicit_type
        .as_ref()
        .map(|t| resolve_type(t, ctx))
        .transpose()?;

    let mut results = Vec::new();
    for element in elements.to_vec() {
        if let Some(declared) = declared {
            if !ctx.types.is_subtype(element.type_id(), declared) {
                return Err(FabError::wrong_type(
                    ctx.types.display(declared),
                    ctx.types.display(element.type_id()),
                    foreach.loop_var.info(),
                ));
            }
        }

        let (result, _) = ctx.with_scope("foreach body", None, |ctx| {
            ctx.define_local(foreach.loop_var.text.clone(), element.clone())?;
            foreach.body.evaluate(ctx)
        })?;

        results.push(result);
    }

    Value::list(results, ctx.types, foreach.span.info())
}

fn evaluate_list(list: &ListAst, ctx: &mut EvalContext) -> Result<ValueRef, FabError> {
    let elements = list
        .elements
        .iter()
        .map(|element| element.evaluate(ctx))
        .collect::<Result<Vec<_>, _>>()?;

    Value::list(elements, ctx.types, list.span.info())
}

/// Record fields are evaluated in order inside a fresh scope; the scope's
/// bindings become the record.
fn evaluate_record(record: &RecordAst, ctx: &mut EvalContext) -> Result<ValueRef, FabError> {
    let ((), scope) = ctx.with_scope("record", None, |ctx| {
        for field in &record.fields {
            define_value(ctx, field)?;
        }
        Ok(())
    })?;

    let fields = ctx.scope_bindings(scope);
    Ok(ctx.builder.record(ctx.types, fields, record.span.info()))
}

/// Resolves formal parameters, evaluating default values at definition
/// time in the enclosing scope.
pub(crate) fn resolve_parameters(
    parameters: &[ParameterAst],
    ctx: &mut EvalContext,
) -> Result<Vec<Parameter>, FabError> {
    let mut resolved = Vec::new();

    for parameter in parameters {
        let typ = resolve_type(&parameter.param_type, ctx)?;

        let default = match &parameter.default {
            Some(expression) => {
                let value = expression.evaluate(ctx)?;
                if !ctx.types.is_subtype(value.type_id(), typ) {
                    return Err(FabError::wrong_type(
                        ctx.types.display(typ),
                        ctx.types.display(value.type_id()),
                        expression.span().info(),
                    ));
                }
                Some(value)
            }
            None => None,
        };

        resolved.push(
            Parameter::new(parameter.name.text.clone(), typ, default)
                .with_source(parameter.name.info()),
        );
    }

    Ok(resolved)
}

/// A function literal snapshots the current scope so the body resolves
/// free names against its definition site.
fn evaluate_function_literal(
    function: &Rc<FunctionAst>,
    ctx: &mut EvalContext,
) -> Result<ValueRef, FabError> {
    let parameters = resolve_parameters(&function.parameters, ctx)?;
    let result = resolve_type(&function.result_type, ctx)?;

    let param_types = parameters.iter().map(|p| p.typ).collect();
    let typ = ctx.types.function_type(param_types, result);
    let captured = ctx.current_scope();

    let value = Function::new(
        parameters,
        result,
        FunctionBody::Expression(function.clone()),
        Some(captured),
        false,
        function.span.info(),
    );

    Ok(Value::new(
        ValueData::Function(Rc::new(value)),
        typ,
        function.span.info(),
    ))
}

/// An action produces a rule: the sole positional argument (or `command`)
/// is the command template, other arguments become rule-level defaults,
/// and the parameters describe the build signature.
fn evaluate_action(action: &ActionAst, ctx: &mut EvalContext) -> Result<ValueRef, FabError> {
    let mut command: Option<String> = None;
    let mut rule_args = ValueMap::new();

    for argument in &action.arguments {
        let value = argument.value.evaluate(ctx)?;
        let src = argument.value.span().info();

        let is_command = match &argument.name {
            None => true,
            Some(name) => name.text == "command",
        };

        if is_command {
            if command.is_some() {
                return Err(FabError::semantic("duplicate command", src));
            }
            command = Some(value.render_plain());
            continue;
        }

        let name = argument.name.as_ref().expect("named argument").text.clone();
        let rendered = value.render_plain();
        rule_args.insert(name, Value::string(rendered, ctx.types, src));
    }

    let Some(command) = command else {
        return Err(FabError::semantic(
            "action requires a command",
            action.span.info(),
        ));
    };

    let parameters = resolve_parameters(&action.parameters, ctx)?;

    // Files in an action signature must be tagged as inputs or outputs,
    // and something must actually be produced.
    for parameter in &parameters {
        if ctx.types.has_untagged_file(parameter.typ) {
            return Err(FabError::semantic(
                format!(
                    "parameter '{}' must use file[in] or file[out]",
                    parameter.name
                ),
                parameter.source.clone(),
            ));
        }
    }

    if !parameters.iter().any(|p| ctx.types.has_output(p.typ)) {
        return Err(FabError::no_outputs(action.span.info()));
    }

    let param_types: Vec<_> = parameters.iter().map(|p| p.typ).collect();
    let file_list = ctx.types.file_list_type();
    let typ = ctx.types.function_type(param_types, file_list);

    let name = match ctx.fully_qualified_name() {
        name if name.is_empty() => "action".to_string(),
        name => name,
    };

    Ok(ctx.builder.rule(
        name,
        command,
        rule_args,
        parameters,
        typ,
        action.span.info(),
    ))
}

/// `files(...)`: each filename literal becomes a file in the current
/// subdirectory, optionally extended by a `subdir` keyword argument.
fn evaluate_file_list(files: &FileListAst, ctx: &mut EvalContext) -> Result<ValueRef, FabError> {
    let subdir_value = ctx.lookup("subdir", &files.span.info())?;
    let mut subdir = subdir_value.render_plain();

    for argument in &files.arguments {
        let src = argument.value.span().info();
        match &argument.name {
            Some(name) if name.text == "subdir" => {
                let value = argument.value.evaluate(ctx)?;
                subdir = platform::join_path(&subdir, &value.render_plain());
            }
            Some(name) => {
                return Err(FabError::unknown_argument(&name.text, src));
            }
            None => {
                return Err(FabError::semantic("unexpected argument", src));
            }
        }
    }

    let mut values = Vec::new();
    for file in &files.files {
        values.push(ctx.builder.file_in_subdir(
            ctx.types,
            &subdir,
            &file.text,
            ValueMap::new(),
            file.info(),
            false,
        )?);
    }

    Value::list(values, ctx.types, files.span.info())
}
