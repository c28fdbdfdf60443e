//! Expression parsing with operator precedence.
//!
//! Each precedence level is a separate parser, lowest first:
//!
//! 1. `or`, `xor`
//! 2. `and`
//! 3. `==`, `!=`
//! 4. `+`, `-`, `::`
//! 5. `*`, `/`
//! 6. unary `not`, `-`
//! 7. postfix call `f(...)`
//! 8. primary: literals, names, lists, records, conditionals, loops,
//!    functions, actions, file lists, compounds, type declarations

use std::rc::Rc;

use nom::branch::alt;
use nom::character::complete::char;
use nom::bytes::complete::{tag, take_while1};
use nom::combinator::{map, opt, value};
use nom::error::context;
use nom::multi::{many0, separated_list0, separated_list1};
use nom::sequence::{delimited, preceded};
use nom::{IResult, Parser};

use crate::ast::{
    ActionAst, ArgumentAst, BinaryAst, BinaryOperator, CallAst, CompoundAst, ConditionalAst,
    ExpressionAst, FileListAst, ForeachAst, FunctionAst, ListAst, NameReferenceAst, ParameterAst,
    RecordAst, TypeDeclarationAst, UnaryAst, UnaryOperator,
};
use crate::nom_tools::{cleanup, skip_ignored, NomSpan, Span};

use super::{
    assignment, filename_literal, identifier, keyword, string_literal, type_reference,
    value_definition, FabParserError,
};

type ExprResult<'base> = IResult<NomSpan<'base>, ExpressionAst, FabParserError<'base>>;

/// Parses a complete expression (lowest precedence level).
pub(crate) fn expression(input: NomSpan<'_>) -> ExprResult<'_> {
    or_level(input)
}

/// Folds a left-associative chain of binary operators at one precedence
/// level.
fn fold_binary<'base>(
    input: NomSpan<'base>,
    next: fn(NomSpan<'base>) -> ExprResult<'base>,
    op: fn(NomSpan<'base>) -> IResult<NomSpan<'base>, BinaryOperator, FabParserError<'base>>,
) -> ExprResult<'base> {
    let (mut rest, mut lhs) = next(input)?;

    loop {
        let mut op_parser = preceded(skip_ignored, op);
        let Ok((after_op, operator)) = op_parser.parse(rest.clone()) else {
            break;
        };

        let (after_rhs, rhs) = preceded(skip_ignored, next).parse(after_op)?;

        let span = lhs.span().merge(rhs.span());
        lhs = ExpressionAst::Binary(Box::new(BinaryAst {
            lhs,
            rhs,
            op: operator,
            span,
        }));
        rest = after_rhs;
    }

    Ok((rest, lhs))
}

fn or_level(input: NomSpan<'_>) -> ExprResult<'_> {
    fold_binary(input, and_level, |input| {
        alt((
            value(BinaryOperator::Or, keyword("or")),
            value(BinaryOperator::Xor, keyword("xor")),
        ))
        .parse(input)
    })
}

fn and_level(input: NomSpan<'_>) -> ExprResult<'_> {
    fold_binary(input, equality_level, |input| {
        value(BinaryOperator::And, keyword("and")).parse(input)
    })
}

fn equality_level(input: NomSpan<'_>) -> ExprResult<'_> {
    fold_binary(input, additive_level, |input| {
        alt((
            value(BinaryOperator::Equal, tag("==")),
            value(BinaryOperator::NotEqual, tag("!=")),
        ))
        .parse(input)
    })
}

fn additive_level(input: NomSpan<'_>) -> ExprResult<'_> {
    fold_binary(input, multiplicative_level, |input| {
        alt((
            value(BinaryOperator::Add, char('+')),
            value(BinaryOperator::Prefix, tag("::")),
            value(BinaryOperator::Subtract, char('-')),
        ))
        .parse(input)
    })
}

fn multiplicative_level(input: NomSpan<'_>) -> ExprResult<'_> {
    fold_binary(input, unary_level, |input| {
        alt((
            value(BinaryOperator::Multiply, char('*')),
            value(BinaryOperator::Divide, char('/')),
        ))
        .parse(input)
    })
}

fn unary_level(input: NomSpan<'_>) -> ExprResult<'_> {
    let not_op = map(
        (keyword("not"), preceded(skip_ignored, unary_level)),
        |(op, operand)| {
            let op_span: Span = op.into();
            let span = op_span.merge(operand.span());
            ExpressionAst::Unary(Box::new(UnaryAst {
                operand,
                op: UnaryOperator::Not,
                span,
            }))
        },
    );

    let negate = map(
        (char('-'), preceded(skip_ignored, unary_level)),
        |(_, operand)| {
            let span = operand.span().clone();
            ExpressionAst::Unary(Box::new(UnaryAst {
                operand,
                op: UnaryOperator::Negate,
                span,
            }))
        },
    );

    alt((not_op, negate, postfix_level)).parse(input)
}

/// A primary expression followed by any number of call argument lists.
fn postfix_level(input: NomSpan<'_>) -> ExprResult<'_> {
    let (mut rest, mut target) = primary(input)?;

    loop {
        let mut call = delimited(
            cleanup(char('(')),
            separated_list0(cleanup(char(',')), argument),
            cleanup(char(')')),
        );

        let Ok((after, arguments)) = call.parse(rest.clone()) else {
            break;
        };

        let span = Span {
            text: String::new(),
            position: target.span().position.start..after.location_offset(),
            state: after.extra.clone(),
        };

        target = ExpressionAst::Call(Box::new(CallAst {
            target,
            arguments,
            span,
        }));
        rest = after;
    }

    Ok((rest, target))
}

/// A call argument: `name = expr` or a bare expression.
fn argument(input: NomSpan<'_>) -> IResult<NomSpan<'_>, ArgumentAst, FabParserError<'_>> {
    let keyword_argument = map(
        (identifier, cleanup(assignment), expression),
        |(name, _, value)| ArgumentAst {
            name: Some(name),
            value,
        },
    );

    let positional = map(expression, |value| ArgumentAst { name: None, value });

    alt((keyword_argument, positional)).parse(input)
}

/// A formal parameter: `name: type` with an optional default.
fn parameter(input: NomSpan<'_>) -> IResult<NomSpan<'_>, ParameterAst, FabParserError<'_>> {
    let (input, name) = identifier(input)?;
    let (input, _) = context("expected ':'", cleanup(char(':'))).parse(input)?;
    let (input, param_type) = context("expected parameter type", type_reference).parse(input)?;
    let (input, default) = opt(preceded(cleanup(assignment), expression)).parse(input)?;

    Ok((
        input,
        ParameterAst {
            name,
            param_type,
            default,
        },
    ))
}

fn primary(input: NomSpan<'_>) -> ExprResult<'_> {
    alt((
        boolean_literal,
        integer_literal,
        string_expression,
        conditional,
        foreach,
        function_literal,
        action,
        file_list,
        record_literal,
        type_declaration,
        type_name_reference,
        list_literal,
        compound,
        parenthesized,
        name_reference,
    ))
    .parse(input)
}

fn boolean_literal(input: NomSpan<'_>) -> ExprResult<'_> {
    alt((
        map(keyword("true"), |span: NomSpan| ExpressionAst::Boolean {
            value: true,
            span: span.into(),
        }),
        map(keyword("false"), |span: NomSpan| ExpressionAst::Boolean {
            value: false,
            span: span.into(),
        }),
    ))
    .parse(input)
}

fn integer_literal(input: NomSpan<'_>) -> ExprResult<'_> {
    let (rest, fragment) = take_while1(|c: char| c.is_ascii_digit()).parse(input)?;
    let span: Span = fragment.clone().into();

    match span.text.parse::<i64>() {
        Ok(value) => Ok((rest, ExpressionAst::Integer { value, span })),
        Err(_) => Err(nom::Err::Error(nom::error::ParseError::from_error_kind(
            fragment,
            nom::error::ErrorKind::Digit,
        ))),
    }
}

fn string_expression(input: NomSpan<'_>) -> ExprResult<'_> {
    map(string_literal, |span| ExpressionAst::Str {
        value: span.text.clone(),
        span,
    })
    .parse(input)
}

/// `if condition then-expr else else-expr`
fn conditional(input: NomSpan<'_>) -> ExprResult<'_> {
    let (input, start) = keyword("if").parse(input)?;
    let (input, condition) =
        context("expected condition", preceded(skip_ignored, expression)).parse(input)?;
    let (input, then_branch) =
        context("expected expression", preceded(skip_ignored, expression)).parse(input)?;
    let (input, _) = context("expected 'else'", cleanup(keyword("else"))).parse(input)?;
    let (input, else_branch) =
        context("expected expression", preceded(skip_ignored, expression)).parse(input)?;

    let start_span: Span = start.into();
    let span = start_span.merge(else_branch.span());

    Ok((
        input,
        ExpressionAst::Conditional(Box::new(ConditionalAst {
            condition,
            then_branch,
            else_branch,
            span,
        })),
    ))
}

/// `foreach x <- sequence body`
fn foreach(input: NomSpan<'_>) -> ExprResult<'_> {
    let (input, start) = keyword("foreach").parse(input)?;
    let (input, loop_var) =
        context("expected loop variable", cleanup(identifier)).parse(input)?;
    let (input, explicit_type) =
        opt(preceded(cleanup(char(':')), type_reference)).parse(input)?;
    let (input, _) = context("expected '<-'", cleanup(tag("<-"))).parse(input)?;
    let (input, source_sequence) =
        context("expected sequence", preceded(skip_ignored, expression)).parse(input)?;
    let (input, body) =
        context("expected loop body", preceded(skip_ignored, expression)).parse(input)?;

    let start_span: Span = start.into();
    let span = start_span.merge(body.span());

    Ok((
        input,
        ExpressionAst::Foreach(Box::new(ForeachAst {
            loop_var,
            explicit_type,
            source_sequence,
            body,
            span,
        })),
    ))
}

/// `function(params): result body`
fn function_literal(input: NomSpan<'_>) -> ExprResult<'_> {
    let (input, start) = keyword("function").parse(input)?;
    let (input, parameters) = delimited(
        cleanup(char('(')),
        separated_list0(cleanup(char(',')), parameter),
        cleanup(char(')')),
    )
    .parse(input)?;
    let (input, _) = context("expected ':'", cleanup(char(':'))).parse(input)?;
    let (input, result_type) = context("expected result type", type_reference).parse(input)?;
    let (input, body) =
        context("expected function body", preceded(skip_ignored, expression)).parse(input)?;

    let start_span: Span = start.into();
    let span = start_span.merge(body.span());

    Ok((
        input,
        ExpressionAst::Function(Rc::new(FunctionAst {
            parameters,
            result_type,
            body,
            span,
        })),
    ))
}

/// `action('command', extra = 'args' <- params)`
fn action(input: NomSpan<'_>) -> ExprResult<'_> {
    let (input, start) = keyword("action").parse(input)?;
    let (input, _) = cleanup(char('(')).parse(input)?;
    let (input, arguments) =
        separated_list0(cleanup(char(',')), argument).parse(input)?;
    let (input, parameters) = opt(preceded(
        cleanup(tag("<-")),
        separated_list1(cleanup(char(',')), parameter),
    ))
    .parse(input)?;
    let (input, _) = context("expected ')'", cleanup(char(')'))).parse(input)?;

    let start_span: Span = start.into();
    let span = Span {
        text: String::new(),
        position: start_span.position.start..input.location_offset(),
        state: start_span.state.clone(),
    };

    Ok((
        input,
        ExpressionAst::Action(Rc::new(ActionAst {
            arguments,
            parameters: parameters.unwrap_or_default(),
            span,
        })),
    ))
}

/// `files(a.c sub/b.c, subdir = 'dir')`
fn file_list(input: NomSpan<'_>) -> ExprResult<'_> {
    let (input, start) = keyword("files").parse(input)?;
    let (input, _) = cleanup(char('(')).parse(input)?;

    // A word followed by '=' is a keyword argument, not a filename.
    let filename = nom::sequence::terminated(
        filename_literal,
        nom::combinator::not(preceded(skip_ignored, assignment)),
    );
    let (input, files) = many0(cleanup(filename)).parse(input)?;
    let (input, arguments) =
        many0(preceded(cleanup(char(',')), argument)).parse(input)?;
    let (input, _) = context("expected ')'", cleanup(char(')'))).parse(input)?;

    let start_span: Span = start.into();
    let span = Span {
        text: String::new(),
        position: start_span.position.start..input.location_offset(),
        state: start_span.state.clone(),
    };

    Ok((
        input,
        ExpressionAst::FileList(Box::new(FileListAst {
            files,
            arguments,
            span,
        })),
    ))
}

/// `record { a = 1; b = 2; }`
fn record_literal(input: NomSpan<'_>) -> ExprResult<'_> {
    let (input, start) = keyword("record").parse(input)?;
    let (input, _) = cleanup(char('{')).parse(input)?;
    let (input, fields) = many0(cleanup(value_definition)).parse(input)?;
    let (input, _) = context("expected '}'", cleanup(char('}'))).parse(input)?;

    let start_span: Span = start.into();
    let span = Span {
        text: String::new(),
        position: start_span.position.start..input.location_offset(),
        state: start_span.state.clone(),
    };

    Ok((
        input,
        ExpressionAst::Record(Box::new(RecordAst { fields, span })),
    ))
}

/// `type T`: a first-class type value.
fn type_declaration(input: NomSpan<'_>) -> ExprResult<'_> {
    let (input, start) = keyword("type").parse(input)?;
    let (input, declared) = preceded(skip_ignored, type_reference).parse(input)?;

    let start_span: Span = start.into();
    let span = start_span.merge(declared.span());

    Ok((
        input,
        ExpressionAst::TypeDeclaration(Box::new(TypeDeclarationAst { declared, span })),
    ))
}

/// The `type` builtin used as a function: `type(value)`. Tried after
/// [`type_declaration`], so `type int` wins over a call.
fn type_name_reference(input: NomSpan<'_>) -> ExprResult<'_> {
    map(keyword("type"), |fragment: NomSpan| {
        let span: Span = fragment.into();
        ExpressionAst::Name(NameReferenceAst {
            components: vec![span.clone()],
            span,
        })
    })
    .parse(input)
}

/// `[a, b, c]`
fn list_literal(input: NomSpan<'_>) -> ExprResult<'_> {
    let start_offset = input.location_offset();
    let (input, _) = char('[').parse(input)?;
    let (input, elements) =
        separated_list0(cleanup(char(',')), preceded(skip_ignored, expression)).parse(input)?;
    let (input, _) = context("expected ']'", cleanup(char(']'))).parse(input)?;

    let span = Span {
        text: String::new(),
        position: start_offset..input.location_offset(),
        state: input.extra.clone(),
    };

    Ok((
        input,
        ExpressionAst::List(Box::new(ListAst { elements, span })),
    ))
}

/// `{ x = 1; x + 1 }`: local definitions scoped to a result expression.
fn compound(input: NomSpan<'_>) -> ExprResult<'_> {
    let start_offset = input.location_offset();
    let (input, _) = char('{').parse(input)?;
    let (input, values) = many0(cleanup(value_definition)).parse(input)?;
    let (input, result) =
        context("expected result expression", cleanup(expression)).parse(input)?;
    let (input, _) = context("expected '}'", cleanup(char('}'))).parse(input)?;

    let span = Span {
        text: String::new(),
        position: start_offset..input.location_offset(),
        state: input.extra.clone(),
    };

    Ok((
        input,
        ExpressionAst::Compound(Box::new(CompoundAst {
            values,
            result,
            span,
        })),
    ))
}

fn parenthesized(input: NomSpan<'_>) -> ExprResult<'_> {
    delimited(cleanup(char('(')), expression, cleanup(char(')'))).parse(input)
}

/// A dotted name reference: `foo` or `foo.bar.baz`.
fn name_reference(input: NomSpan<'_>) -> ExprResult<'_> {
    let (input, components) = separated_list1(char('.'), identifier).parse(input)?;

    let span = match components.as_slice() {
        [single] => single.clone(),
        [first, .., last] => first.merge(last),
        [] => unreachable!("separated_list1 returned no components"),
    };

    Ok((
        input,
        ExpressionAst::Name(NameReferenceAst { components, span }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::SourceFile;
    use crate::nom_tools::State;

    fn parse_expr(code: &str) -> ExpressionAst {
        let state = State::new(SourceFile::new("test.fab", code));
        let input = NomSpan::new_extra(state.file.code(), state.clone());
        let (rest, expr) = expression(input).expect("parse failed");
        assert!(
            rest.fragment().trim().is_empty(),
            "unparsed input: {}",
            rest.fragment()
        );
        expr
    }

    #[test]
    fn precedence() {
        let expr = parse_expr("1 + 2 * 3");
        let ExpressionAst::Binary(add) = expr else {
            panic!("expected binary expression");
        };
        assert_eq!(add.op, BinaryOperator::Add);
        let ExpressionAst::Binary(mul) = add.rhs else {
            panic!("expected nested multiplication");
        };
        assert_eq!(mul.op, BinaryOperator::Multiply);
    }

    #[test]
    fn call_with_keyword_arguments() {
        let expr = parse_expr("cc(src = file('a.c'), obj = file('a.o'))");
        let ExpressionAst::Call(call) = expr else {
            panic!("expected call");
        };
        assert_eq!(call.arguments.len(), 2);
        assert_eq!(call.arguments[0].name.as_ref().unwrap().text, "src");
    }

    #[test]
    fn action_with_parameters() {
        let expr = parse_expr("action('cc -c ${src} -o ${obj}' <- src: file[in], obj: file[out])");
        let ExpressionAst::Action(action) = expr else {
            panic!("expected action");
        };
        assert_eq!(action.arguments.len(), 1);
        assert_eq!(action.parameters.len(), 2);
    }

    #[test]
    fn foreach_over_list() {
        let expr = parse_expr("foreach s <- ['a', 'b'] s + '.c'");
        let ExpressionAst::Foreach(foreach) = expr else {
            panic!("expected foreach");
        };
        assert_eq!(foreach.loop_var.text, "s");
    }

    #[test]
    fn type_builtin_call_still_parses() {
        let expr = parse_expr("type(x)");
        assert!(matches!(expr, ExpressionAst::Call(_)));

        let expr = parse_expr("type list[int]");
        assert!(matches!(expr, ExpressionAst::TypeDeclaration(_)));
    }

    #[test]
    fn dotted_name() {
        let expr = parse_expr("a.b.c");
        let ExpressionAst::Name(name) = expr else {
            panic!("expected name reference");
        };
        assert_eq!(name.components.len(), 3);
    }
}
