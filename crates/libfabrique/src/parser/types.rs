//! Type syntax parsing: named/parametric, function and record types.

use nom::branch::alt;
use nom::character::complete::char;
use nom::bytes::complete::tag;
use nom::combinator::opt;
use nom::error::context;
use nom::multi::{separated_list0, separated_list1};
use nom::sequence::{delimited, separated_pair};
use nom::{IResult, Parser};

use crate::ast::TypeAst;
use crate::nom_tools::{cleanup, NomSpan, Span};

use super::{keyword, word, FabParserError};

type TypeResult<'base> = IResult<NomSpan<'base>, TypeAst, FabParserError<'base>>;

/// Parses any type reference: `int`, `list[file[in]]`, `(int) => string`,
/// `record[a: int, b: string]`.
pub(crate) fn type_reference(input: NomSpan<'_>) -> TypeResult<'_> {
    alt((record_type, function_type, named_type)).parse(input)
}

/// `name` or `name[params]`.
fn named_type(input: NomSpan<'_>) -> TypeResult<'_> {
    let (input, name) = word(input)?;
    let (input, params) = opt(delimited(
        cleanup(char('[')),
        separated_list1(cleanup(char(',')), type_reference),
        cleanup(char(']')),
    ))
    .parse(input)?;

    Ok((
        input,
        TypeAst::Named {
            name,
            params: params.unwrap_or_default(),
        },
    ))
}

/// `(params) => result`.
fn function_type(input: NomSpan<'_>) -> TypeResult<'_> {
    let start_offset = input.location_offset();

    let (input, params) = delimited(
        cleanup(char('(')),
        separated_list0(cleanup(char(',')), type_reference),
        cleanup(char(')')),
    )
    .parse(input)?;
    let (input, _) = cleanup(tag("=>")).parse(input)?;
    let (input, result) = context("expected result type", type_reference).parse(input)?;

    let span = Span {
        text: String::new(),
        position: start_offset..input.location_offset(),
        state: input.extra.clone(),
    };

    Ok((
        input,
        TypeAst::Function {
            params,
            result: Box::new(result),
            span,
        },
    ))
}

/// `record[a: int, b: string]`.
fn record_type(input: NomSpan<'_>) -> TypeResult<'_> {
    let start_offset = input.location_offset();

    let (input, _) = keyword("record").parse(input)?;
    let (input, fields) = delimited(
        cleanup(char('[')),
        separated_list0(
            cleanup(char(',')),
            separated_pair(word, cleanup(char(':')), type_reference),
        ),
        cleanup(char(']')),
    )
    .parse(input)?;

    let span = Span {
        text: String::new(),
        position: start_offset..input.location_offset(),
        state: input.extra.clone(),
    };

    Ok((input, TypeAst::Record { fields, span }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::SourceFile;
    use crate::nom_tools::State;

    fn parse_type(code: &str) -> TypeAst {
        let state = State::new(SourceFile::new("test.fab", code));
        let input = NomSpan::new_extra(state.file.code(), state.clone());
        let (rest, t) = type_reference(input).expect("parse failed");
        assert!(rest.fragment().trim().is_empty());
        t
    }

    #[test]
    fn named_and_parametric() {
        assert!(matches!(parse_type("int"), TypeAst::Named { ref params, .. } if params.is_empty()));
        assert!(
            matches!(parse_type("list[file[in]]"), TypeAst::Named { ref params, .. } if params.len() == 1)
        );
    }

    #[test]
    fn function_types() {
        let t = parse_type("(int, string) => list[file]");
        assert!(matches!(t, TypeAst::Function { ref params, .. } if params.len() == 2));
    }

    #[test]
    fn record_types() {
        let t = parse_type("record[a: int, b: string]");
        assert!(matches!(t, TypeAst::Record { ref fields, .. } if fields.len() == 2));
    }
}
