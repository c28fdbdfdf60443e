//! The nom parser for the Fabrique language.
//!
//! The grammar is line-oriented only in the sense that `#` comments run to
//! end of line; otherwise whitespace is free. A file is a sequence of
//! `name = expr;` definitions. Expression parsing lives in
//! [`expression`], type syntax in [`types`].

mod expression;
mod types;

use nom::branch::alt;
use nom::character::complete::{char, satisfy};
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::combinator::{eof, not, opt, recognize, verify};
use nom::error::context;
use nom::multi::many0;
use nom::sequence::{pair, preceded, terminated};
use nom::{IResult, Parser};

use crate::ast::{FileAst, ValueAst};
use crate::nom_tools::{cleanup, NomSpan, Span, State};

pub(crate) use expression::expression;
pub(crate) use types::type_reference;

/// Error type for Fabrique parsing: nom's verbose error over located
/// spans, so syntax errors keep their positions and context labels.
pub type FabParserError<'base> = nom_language::error::VerboseError<NomSpan<'base>>;

/// Words that can never be value names.
pub(crate) static KEYWORDS: &[&str] = &[
    "true", "false", "if", "else", "foreach", "function", "action", "files", "record", "type",
    "and", "or", "xor", "not",
];

/// Parses a whole source file into an AST.
pub fn parse(state: &State) -> IResult<NomSpan<'_>, FileAst, FabParserError<'_>> {
    let input = NomSpan::new_extra(state.file.code(), state.clone());
    parse_file(input)
}

fn parse_file(input: NomSpan<'_>) -> IResult<NomSpan<'_>, FileAst, FabParserError<'_>> {
    let file = input.extra.file.clone();

    let (input, values) = many0(cleanup(value_definition)).parse(input)?;
    let (input, _) = context("expected value definition", cleanup(eof)).parse(input)?;

    Ok((input, FileAst { file, values }))
}

/// One `name = expr;` or `name: type = expr;` definition.
pub(crate) fn value_definition(
    input: NomSpan<'_>,
) -> IResult<NomSpan<'_>, ValueAst, FabParserError<'_>> {
    let (input, name) = identifier(input)?;
    let (input, explicit_type) = opt(preceded(cleanup(char(':')), type_reference)).parse(input)?;
    let (input, _) = context("expected '='", cleanup(assignment)).parse(input)?;
    let (input, value) = context("expected expression", cleanup(expression)).parse(input)?;
    let (input, _) = context("expected ';'", cleanup(char(';'))).parse(input)?;

    Ok((
        input,
        ValueAst {
            name,
            explicit_type,
            value,
        },
    ))
}

/// `=` that is not the start of `==`.
pub(crate) fn assignment(input: NomSpan<'_>) -> IResult<NomSpan<'_>, char, FabParserError<'_>> {
    terminated(char('='), not(char('='))).parse(input)
}

/// A bare word: letters, digits and underscores, not starting with a
/// digit. Keywords are not excluded here; use [`identifier`] for names.
pub(crate) fn word(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Span, FabParserError<'_>> {
    let (input, fragment) = recognize(pair(
        satisfy(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)?;

    Ok((input, fragment.into()))
}

/// A name: a word that is not a keyword.
pub(crate) fn identifier(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Span, FabParserError<'_>> {
    verify(word, |span: &Span| !KEYWORDS.contains(&span.text.as_str())).parse(input)
}

/// Matches a keyword with a word boundary after it.
pub(crate) fn keyword<'base>(
    kw: &'static str,
) -> impl Parser<NomSpan<'base>, Output = NomSpan<'base>, Error = FabParserError<'base>> {
    terminated(
        tag(kw),
        not(satisfy(|c: char| c.is_ascii_alphanumeric() || c == '_')),
    )
}

/// A filename literal, as used inside `files(...)`.
pub(crate) fn filename_literal(
    input: NomSpan<'_>,
) -> IResult<NomSpan<'_>, Span, FabParserError<'_>> {
    let (input, fragment) =
        take_while1(|c: char| c.is_ascii_alphanumeric() || "._/-+".contains(c)).parse(input)?;

    Ok((input, fragment.into()))
}

/// A string literal: single- or double-quoted, no escapes.
pub(crate) fn string_literal(
    input: NomSpan<'_>,
) -> IResult<NomSpan<'_>, Span, FabParserError<'_>> {
    let single = nom::sequence::delimited(
        char('\''),
        nom::bytes::complete::take_till(|c| c == '\''),
        char('\''),
    );
    let double = nom::sequence::delimited(
        char('"'),
        nom::bytes::complete::take_till(|c| c == '"'),
        char('"'),
    );

    let (input, fragment) = alt((single, double)).parse(input)?;
    Ok((input, fragment.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::SourceFile;

    fn state(code: &str) -> State {
        State::new(SourceFile::new("test.fab", code))
    }

    #[test]
    fn parses_empty_file() {
        let state = state("# nothing but a comment\n");
        let (_, ast) = parse(&state).unwrap();
        assert!(ast.values.is_empty());
    }

    #[test]
    fn parses_definitions() {
        let state = state("x = 1;\ny = 'hello';\nz: bool = true;\n");
        let (_, ast) = parse(&state).unwrap();
        assert_eq!(ast.values.len(), 3);
        assert_eq!(ast.values[0].name.text, "x");
        assert_eq!(ast.values[2].name.text, "z");
        assert!(ast.values[2].explicit_type.is_some());
    }

    #[test]
    fn rejects_keyword_names() {
        let state = state("foreach = 1;");
        assert!(parse(&state).is_err());
    }
}
