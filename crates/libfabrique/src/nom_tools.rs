//! Nom parser tools and span utilities for the Fabrique compiler.
//!
//! This module provides the span types used throughout the compiler: the
//! parser-side [`NomSpan`] (a located span carrying parser [`State`]), the
//! owned [`Span`] stored in AST nodes, and the lifetime-free [`SpanInfo`]
//! attached to evaluated values and diagnostics.

use std::fmt::Display;
use std::hash::Hash;
use std::ops::Range;

use nom::character::complete::multispace0;
use nom::sequence::delimited;
use nom::Parser;
use nom_locate::LocatedSpan;

use crate::file::SourceFile;
use crate::parser::FabParserError;

/// Parser state carried through every [`NomSpan`].
#[derive(Debug, Clone)]
pub struct State {
    /// The source file being parsed
    pub file: SourceFile,
}

impl State {
    pub fn new(file: SourceFile) -> Self {
        Self { file }
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.file == other.file
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.file.hash(state);
    }
}

/// Type alias for nom's located span with Fabrique's parser state.
pub type NomSpan<'base> = LocatedSpan<&'base str, State>;

/// A region of source code, with its text and position.
///
/// AST nodes store these. The text is owned rather than borrowed because
/// `import()` parses new source files in the middle of evaluation, and the
/// resulting values outlive the imported file's parse buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    /// The text content of this span
    pub text: String,
    /// The byte range in the source file
    pub position: Range<usize>,
    /// The parser state containing file information
    pub state: State,
}

impl Span {
    /// Widens this span to also cover `other`.
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            text: String::new(),
            position: self.position.start.min(other.position.start)
                ..self.position.end.max(other.position.end),
            state: self.state.clone(),
        }
    }

    pub fn info(&self) -> SpanInfo {
        self.into()
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<NomSpan<'_>> for Span {
    fn from(value: NomSpan<'_>) -> Self {
        Span {
            text: value.fragment().to_string(),
            position: value.to_range(),
            state: value.extra.clone(),
        }
    }
}

/// Span information without the source text: a position plus the file it
/// belongs to. Suitable for storage in values and diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpanInfo {
    /// The byte range in the source file
    pub position: Range<usize>,
    /// The source file this span belongs to
    pub file: SourceFile,
}

impl SpanInfo {
    pub fn new(position: Range<usize>, file: SourceFile) -> Self {
        Self { position, file }
    }

    /// A span for values with no source location (synthesized by builtins,
    /// the DAG builder, or tests).
    pub fn none() -> Self {
        Self::new(0..0, SourceFile::synthetic())
    }

    /// The smallest span covering both `self` and `other`. Falls back to
    /// `self` when the two spans come from different files.
    pub fn over(&self, other: &SpanInfo) -> SpanInfo {
        if self.file != other.file {
            return self.clone();
        }

        SpanInfo::new(
            self.position.start.min(other.position.start)
                ..self.position.end.max(other.position.end),
            self.file.clone(),
        )
    }
}

impl From<Span> for SpanInfo {
    fn from(span: Span) -> Self {
        Self::new(span.position.clone(), span.state.file.clone())
    }
}

impl From<&Span> for SpanInfo {
    fn from(span: &Span) -> Self {
        Self::new(span.position.clone(), span.state.file.clone())
    }
}

/// Trait for converting spans to byte ranges.
pub trait ToRange {
    fn to_range(&self) -> Range<usize>;
}

impl ToRange for NomSpan<'_> {
    fn to_range(&self) -> Range<usize> {
        let start = self.location_offset();
        start..start + self.fragment().len()
    }
}

impl ToRange for Span {
    fn to_range(&self) -> Range<usize> {
        self.position.clone()
    }
}

/// Skips whitespace and `#`-to-end-of-line comments.
pub fn skip_ignored(mut input: NomSpan<'_>) -> nom::IResult<NomSpan<'_>, (), FabParserError<'_>> {
    loop {
        let (rest, _) = multispace0(input)?;

        if rest.fragment().starts_with('#') {
            let (rest, _) =
                nom::bytes::complete::take_till::<_, _, FabParserError>(|c| c == '\n')
                    .parse(rest)?;
            input = rest;
        } else {
            return Ok((rest, ()));
        }
    }
}

/// Parser combinator that wraps a parser with whitespace/comment cleanup on
/// both sides.
pub fn cleanup<'base, O, F>(f: F) -> impl Parser<NomSpan<'base>, Output = O, Error = FabParserError<'base>>
where
    F: Parser<NomSpan<'base>, Output = O, Error = FabParserError<'base>>,
{
    delimited(skip_ignored, f, skip_ignored)
}
