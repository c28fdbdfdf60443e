//! Error types for the Fabrique compiler.
//!
//! Every user-facing error carries a source span and is rendered through
//! `miette` with labelled source context. The taxonomy follows the
//! evaluator's needs: syntax errors from the parser, semantic errors from
//! evaluation, type errors from the lattice, and OS errors from import and
//! plugin resolution. [`FabError`] is the single error type threaded through
//! the whole pipeline; constructor helpers keep call sites terse.

use std::ops::Range;

use miette::{Diagnostic, NamedSource, SourceSpan};
use nom_language::error::VerboseErrorKind;

use crate::ast::FileAst;
use crate::file::SourceFile;
use crate::nom_tools::{SpanInfo, ToRange};

/// File extension for Fabrique build description files.
pub static FAB_LANG_EXT: &str = "fab";

/// Error type for parsing operations using nom combinators.
pub type ParseError<'base> =
    nom_language::error::VerboseError<nom_locate::LocatedSpan<&'base str, crate::nom_tools::State>>;

/// Result of the parse stage: remaining input plus the parsed file.
pub type ParseResult<'base> = Result<
    (nom_locate::LocatedSpan<&'base str, crate::nom_tools::State>, FileAst),
    ParseError<'base>,
>;

fn label(position: &Range<usize>) -> SourceSpan {
    (position.start, position.end.saturating_sub(position.start)).into()
}

fn source(file: &SourceFile) -> NamedSource<String> {
    file.into()
}

/// A single labelled syntax error from the parser.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("syntax error")]
pub struct SyntaxErrorItem {
    #[label("{message}")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,

    pub message: &'static str,
}

#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{} syntax error(s) detected", .errors.len())]
pub struct SyntaxError {
    #[related]
    pub errors: Vec<SyntaxErrorItem>,
}

/// Reference to a name with no definition in any enclosing scope.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("reference to undefined name '{name}'")]
#[diagnostic(
    code("fab::eval::undefined_name"),
    help("define the name before using it, or check its spelling")
)]
pub struct UndefinedName {
    pub name: String,

    #[label("not defined in any enclosing scope")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

/// A name defined twice within a single scope.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("name is already defined")]
#[diagnostic(
    code("fab::eval::already_defined"),
    help("rename one of the definitions or remove one")
)]
pub struct AlreadyDefined {
    #[label("already defined here")]
    pub old_position: SourceSpan,

    #[label("redefined here")]
    pub new_position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

/// A value whose type is not a subtype of what the context requires.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("expected {expected}, got {actual}")]
#[diagnostic(code("fab::types::wrong_type"))]
pub struct WrongType {
    pub expected: String,
    pub actual: String,

    #[label("this has type {actual}")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

/// Two types with no common supertype (conditional branches, list elements).
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("no common supertype for {left} and {right}")]
#[diagnostic(code("fab::types::no_common_supertype"))]
pub struct NoCommonSupertype {
    pub left: String,
    pub right: String,

    #[label("types {left} and {right} are unrelated")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

/// Operands that no operator-result rule accepts.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("cannot {operation} {left} and {right}")]
#[diagnostic(code("fab::eval::invalid_operands"))]
pub struct InvalidOperands {
    pub operation: String,
    pub left: String,
    pub right: String,

    #[label("invalid operands")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("division by zero")]
#[diagnostic(code("fab::eval::division_by_zero"))]
pub struct DivisionByZero {
    #[label("the divisor evaluates to zero")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

/// A call missing an argument with no default value.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("missing argument '{name}'")]
#[diagnostic(code("fab::eval::missing_argument"))]
pub struct MissingArgument {
    pub name: String,

    #[label("'{name}' has no default and was not supplied")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

/// A keyword argument that matches no formal parameter.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("unknown argument '{name}'")]
#[diagnostic(code("fab::eval::unknown_argument"))]
pub struct UnknownArgument {
    pub name: String,

    #[label("no parameter with this name")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("positional argument after keyword argument")]
#[diagnostic(
    code("fab::eval::positional_after_keyword"),
    help("move positional arguments before all keyword arguments")
)]
pub struct PositionalAfterKeyword {
    #[label("this argument must be named")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("too many positional arguments")]
#[diagnostic(code("fab::eval::too_many_arguments"))]
pub struct TooManyArguments {
    #[label("no parameter left to bind this argument to")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

/// `file[...]` parameterised with something other than `in` or `out`.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("invalid file tag '{tag}'")]
#[diagnostic(
    code("fab::types::invalid_file_tag"),
    help("files can only be tagged 'in' or 'out'")
)]
pub struct InvalidFileTag {
    pub tag: String,

    #[label("not a valid file tag")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

/// Calling a value that is neither a rule nor a function.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{actual} is not callable")]
#[diagnostic(code("fab::eval::not_callable"))]
pub struct NotCallable {
    pub actual: String,

    #[label("cannot be called")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

/// Field access on a value that has no such field.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{container} has no field '{field}'")]
#[diagnostic(code("fab::eval::no_such_field"))]
pub struct NoSuchField {
    pub field: String,
    pub container: String,

    #[label("unknown field")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

/// `foreach` over something that is not an ordered sequence.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("cannot iterate over {actual}")]
#[diagnostic(code("fab::eval::not_iterable"))]
pub struct NotIterable {
    pub actual: String,

    #[label("not an ordered sequence")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

/// A top-level target whose name collides with an unrelated file.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("target '{name}' conflicts with file")]
#[diagnostic(
    code("fab::dag::target_conflict"),
    help("rename the target or the file; a target may only share a name with its own output")
)]
pub struct TargetConflict {
    pub name: String,

    #[label("file with the same name")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

/// An absolute path marked as a build output.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("cannot generate file with absolute path '{path}'")]
#[diagnostic(code("fab::dag::absolute_output"))]
pub struct AbsoluteOutput {
    pub path: String,

    #[label("absolute paths cannot be build outputs")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

/// A build action that cannot produce any output files.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("build produces no output files")]
#[diagnostic(
    code("fab::dag::no_outputs"),
    help("at least one parameter must have type file[out] or list[file[out]]")
)]
pub struct NoOutputs {
    #[label("no output file parameter")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

/// A malformed action, file or call construct.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code("fab::eval::semantic_error"))]
pub struct SemanticError {
    pub message: String,

    #[label("here")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

/// A module that could not be resolved to a file, directory or plugin.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("no such module or plugin '{module}'")]
#[diagnostic(
    code("fab::import::not_found"),
    help("import() looks for a Fabrique file, a directory containing a 'fabfile', or a plugin")
)]
pub struct ImportNotFound {
    pub module: String,

    #[label("cannot be resolved")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

/// A plugin that failed to instantiate or broke its contract.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("plugin '{plugin}' failed: {message}")]
#[diagnostic(code("fab::plugin::failure"))]
pub struct PluginFailure {
    pub plugin: String,
    pub message: String,

    #[label("while instantiating this plugin")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

/// An operating-system error during import or plugin loading.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code("fab::os::error"))]
pub struct OsError {
    pub message: String,

    #[label("while processing this")]
    pub position: SourceSpan,

    #[source_code]
    pub code: NamedSource<String>,
}

/// The top-level error type for the whole compilation pipeline.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum FabError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    SyntaxError(#[from] Box<SyntaxError>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    UndefinedName(Box<UndefinedName>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    AlreadyDefined(Box<AlreadyDefined>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    WrongType(Box<WrongType>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    NoCommonSupertype(Box<NoCommonSupertype>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidOperands(Box<InvalidOperands>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    DivisionByZero(Box<DivisionByZero>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    MissingArgument(Box<MissingArgument>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    UnknownArgument(Box<UnknownArgument>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    PositionalAfterKeyword(Box<PositionalAfterKeyword>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    TooManyArguments(Box<TooManyArguments>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidFileTag(Box<InvalidFileTag>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    NotCallable(Box<NotCallable>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    NoSuchField(Box<NoSuchField>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    NotIterable(Box<NotIterable>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    TargetConflict(Box<TargetConflict>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    AbsoluteOutput(Box<AbsoluteOutput>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    NoOutputs(Box<NoOutputs>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    SemanticError(Box<SemanticError>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    ImportNotFound(Box<ImportNotFound>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    PluginFailure(Box<PluginFailure>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    OsError(Box<OsError>),
}

impl FabError {
    pub fn undefined_name(name: impl Into<String>, src: SpanInfo) -> Self {
        FabError::UndefinedName(
            UndefinedName {
                name: name.into(),
                position: label(&src.position),
                code: source(&src.file),
            }
            .into(),
        )
    }

    pub fn already_defined(new: SpanInfo, old: SpanInfo) -> Self {
        FabError::AlreadyDefined(
            AlreadyDefined {
                old_position: label(&old.position),
                new_position: label(&new.position),
                code: source(&new.file),
            }
            .into(),
        )
    }

    pub fn wrong_type(expected: impl Into<String>, actual: impl Into<String>, src: SpanInfo) -> Self {
        FabError::WrongType(
            WrongType {
                expected: expected.into(),
                actual: actual.into(),
                position: label(&src.position),
                code: source(&src.file),
            }
            .into(),
        )
    }

    pub fn no_common_supertype(
        left: impl Into<String>,
        right: impl Into<String>,
        src: SpanInfo,
    ) -> Self {
        FabError::NoCommonSupertype(
            NoCommonSupertype {
                left: left.into(),
                right: right.into(),
                position: label(&src.position),
                code: source(&src.file),
            }
            .into(),
        )
    }

    pub fn invalid_operands(
        operation: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
        src: SpanInfo,
    ) -> Self {
        FabError::InvalidOperands(
            InvalidOperands {
                operation: operation.into(),
                left: left.into(),
                right: right.into(),
                position: label(&src.position),
                code: source(&src.file),
            }
            .into(),
        )
    }

    pub fn division_by_zero(src: SpanInfo) -> Self {
        FabError::DivisionByZero(
            DivisionByZero {
                position: label(&src.position),
                code: source(&src.file),
            }
            .into(),
        )
    }

    pub fn missing_argument(name: impl Into<String>, src: SpanInfo) -> Self {
        FabError::MissingArgument(
            MissingArgument {
                name: name.into(),
                position: label(&src.position),
                code: source(&src.file),
            }
            .into(),
        )
    }

    pub fn unknown_argument(name: impl Into<String>, src: SpanInfo) -> Self {
        FabError::UnknownArgument(
            UnknownArgument {
                name: name.into(),
                position: label(&src.position),
                code: source(&src.file),
            }
            .into(),
        )
    }

    pub fn positional_after_keyword(src: SpanInfo) -> Self {
        FabError::PositionalAfterKeyword(
            PositionalAfterKeyword {
                position: label(&src.position),
                code: source(&src.file),
            }
            .into(),
        )
    }

    pub fn too_many_arguments(src: SpanInfo) -> Self {
        FabError::TooManyArguments(
            TooManyArguments {
                position: label(&src.position),
                code: source(&src.file),
            }
            .into(),
        )
    }

    pub fn invalid_file_tag(tag: impl Into<String>, src: SpanInfo) -> Self {
        FabError::InvalidFileTag(
            InvalidFileTag {
                tag: tag.into(),
                position: label(&src.position),
                code: source(&src.file),
            }
            .into(),
        )
    }

    pub fn not_callable(actual: impl Into<String>, src: SpanInfo) -> Self {
        FabError::NotCallable(
            NotCallable {
                actual: actual.into(),
                position: label(&src.position),
                code: source(&src.file),
            }
            .into(),
        )
    }

    pub fn no_such_field(
        field: impl Into<String>,
        container: impl Into<String>,
        src: SpanInfo,
    ) -> Self {
        FabError::NoSuchField(
            NoSuchField {
                field: field.into(),
                container: container.into(),
                position: label(&src.position),
                code: source(&src.file),
            }
            .into(),
        )
    }

    pub fn not_iterable(actual: impl Into<String>, src: SpanInfo) -> Self {
        FabError::NotIterable(
            NotIterable {
                actual: actual.into(),
                position: label(&src.position),
                code: source(&src.file),
            }
            .into(),
        )
    }

    pub fn target_conflict(name: impl Into<String>, src: SpanInfo) -> Self {
        FabError::TargetConflict(
            TargetConflict {
                name: name.into(),
                position: label(&src.position),
                code: source(&src.file),
            }
            .into(),
        )
    }

    pub fn absolute_output(path: impl Into<String>, src: SpanInfo) -> Self {
        FabError::AbsoluteOutput(
            AbsoluteOutput {
                path: path.into(),
                position: label(&src.position),
                code: source(&src.file),
            }
            .into(),
        )
    }

    pub fn no_outputs(src: SpanInfo) -> Self {
        FabError::NoOutputs(
            NoOutputs {
                position: label(&src.position),
                code: source(&src.file),
            }
            .into(),
        )
    }

    pub fn semantic(message: impl Into<String>, src: SpanInfo) -> Self {
        FabError::SemanticError(
            SemanticError {
                message: message.into(),
                position: label(&src.position),
                code: source(&src.file),
            }
            .into(),
        )
    }

    pub fn import_not_found(module: impl Into<String>, src: SpanInfo) -> Self {
        FabError::ImportNotFound(
            ImportNotFound {
                module: module.into(),
                position: label(&src.position),
                code: source(&src.file),
            }
            .into(),
        )
    }

    pub fn plugin_failure(
        plugin: impl Into<String>,
        message: impl Into<String>,
        src: SpanInfo,
    ) -> Self {
        FabError::PluginFailure(
            PluginFailure {
                plugin: plugin.into(),
                message: message.into(),
                position: label(&src.position),
                code: source(&src.file),
            }
            .into(),
        )
    }

    pub fn os_error(message: impl Into<String>, src: SpanInfo) -> Self {
        FabError::OsError(
            OsError {
                message: message.into(),
                position: label(&src.position),
                code: source(&src.file),
            }
            .into(),
        )
    }

    pub fn syntax_error(errors: Vec<SyntaxErrorItem>) -> Self {
        FabError::SyntaxError(SyntaxError { errors }.into())
    }
}

/// Converts a parser result into the pipeline's result type, turning nom's
/// verbose error trace into labelled syntax errors.
pub fn handle_parser(result: ParseResult<'_>) -> Result<FileAst, FabError> {
    match result {
        Ok((_, parsed)) => Ok(parsed),
        Err(error) => {
            // An error span covers all remaining input; highlight only the
            // next token of it.
            fn token_range(span: &nom_locate::LocatedSpan<&str, crate::nom_tools::State>) -> Range<usize> {
                let full = span.to_range();
                let token_len = span
                    .fragment()
                    .split_whitespace()
                    .next()
                    .map(str::len)
                    .unwrap_or(0)
                    .max(1);
                full.start..full.start + token_len.min(full.len().max(1))
            }

            let mut errors = Vec::new();
            for (span, error_kind) in error.errors.iter() {
                if let VerboseErrorKind::Context(message) = error_kind {
                    errors.push(SyntaxErrorItem {
                        position: label(&token_range(span)),
                        code: (&span.extra.file).into(),
                        message,
                    });
                }
            }

            if errors.is_empty() {
                if let Some((span, _)) = error.errors.first() {
                    errors.push(SyntaxErrorItem {
                        position: label(&token_range(span)),
                        code: (&span.extra.file).into(),
                        message: "unexpected input",
                    });
                }
            }

            Err(FabError::syntax_error(errors))
        }
    }
}
