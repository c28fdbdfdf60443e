//! Source file representation for the Fabrique compiler.
//!
//! This module provides the `SourceFile` struct which pairs a file path with
//! its contents, along with the conversion into `miette`'s named-source type
//! used by diagnostic rendering.

use std::sync::Arc;

use miette::NamedSource;

/// A source file with its path and contents.
///
/// Cloning is cheap; the path and contents are shared. Every span and
/// diagnostic in the compiler ultimately points back into one of these.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFile {
    /// Path of the file, as given to the compiler
    pub path: Arc<String>,
    /// The source text
    pub code: Arc<String>,
}

impl SourceFile {
    /// Creates a new source file with the given path and source text.
    pub fn new(path: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            path: Arc::new(path.into()),
            code: Arc::new(code.into()),
        }
    }

    /// A placeholder file for values synthesized by the compiler itself
    /// (builtins, regeneration rules, directory-creation steps).
    pub fn synthetic() -> Self {
        Self::new("<builtin>", "")
    }

    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    pub fn code(&self) -> &str {
        self.code.as_str()
    }
}

impl std::fmt::Display for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

impl From<&SourceFile> for NamedSource<String> {
    fn from(file: &SourceFile) -> Self {
        NamedSource::new(file.path(), file.code().to_string())
    }
}

impl From<SourceFile> for NamedSource<String> {
    fn from(file: SourceFile) -> Self {
        (&file).into()
    }
}
