//! File values: references to source files and build products.

use std::cell::Cell;

use crate::error::FabError;
use crate::nom_tools::SpanInfo;
use crate::platform;
use crate::types::TypeId;

use super::ValueMap;

/// A file in the build graph, either a source file or a generated output.
///
/// The `generated` flag is monotone: once a file has been named as a build
/// output it never reverts to being a source file. Files with absolute
/// paths can never be generated.
#[derive(Debug)]
pub struct File {
    filename: String,
    subdirectory: String,
    absolute: bool,
    generated: Cell<bool>,
    attributes: ValueMap,
    typ: TypeId,
    source: SpanInfo,
}

impl File {
    pub(crate) fn new(
        subdir: &str,
        path: &str,
        typ: TypeId,
        attributes: ValueMap,
        source: SpanInfo,
        generated: bool,
    ) -> Self {
        let filename = platform::filename_component(path);
        let own_subdir = platform::directory_of(path);
        let directory = if platform::path_is_absolute(path) {
            own_subdir
        } else {
            platform::join_path(subdir, &own_subdir)
        };

        Self {
            absolute: platform::path_is_absolute(&directory) || platform::path_is_absolute(path),
            filename,
            subdirectory: directory,
            generated: Cell::new(generated),
            attributes,
            typ,
            source,
        }
    }

    /// The filename without its directory.
    pub fn name(&self) -> &str {
        &self.filename
    }

    pub fn subdirectory(&self) -> &str {
        &self.subdirectory
    }

    /// The file's path relative to its root: subdirectory plus filename.
    pub fn full_name(&self) -> String {
        platform::join_path(&self.subdirectory, &self.filename)
    }

    /// The directory this file lives in.
    pub fn directory(&self) -> &str {
        &self.subdirectory
    }

    pub fn absolute(&self) -> bool {
        self.absolute
    }

    pub fn generated(&self) -> bool {
        self.generated.get()
    }

    /// Marks this file as a build output. Monotone: marking an
    /// already-generated file again is a no-op, and clearing is never done.
    pub fn set_generated(&self) -> Result<(), FabError> {
        if self.absolute {
            return Err(FabError::absolute_output(
                self.full_name(),
                self.source.clone(),
            ));
        }

        self.generated.set(true);
        Ok(())
    }

    /// A copy of this file with a different filename, in the same
    /// subdirectory. Used by string concatenation and prefixing; the copy
    /// is a fresh, ungenerated file.
    pub(crate) fn with_filename(&self, filename: String, source: SpanInfo) -> File {
        File {
            filename,
            subdirectory: self.subdirectory.clone(),
            absolute: self.absolute,
            generated: Cell::new(false),
            attributes: self.attributes.clone(),
            typ: self.typ,
            source,
        }
    }

    pub fn attributes(&self) -> &ValueMap {
        &self.attributes
    }

    pub fn type_id(&self) -> TypeId {
        self.typ
    }

    pub fn source(&self) -> &SpanInfo {
        &self.source
    }
}
