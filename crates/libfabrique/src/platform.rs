//! Path manipulation helpers for build-graph files.
//!
//! Fabrique paths are plain forward-slash strings: they name files in build
//! descriptions and backend output, and are never required to exist on the
//! host filesystem during evaluation.

/// Joins two path components, ignoring empty ones.
pub fn join_path(a: &str, b: &str) -> String {
    if a.is_empty() {
        return b.to_string();
    }
    if b.is_empty() {
        return a.to_string();
    }
    format!("{}/{}", a.trim_end_matches('/'), b)
}

/// Joins any number of path components.
pub fn join_paths<'a>(components: impl IntoIterator<Item = &'a str>) -> String {
    components
        .into_iter()
        .fold(String::new(), |acc, c| join_path(&acc, c))
}

pub fn path_is_absolute(path: &str) -> bool {
    path.starts_with('/')
}

/// The directory part of a path, or the empty string if there is none.
pub fn directory_of(path: &str) -> String {
    match path.rfind('/') {
        Some(0) => "/".to_string(),
        Some(i) => path[..i].to_string(),
        None => String::new(),
    }
}

/// The final component of a path.
pub fn filename_component(path: &str) -> String {
    match path.rfind('/') {
        Some(i) => path[i + 1..].to_string(),
        None => path.to_string(),
    }
}

/// The filename without its extension.
pub fn base_name(filename: &str) -> String {
    let name = filename_component(filename);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(i) => name[..i].to_string(),
    }
}

/// The extension of a filename, without the dot.
pub fn file_extension(filename: &str) -> String {
    let name = filename_component(filename);
    match name.rfind('.') {
        Some(0) | None => String::new(),
        Some(i) => name[i + 1..].to_string(),
    }
}

/// A shell command that creates a directory if it does not already exist.
pub fn create_dir_command(directory: &str) -> String {
    format!("if [ ! -e \"{directory}\" ]; then mkdir -p \"{directory}\"; fi")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join() {
        assert_eq!(join_path("a", "b"), "a/b");
        assert_eq!(join_path("", "b"), "b");
        assert_eq!(join_path("a", ""), "a");
        assert_eq!(join_path("a/", "b"), "a/b");
    }

    #[test]
    fn components() {
        assert_eq!(directory_of("a/b/c.o"), "a/b");
        assert_eq!(directory_of("c.o"), "");
        assert_eq!(filename_component("a/b/c.o"), "c.o");
        assert_eq!(base_name("a/b/c.tar"), "c");
        assert_eq!(file_extension("c.tar"), "tar");
        assert_eq!(file_extension("Makefile"), "");
        assert_eq!(base_name(".hidden"), ".hidden");
    }

    #[test]
    fn absolute() {
        assert!(path_is_absolute("/usr/bin"));
        assert!(!path_is_absolute("usr/bin"));
    }
}
