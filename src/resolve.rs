//! Maps untrusted archive identifiers to folders under the photos root.

use std::path::{Path, PathBuf};

/// Resolves `identifier` against `root`.
///
/// Returns `None` when the identifier contains the parent-directory token
/// `..`, or when the joined path is not an existing directory. Otherwise
/// returns the absolute candidate path.
///
/// This is a narrow traversal guard, not a general sanitizer: the
/// identifier arrives as a single path segment (the router never matches
/// `/` into it), so `..` is the only way out of the root. Identifiers with
/// single dots, like `2024.06`, resolve normally.
pub fn resolve(root: &Path, identifier: &str) -> Option<PathBuf> {
    if identifier.contains("..") {
        return None;
    }
    let candidate = root.join(identifier);
    if !candidate.is_dir() {
        return None;
    }
    std::path::absolute(candidate).ok()
}

#[cfg(test)]
mod tests {
    use super::resolve;

    #[test]
    fn traversal_token_rejected() {
        let root = tempfile::tempdir().unwrap();
        // Rejected even when the escaped path exists.
        for id in ["..", "../etc", "a/../b", "..hidden"] {
            assert!(resolve(root.path(), id).is_none(), "{id} should be rejected");
        }
    }

    #[test]
    fn missing_directory_rejected() {
        let root = tempfile::tempdir().unwrap();
        assert!(resolve(root.path(), "nope").is_none());
    }

    #[test]
    fn plain_file_rejected() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("notes.txt"), b"x").unwrap();
        assert!(resolve(root.path(), "notes.txt").is_none());
    }

    #[test]
    fn existing_directory_resolves_to_absolute_path() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("abc")).unwrap();
        let resolved = resolve(root.path(), "abc").expect("should resolve");
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("abc"));
    }

    #[test]
    fn single_dots_are_allowed() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("2024.06")).unwrap();
        assert!(resolve(root.path(), "2024.06").is_some());
    }
}
