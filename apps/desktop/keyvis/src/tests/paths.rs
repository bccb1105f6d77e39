// Unit tests for directory helpers

use crate::error::KeyvisError;
use crate::paths::ensure_dir;

use tempfile::tempdir;

/// **VALUE**: Verifies nested directories are created on demand.
///
/// **WHY THIS MATTERS**: On first launch neither the log nor the config directory exists.
///
/// **BUG THIS CATCHES**: Would catch `create_dir` being used instead of `create_dir_all`.
#[test]
fn given_missing_nested_dir_when_ensured_then_created() {
    let root = tempdir().unwrap();
    let nested = root.path().join("keyvis").join("logs");

    let result = ensure_dir(nested.clone()).unwrap();

    assert_eq!(result, nested);
    assert!(nested.is_dir());
}

/// **VALUE**: Verifies an uncreatable directory maps to `KeyvisError::Directory`.
///
/// **BUG THIS CATCHES**: Would catch the IO error escaping unconverted or as another variant.
#[test]
fn given_path_under_file_when_ensured_then_directory_error() {
    let root = tempdir().unwrap();
    let file = root.path().join("not-a-dir");
    std::fs::write(&file, "x").unwrap();

    let result = ensure_dir(file.join("child"));

    assert!(
        matches!(result, Err(KeyvisError::Directory { .. })),
        "Expected Directory error, got {result:?}"
    );
}
