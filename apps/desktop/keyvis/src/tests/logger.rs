// Unit tests for logger module initialization logic

use crate::error::KeyvisError;
use crate::logger::{LOG_FILE_NAME, initialize, initialize_internal, log_file_path};

use std::path::PathBuf;

use tempfile::tempdir;

/// **VALUE**: Verifies that calling initialize() multiple times doesn't panic or fail.
///
/// **WHY THIS MATTERS**: Tests and the binary can both reach initialization. fern refuses
/// to install a second global logger, so the guard has to turn repeats into no-ops.
///
/// **BUG THIS CATCHES**: Would catch removal of the Once or AtomicBool guards.
#[test]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN: A writable temporary directory
    let dir = tempdir().unwrap();

    // WHEN: Calling initialize twice
    let result1 = initialize(dir.path());
    let result2 = initialize(dir.path());

    // THEN: Both return Ok
    assert!(result1.is_ok(), "First initialization should succeed");
    assert!(result2.is_ok(), "Second initialization should be a no-op");
}

/// **VALUE**: Verifies an unwritable log directory is reported instead of panicking.
///
/// **WHY THIS MATTERS**: The log directory is the first thing `main` touches. A panic here
/// would hide the reason the shell failed to start.
///
/// **BUG THIS CATCHES**: Would catch unwrapping the `fern::log_file()` result.
///
/// **NOTE**: Calls the internal initializer so the process-wide guard from other tests
/// cannot turn this into a no-op.
#[test]
fn given_invalid_log_dir_when_initializing_then_returns_keyvis_error() {
    // GIVEN: A path under a regular file, which can never be a directory
    let invalid_dir = PathBuf::from("/dev/null/invalid-path");

    // WHEN: Initializing
    let result = initialize_internal(&invalid_dir);

    // THEN: A Keyvis variant naming the file
    match result {
        Err(KeyvisError::Keyvis { message, .. }) => {
            assert!(message.contains(LOG_FILE_NAME), "message: {message}");
        }
        other => panic!("Expected KeyvisError::Keyvis, got {other:?}"),
    }
}

#[test]
fn given_log_dir_when_resolving_file_then_uses_keyvis_log() {
    let path = log_file_path(&PathBuf::from("/tmp/keyvis-logs"));

    assert_eq!(path, PathBuf::from("/tmp/keyvis-logs/keyvis.log"));
}
