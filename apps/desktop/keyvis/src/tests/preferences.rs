// Unit tests for the System Preferences opener

use crate::error::KeyvisError;
use crate::host_shell::{ACCESSIBILITY_PANE_URL, PreferencesOpener};

/// **VALUE**: Verifies the platform default launcher.
///
/// **WHY THIS MATTERS**: Only macOS has the `x-apple.systempreferences` scheme.
///
/// **BUG THIS CATCHES**: Would catch trying to run `open` on Linux, where it is a
/// different program entirely.
#[test]
fn given_default_opener_when_inspected_then_launcher_matches_platform() {
    let opener = PreferencesOpener::new();

    if cfg!(target_os = "macos") {
        assert_eq!(opener.launcher(), Some("open"));
    } else {
        assert_eq!(opener.launcher(), None);
    }
}

/// **VALUE**: Verifies the deep link targets the Accessibility list.
#[test]
fn given_pane_url_then_points_at_accessibility_privacy() {
    assert!(ACCESSIBILITY_PANE_URL.starts_with("x-apple.systempreferences:"));
    assert!(ACCESSIBILITY_PANE_URL.ends_with("Privacy_Accessibility"));
}

/// **VALUE**: Verifies a missing launcher is a logged no-op.
///
/// **BUG THIS CATCHES**: Would catch treating "nothing to launch" as an error.
#[test]
fn given_no_launcher_when_opening_then_ok() {
    let opener = PreferencesOpener::new().without_launcher();

    assert!(opener.open().is_ok());
}

/// **VALUE**: Verifies a launcher that cannot be spawned yields a Preferences error.
///
/// **WHY THIS MATTERS**: The error must be reportable in the shell's log.
///
/// **BUG THIS CATCHES**: Would catch panicking on spawn failure (the `expect` pattern).
#[test]
fn given_missing_launcher_binary_when_opening_then_preferences_error() {
    let opener = PreferencesOpener::new().with_launcher("/nonexistent/keyvis-launcher");

    let result = opener.open();

    match result {
        Err(KeyvisError::Preferences { message, .. }) => {
            assert!(message.contains("/nonexistent/keyvis-launcher"), "message: {message}");
        }
        other => panic!("Expected Preferences error, got {other:?}"),
    }
}

/// **VALUE**: Verifies the procedure form swallows launcher failures.
///
/// **WHY THIS MATTERS**: The controller calls this on the core thread; a failure to open
/// System Preferences must stay on the host side.
///
/// **BUG THIS CATCHES**: Would catch the procedure panicking on a failed open.
#[test]
fn given_failing_launcher_when_procedure_called_then_no_panic() {
    let procedure = PreferencesOpener::new()
        .with_launcher("/nonexistent/keyvis-launcher")
        .into_procedure();

    procedure();
}

#[cfg(unix)]
#[test]
fn given_working_launcher_when_opening_then_ok() {
    let opener = PreferencesOpener::new().with_launcher("true");

    assert!(opener.open().is_ok());
}

/// **VALUE**: Verifies every launched process is waited on.
///
/// **WHY THIS MATTERS**: Each request from the core spawns a launcher. Without a wait each
/// one lingers as a zombie until the shell exits.
///
/// **BUG THIS CATCHES**: Would catch dropping the child process without reaping it.
#[cfg(unix)]
#[test]
fn given_launched_process_when_it_exits_then_reaper_collects_status() {
    let opener = PreferencesOpener::new().with_launcher("true");

    let reaper = opener.launch().unwrap().expect("a launcher was spawned");
    let status = reaper.join().unwrap();

    assert!(status.is_some_and(|status| status.success()));
}

/// **VALUE**: Verifies a launcher that exits with failure is still reaped and reported.
#[cfg(unix)]
#[test]
fn given_failing_launcher_process_when_reaped_then_status_is_failure() {
    let opener = PreferencesOpener::new().with_launcher("false");

    let reaper = opener.launch().unwrap().expect("a launcher was spawned");
    let status = reaper.join().unwrap();

    assert!(status.is_some_and(|status| !status.success()));
}

#[test]
fn given_no_launcher_when_launching_then_nothing_to_reap() {
    let opener = PreferencesOpener::new().without_launcher();

    assert!(opener.launch().unwrap().is_none());
}
