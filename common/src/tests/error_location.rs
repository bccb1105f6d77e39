use crate::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Verifies that `ErrorLocation::from()` records this file and a real position.
///
/// **WHY THIS MATTERS**: Every bridge, config and oracle error carries an ErrorLocation.
/// If capture breaks, log lines from the core thread stop pointing at the failing call.
///
/// **BUG THIS CATCHES**: Would catch if file/line/column extraction from
/// `Location::caller()` regresses.
#[test]
fn given_location_caller_when_error_location_created_then_captures_file_line_column() {
    // GIVEN/WHEN: Capturing the current location
    let location = ErrorLocation::from(Location::caller());

    // THEN: Should point into this file with a usable position
    assert!(
        location.file.contains("error_location.rs"),
        "Should capture file path"
    );
    assert!(location.line > 0, "Should capture line number");
    assert!(location.column > 0, "Should capture column number");
}

/// **VALUE**: Verifies the `[file:line:column]` Display format.
///
/// **WHY THIS MATTERS**: Error messages embed the location verbatim; the host shell log
/// file is only greppable if the format stays stable.
///
/// **BUG THIS CATCHES**: Would catch a changed bracket/colon layout.
#[test]
fn given_error_location_when_formatted_then_produces_bracketed_format() {
    // GIVEN: A hand-built location
    let location = ErrorLocation {
        file: "backend/keyvis-core/src/bridge/controller.rs",
        line: 42,
        column: 7,
    };

    // WHEN: Formatting as string
    let formatted = location.to_string();

    // THEN: Should produce "[file:line:column]"
    assert_eq!(
        formatted,
        "[backend/keyvis-core/src/bridge/controller.rs:42:7]"
    );
}

/// **VALUE**: Verifies that `#[track_caller]` propagation gives each call site its own line.
///
/// **WHY THIS MATTERS**: Error constructors in keyvis-core are `#[track_caller]` helpers.
/// Without propagation every error would report the helper, not the failure site.
///
/// **BUG THIS CATCHES**: Would catch removal of `#[track_caller]` in helper chains.
#[test]
fn given_multiple_call_sites_when_capturing_location_then_each_has_unique_line() {
    // GIVEN: A helper that captures its caller
    #[track_caller]
    fn capture_location() -> ErrorLocation {
        ErrorLocation::from(Location::caller())
    }

    // WHEN: Capturing from two consecutive lines
    let loc1 = capture_location();
    let loc2 = capture_location();

    // THEN: Same file, sequential lines
    assert_eq!(loc1.file, loc2.file, "Should have same file");
    assert_eq!(loc1.line + 1, loc2.line, "Lines should be sequential");
}

/// **VALUE**: Verifies `file_name()` strips directories on both separator styles.
///
/// **WHY THIS MATTERS**: The host shell logs short file names next to messages.
///
/// **BUG THIS CATCHES**: Would catch a split that only handles `/`.
#[test]
fn given_nested_paths_when_file_name_called_then_returns_last_component() {
    let unix = ErrorLocation {
        file: "backend/keyvis-core/src/ffi.rs",
        line: 1,
        column: 1,
    };
    let windows = ErrorLocation {
        file: "backend\\keyvis-core\\src\\ffi.rs",
        line: 1,
        column: 1,
    };
    let bare = ErrorLocation {
        file: "ffi.rs",
        line: 1,
        column: 1,
    };

    assert_eq!(unix.file_name(), "ffi.rs");
    assert_eq!(windows.file_name(), "ffi.rs");
    assert_eq!(bare.file_name(), "ffi.rs");
}

/// **VALUE**: Verifies ErrorLocation serializes as a plain object.
///
/// **WHY THIS MATTERS**: Host shell errors derive Serialize and embed locations.
///
/// **BUG THIS CATCHES**: Would catch removal of the Serialize derive.
#[test]
fn given_error_location_when_serialized_then_contains_fields() {
    let location = ErrorLocation {
        file: "ffi.rs",
        line: 3,
        column: 9,
    };

    let json = serde_json::to_string(&location).unwrap();

    assert_eq!(json, r#"{"file":"ffi.rs","line":3,"column":9}"#);
}
