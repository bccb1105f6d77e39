// Unit tests for error module
// Tests serialization and conversion from core errors

use crate::error::KeyvisError;

use common::ErrorLocation;

use keyvis_core::error::ConfigError;

use std::panic::Location;

/// **VALUE**: Verifies that host shell errors serialize with a variant tag.
///
/// **WHY THIS MATTERS**: Errors are written to the log and may be forwarded to a native
/// host as JSON. A bare string would lose the variant and the location.
///
/// **BUG THIS CATCHES**: Would catch removal of `#[derive(Serialize)]` or the serde tag.
#[test]
fn given_keyvis_error_when_serialized_then_contains_tag_and_message() {
    // GIVEN: A preferences error
    let err = KeyvisError::Preferences {
        message: String::from("launcher missing"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Serializing to JSON
    let json = serde_json::to_string(&err).unwrap();

    // THEN: Tag and message are present
    assert!(json.contains(r#""type":"Preferences""#), "JSON: {json}");
    assert!(json.contains("launcher missing"), "JSON: {json}");
}

/// **VALUE**: Verifies core config errors convert into `KeyvisError::Core`.
///
/// **WHY THIS MATTERS**: `main` uses `?` on `BridgeConfig::load` and the builder.
///
/// **BUG THIS CATCHES**: Would catch a conversion that drops the core message.
#[test]
fn given_config_error_when_converted_then_core_variant_keeps_reason() {
    let config_err = ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        reason: String::from("Invalid poll interval: 1ms"),
    };

    let err = KeyvisError::from(config_err);

    match err {
        KeyvisError::Core { message, .. } => {
            assert!(message.contains("Invalid poll interval"), "message: {message}");
        }
        other => panic!("Expected Core variant, got {other:?}"),
    }
}

/// **VALUE**: Verifies the Display format carries the location suffix.
///
/// **BUG THIS CATCHES**: Would catch a changed `#[error]` format string.
#[test]
fn given_directory_error_when_displayed_then_includes_location() {
    let err = KeyvisError::Directory {
        message: String::from("no home"),
        location: ErrorLocation {
            file: "paths.rs",
            line: 10,
            column: 5,
        },
    };

    assert_eq!(err.to_string(), "Directory Error: no home [paths.rs:10:5]");
}
