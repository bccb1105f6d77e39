// Unit tests for bridge config load/save/validate

use crate::config::BridgeConfig;
use crate::error::config::ConfigError;

use std::time::Duration;

use tempfile::tempdir;

/// **VALUE**: Verifies a missing config file yields defaults rather than an error.
///
/// **WHY THIS MATTERS**: First launch has no config.json; the host shell must still start.
///
/// **BUG THIS CATCHES**: Would catch `load()` treating NotFound as a read failure.
#[test]
fn given_missing_file_when_loading_then_returns_defaults() {
    let dir = tempdir().unwrap();

    let config = BridgeConfig::load(dir.path()).unwrap();

    assert_eq!(config, BridgeConfig::default());
    assert_eq!(config.permission.poll_interval(), Duration::from_millis(500));
    assert!(config.permission.open_preferences_when_denied);
    assert_eq!(config.core.thread_name, "keyvis-core");
}

/// **VALUE**: Verifies save then load returns the same config.
///
/// **BUG THIS CATCHES**: Would catch fields skipped by serde or a broken temp-file rename.
#[test]
fn given_saved_config_when_loaded_then_values_survive() {
    let dir = tempdir().unwrap();
    let mut config = BridgeConfig::default();
    config.permission.poll_interval_ms = 2_000;
    config.permission.open_preferences_when_denied = false;
    config.core.thread_name = String::from("visualizer");

    config.save(dir.path()).unwrap();
    let loaded = BridgeConfig::load(dir.path()).unwrap();

    assert_eq!(loaded, config);
    assert!(
        !dir.path().join("config.json.tmp").exists(),
        "Temp file should be renamed away"
    );
}

/// **VALUE**: Verifies a partial file is completed with defaults.
///
/// **WHY THIS MATTERS**: Users hand-edit config.json and usually only set one field.
///
/// **BUG THIS CATCHES**: Would catch a missing `#[serde(default)]` on a section.
#[test]
fn given_partial_file_when_loading_then_missing_fields_use_defaults() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        r#"{ "permission": { "poll_interval_ms": 250 } }"#,
    )
    .unwrap();

    let config = BridgeConfig::load(dir.path()).unwrap();

    assert_eq!(config.version, 1);
    assert_eq!(config.permission.poll_interval_ms, 250);
    assert!(config.permission.open_preferences_when_denied);
    assert_eq!(config.core.thread_name, "keyvis-core");
}

/// **VALUE**: Verifies corrupted JSON is reported as a parse error.
///
/// **BUG THIS CATCHES**: Would catch silently accepting garbage.
#[test]
fn given_corrupted_file_when_loading_then_returns_parse_error() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("config.json"), "{ not json").unwrap();

    let result = BridgeConfig::load(dir.path());

    assert!(
        matches!(result, Err(ConfigError::ParseError { .. })),
        "Expected ParseError, got {result:?}"
    );
}

/// **VALUE**: Verifies `load_or_default` degrades instead of failing.
///
/// **WHY THIS MATTERS**: The C surface has no way to report a bad config file.
///
/// **BUG THIS CATCHES**: Would catch the fallback path propagating the error.
#[test]
fn given_corrupted_file_when_loading_or_default_then_returns_defaults() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("config.json"), "not json at all").unwrap();

    assert_eq!(
        BridgeConfig::load_or_default(dir.path()),
        BridgeConfig::default()
    );
}

/// **VALUE**: Verifies the poll interval bounds.
///
/// **WHY THIS MATTERS**: A zero interval would spin the core thread; a huge one would make
/// polling mode useless.
///
/// **BUG THIS CATCHES**: Would catch off-by-one bounds or missing validation.
#[test]
fn given_out_of_range_poll_interval_when_validated_then_rejected() {
    let mut config = BridgeConfig::default();

    for (interval, valid) in [(0, false), (49, false), (50, true), (60_000, true), (60_001, false)] {
        config.permission.poll_interval_ms = interval;
        assert_eq!(
            config.validate().is_ok(),
            valid,
            "poll_interval_ms={interval} validity"
        );
    }
}

/// **VALUE**: Verifies version and thread-name validation.
///
/// **BUG THIS CATCHES**: Would catch accepting configs written by a newer build, or
/// thread names that make `std::thread::Builder::spawn` panic.
#[test]
fn given_invalid_version_or_thread_name_when_validated_then_rejected() {
    let mut config = BridgeConfig::default();
    config.version = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError { .. })
    ));

    let mut config = BridgeConfig::default();
    config.version = 99;
    assert!(config.validate().is_err());

    let mut config = BridgeConfig::default();
    config.core.thread_name = String::from("   ");
    assert!(config.validate().is_err());

    let mut config = BridgeConfig::default();
    config.core.thread_name = String::from("core\0thread");
    assert!(config.validate().is_err());
}

/// **VALUE**: Verifies that saving refuses an invalid config.
///
/// **BUG THIS CATCHES**: Would catch writing a file that the next `load()` rejects.
#[test]
fn given_invalid_config_when_saving_then_nothing_is_written() {
    let dir = tempdir().unwrap();
    let mut config = BridgeConfig::default();
    config.permission.poll_interval_ms = 1;

    let result = config.save(dir.path());

    assert!(result.is_err());
    assert!(!dir.path().join("config.json").exists());
}
