use crate::error::KeyvisError;

use common::ErrorLocation;

use keyvis_core::ffi::CONFIG_DIR_ENV;

use std::fs::create_dir_all;
use std::panic::Location;
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "keyvis";

const LOG_DIR_NAME: &str = "logs";

/// `{data_local_dir}/keyvis/logs`, created if missing.
pub fn log_dir() -> Result<PathBuf, KeyvisError> {
    let base = dirs::data_local_dir().ok_or_else(|| KeyvisError::Directory {
        message: "Failed to resolve the local data directory".to_string(),
        location: ErrorLocation::from(Location::caller()),
    })?;

    ensure_dir(base.join(APP_DIR_NAME).join(LOG_DIR_NAME))
}

/// `$KEYVIS_CONFIG_DIR` if set, otherwise `{config_dir}/keyvis`, created if missing.
///
/// Shares the variable with the C surface so a native host and this shell
/// read the same `config.json`.
pub fn config_dir() -> Result<PathBuf, KeyvisError> {
    let dir = match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::config_dir()
            .ok_or_else(|| KeyvisError::Directory {
                message: "Failed to resolve the config directory".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?
            .join(APP_DIR_NAME),
    };

    ensure_dir(dir)
}

#[track_caller]
pub fn ensure_dir(dir: PathBuf) -> Result<PathBuf, KeyvisError> {
    create_dir_all(&dir).map_err(|e| directory_error(&dir, e))?;
    Ok(dir)
}

#[track_caller]
fn directory_error(dir: &Path, error: std::io::Error) -> KeyvisError {
    KeyvisError::Directory {
        message: format!("Failed to create directory {}: {error}", dir.display()),
        location: ErrorLocation::from(Location::caller()),
    }
}
