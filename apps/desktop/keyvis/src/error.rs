use common::ErrorLocation;

use keyvis_core::error::{BridgeError, ConfigError, CoreError};

use std::panic::Location;

use serde::Serialize;
use thiserror::Error;

/// Errors raised by the host shell.
///
/// The core never sees these: preferences failures are logged on the host
/// side and startup failures end the process.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum KeyvisError {
    /// Error from this app (logger, runtime)
    #[error("Keyvis Error: {message} {location}")]
    Keyvis {
        message: String,
        location: ErrorLocation,
    },

    /// Error from keyvis-core (config, start)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },

    /// System Preferences could not be opened
    #[error("Preferences Error: {message} {location}")]
    Preferences {
        message: String,
        location: ErrorLocation,
    },

    /// A platform directory could not be resolved or created
    #[error("Directory Error: {message} {location}")]
    Directory {
        message: String,
        location: ErrorLocation,
    },
}

impl From<CoreError> for KeyvisError {
    #[track_caller]
    fn from(error: CoreError) -> Self {
        KeyvisError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ConfigError> for KeyvisError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        KeyvisError::from(CoreError::from(error))
    }
}

impl From<BridgeError> for KeyvisError {
    #[track_caller]
    fn from(error: BridgeError) -> Self {
        KeyvisError::from(CoreError::from(error))
    }
}
