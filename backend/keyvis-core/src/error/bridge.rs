use common::ErrorLocation;

use std::io::Error as IoError;
use std::panic::Location;

use thiserror::Error as ThisError;

/// Failures of the bridge lifecycle itself.
///
/// Only surfaces through the Rust API of [`BridgeController::start`](crate::bridge::BridgeController::start);
/// the C surface logs and swallows it.
#[derive(Debug, ThisError)]
pub enum BridgeError {
    #[error("Core Context Spawn Error: {message} {location}")]
    Spawn {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Core Runtime Error: {message} {location}")]
    Runtime {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },
}

impl BridgeError {
    #[track_caller]
    pub(crate) fn runtime(error: IoError) -> Self {
        BridgeError::Runtime {
            message: format!("Failed to build core runtime: {error}"),
            location: ErrorLocation::from(Location::caller()),
            source: error,
        }
    }
}

impl From<IoError> for BridgeError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        BridgeError::Spawn {
            message: format!("Failed to spawn core execution context: {error}"),
            location: ErrorLocation::from(Location::caller()),
            source: error,
        }
    }
}
