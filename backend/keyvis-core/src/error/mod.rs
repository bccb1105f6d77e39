pub mod bridge;
pub mod config;
pub mod oracle;

pub use bridge::BridgeError;
pub use config::ConfigError;
pub use oracle::OracleError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Bridge(#[from] bridge::BridgeError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Oracle(#[from] oracle::OracleError),
}
