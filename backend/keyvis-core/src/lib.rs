pub mod bridge;
pub mod config;
pub mod error;
pub mod ffi;
pub mod permission;

#[cfg(test)]
mod tests;

pub use bridge::{BridgeController, CoreContext, HostCallback, StartOptions};
pub use config::BridgeConfig;
pub use permission::{PermissionCell, PermissionOracle, SystemOracle};
