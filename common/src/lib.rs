//! Shared building blocks for the KeyVis workspace.
//!
//! Holds the pieces every other crate depends on but that carry no
//! behavior of their own:
//!
//! - **common** (this crate): error location tracking
//! - **keyvis-core**: permission cell, oracle, bridge controller, C ABI
//! - **keyvis**: reference host shell wiring everything together

pub mod error;

pub use error::error_location::ErrorLocation;

#[cfg(test)]
mod tests;
