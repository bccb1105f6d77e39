//! Host-side half of the bridge.
//!
//! What a native shell (Swift on macOS) would do, written in Rust so the
//! binary runs headless: open System Preferences when the core asks, and
//! observe the OS permission once the core asks for monitoring.

pub mod monitor;
pub mod preferences;

pub use monitor::PermissionMonitor;
pub use preferences::{ACCESSIBILITY_PANE_URL, PreferencesOpener};
