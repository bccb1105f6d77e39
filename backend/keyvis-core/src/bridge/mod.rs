//! Bridge between the core runtime and the host UI shell.
//!
//! The host shell calls [`BridgeController::start`] once (or again, to swap
//! its monitoring callback). The controller runs the core on its own OS
//! thread, keeps the [`PermissionCell`](crate::permission::PermissionCell)
//! current, and calls back into the host for the things only the host can
//! do: opening System Preferences and observing OS permission changes.
//!
//! # Caller contract
//!
//! Host callbacks run on whichever thread triggers them. The startup
//! requests run on the core thread; a repeated `start` arms monitoring on
//! its caller's thread, and explicit `request_open_system_preferences` calls
//! (including the C export) run on their caller's thread. Neither side may
//! assume the UI context: a host whose callback touches UI state must
//! redispatch to it itself.
//!
//! # Lifecycle
//!
//! `Uninitialized → Starting → Running`. There is no shutdown: the core
//! thread is detached and lives until the process exits.

mod callback;
mod context;
mod controller;
mod options;
mod state;

pub use callback::HostCallback;
pub use context::CoreContext;
pub use controller::{BridgeController, BridgeControllerBuilder, WeakBridgeController};
pub use options::{CoreWorkload, StartOptions, WorkloadFuture};
pub use state::{ControllerPhase, ControllerState, MonitoringMode, PermissionTransition};

pub(crate) use callback::{CallbackSlot, invoke_host_callback};
