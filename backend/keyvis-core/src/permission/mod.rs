//! Accessibility permission state and the OS oracle that answers it.
//!
//! The cell is the single source of truth the host shell and the core
//! thread share. The oracle is the opaque OS query; it never fails from
//! the caller's point of view (see [`query_or_deny`]).

pub mod cell;
pub mod oracle;

pub use cell::{DEFAULT_PERMISSION, PermissionCell};
pub use oracle::{PermissionOracle, SystemOracle, query_or_deny};
