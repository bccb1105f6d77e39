use std::sync::atomic::{AtomicBool, Ordering};

/// Value reported before the first write: unpermitted until proven otherwise.
pub const DEFAULT_PERMISSION: bool = false;

/// Process-lifetime "accessibility permission granted" flag.
///
/// Safe to read and write from the host UI context and the core context at
/// the same time. Writing never triggers callbacks; reacting to changes is
/// the controller's job.
#[derive(Debug)]
pub struct PermissionCell {
    granted: AtomicBool,
}

impl PermissionCell {
    /// Create a cell holding [`DEFAULT_PERMISSION`].
    pub const fn new() -> Self {
        Self::with_value(DEFAULT_PERMISSION)
    }

    pub const fn with_value(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
        }
    }

    /// Unconditionally overwrite the stored value.
    pub fn set_permission(&self, granted: bool) {
        self.granted.store(granted, Ordering::Release);
    }

    /// Current value. Never blocks.
    pub fn get_permission(&self) -> bool {
        self.granted.load(Ordering::Acquire)
    }

    /// Store `granted` and return the previous value in one atomic step.
    pub fn replace(&self, granted: bool) -> bool {
        self.granted.swap(granted, Ordering::AcqRel)
    }
}

impl Default for PermissionCell {
    fn default() -> Self {
        Self::new()
    }
}
