use crate::bridge::controller::BridgeController;
use crate::config::BridgeConfig;

use tokio::sync::watch;

/// What the core workload can see of the bridge.
///
/// Read access to the permission, a change feed, and the one UI action the
/// core may ask for.
#[derive(Clone, Debug)]
pub struct CoreContext {
    controller: BridgeController,
}

impl CoreContext {
    pub(crate) fn new(controller: BridgeController) -> Self {
        Self { controller }
    }

    pub fn has_permission(&self) -> bool {
        self.controller.get_permission()
    }

    /// Receiver that wakes whenever the stored permission changes value.
    pub fn permission_changes(&self) -> watch::Receiver<bool> {
        self.controller.subscribe_permission()
    }

    /// Ask the host shell to open System Preferences. Fire-and-forget.
    pub fn request_open_system_preferences(&self) {
        self.controller.request_open_system_preferences();
    }

    pub fn config(&self) -> &BridgeConfig {
        self.controller.config()
    }
}
