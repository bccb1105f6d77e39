/// Lifecycle phase of a [`BridgeController`](super::BridgeController).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    /// `start` has not been called.
    Uninitialized,
    /// The core thread is spawned; the startup permission query has not completed.
    Starting,
    /// The startup query has been stored; the core is live.
    Running,
}

/// Externally visible controller state: the phase plus, once running, the
/// current permission value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    Starting,
    Running { permission: bool },
}

/// How permission updates reach the core while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitoringMode {
    /// No monitoring callback: the core re-queries on a timer.
    Polling,
    /// The host observes the OS and notifies the core.
    HostNotified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionTransition {
    Granted,
    Revoked,
}

impl PermissionTransition {
    /// The transition a write from `previous` to `current` represents, if any.
    pub fn between(previous: bool, current: bool) -> Option<Self> {
        match (previous, current) {
            (false, true) => Some(Self::Granted),
            (true, false) => Some(Self::Revoked),
            _ => None,
        }
    }
}
