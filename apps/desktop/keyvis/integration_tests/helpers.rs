use keyvis_core::bridge::{BridgeController, ControllerPhase};
use keyvis_core::config::BridgeConfig;
use keyvis_core::error::OracleError;
use keyvis_core::permission::PermissionOracle;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub const EVENTUALLY: Duration = Duration::from_secs(3);

pub const MONITOR_INTERVAL: Duration = Duration::from_millis(20);

/// OS stand-in the test flips by hand.
pub struct ToggleOracle {
    granted: AtomicBool,
    queries: AtomicUsize,
}

impl ToggleOracle {
    pub fn new(granted: bool) -> Arc<Self> {
        Arc::new(Self {
            granted: AtomicBool::new(granted),
            queries: AtomicUsize::new(0),
        })
    }

    pub fn set(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl PermissionOracle for ToggleOracle {
    fn query(&self) -> Result<bool, OracleError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.granted.load(Ordering::SeqCst))
    }
}

/// Slow core polling so only the host monitor can explain fast updates.
pub fn slow_poll_config() -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.permission.poll_interval_ms = 60_000;
    config.permission.open_preferences_when_denied = false;
    config
}

pub fn controller_with(oracle: &Arc<ToggleOracle>) -> BridgeController {
    let shared: Arc<dyn PermissionOracle> = oracle.clone();
    BridgeController::builder()
        .with_shared_oracle(shared)
        .with_config(slow_poll_config())
        .build()
        .expect("test config is valid")
}

pub async fn wait_until_running(controller: &BridgeController) {
    let mut phase = controller.subscribe_phase();
    tokio::time::timeout(
        EVENTUALLY,
        phase.wait_for(|phase| *phase == ControllerPhase::Running),
    )
    .await
    .expect("controller should reach Running")
    .expect("phase channel open");
}

pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + EVENTUALLY;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
