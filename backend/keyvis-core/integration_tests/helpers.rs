//! Test helpers for bridge integration tests.
//!
//! - Scripted permission oracles that count their queries
//! - Counting host callbacks
//! - Waiting on the controller's phase and on arbitrary conditions

use keyvis_core::bridge::{BridgeController, ControllerPhase, HostCallback};
use keyvis_core::config::BridgeConfig;
use keyvis_core::error::OracleError;
use keyvis_core::permission::PermissionOracle;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Upper bound for anything the core thread is expected to do "soon".
pub const EVENTUALLY: Duration = Duration::from_secs(3);

/// Oracle whose answer the test controls, counting every query.
#[derive(Default)]
pub struct ScriptedOracle {
    granted: AtomicBool,
    queries: AtomicUsize,
}

impl ScriptedOracle {
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

impl PermissionOracle for ScriptedOracle {
    fn query(&self) -> Result<bool, OracleError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.granted.load(Ordering::SeqCst))
    }
}

/// Host callback that only counts its invocations.
#[derive(Default)]
pub struct CountingCallback {
    calls: AtomicUsize,
}

impl CountingCallback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HostCallback for CountingCallback {
    fn notify(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Config with a short poll interval so polling tests stay fast.
pub fn fast_config() -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.permission.poll_interval_ms = 50;
    config.permission.open_preferences_when_denied = false;
    config
}

pub fn controller_with(oracle: &Arc<ScriptedOracle>, config: BridgeConfig) -> BridgeController {
    let oracle: Arc<dyn PermissionOracle> = oracle.clone();
    BridgeController::builder()
        .with_shared_oracle(oracle)
        .with_config(config)
        .build()
        .expect("test config should be valid")
}

/// Wait until the controller reports `Running`.
pub async fn wait_until_running(controller: &BridgeController) {
    let mut phases = controller.subscribe_phase();
    let reached = tokio::time::timeout(
        EVENTUALLY,
        phases.wait_for(|phase| *phase == ControllerPhase::Running),
    )
    .await
    .map(|result| result.is_ok())
    .unwrap_or(false);

    assert!(reached, "Controller should reach Running within {EVENTUALLY:?}");
}

/// Poll `condition` until it holds or the deadline passes.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + EVENTUALLY;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
