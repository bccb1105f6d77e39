use crate::helpers::{
    EVENTUALLY, MONITOR_INTERVAL, ToggleOracle, controller_with, wait_until_running,
};

use keyvis::host_shell::{PermissionMonitor, PreferencesOpener};
use keyvis::workload::{DENIED_STATUS, GRANTED_STATUS, StatusReport, StatusWorkload};

use keyvis_core::bridge::{MonitoringMode, StartOptions};
use keyvis_core::permission::PermissionOracle;

use std::sync::Arc;

use tokio::sync::mpsc;

// ============================================================================
// The shell wired the way main.rs wires it, with a scripted OS
// ============================================================================

async fn next_report(rx: &mut mpsc::UnboundedReceiver<StatusReport>) -> Option<StatusReport> {
    tokio::time::timeout(EVENTUALLY, rx.recv())
        .await
        .ok()
        .flatten()
}

/// **VALUE**: Verifies the full host/core loop: denied startup, host monitor armed by the
/// core, OS grant observed by the monitor, status workload redrawn.
///
/// **WHY THIS MATTERS**: This is what a user sees: the "permission required" text turning
/// into "ready" after they tick the box in System Preferences.
///
/// **BUG THIS CATCHES**: Would catch any broken link in the chain: monitoring not armed,
/// notifications not re-querying, or the workload missing the change feed.
#[tokio::test]
async fn given_denied_startup_when_os_grants_then_status_turns_ready() {
    // GIVEN: A denied OS and the shell's wiring
    let oracle = ToggleOracle::new(false);
    let controller = controller_with(&oracle);
    let shared: Arc<dyn PermissionOracle> = oracle.clone();
    let monitor = Arc::new(PermissionMonitor::with_interval(
        &controller,
        shared,
        MONITOR_INTERVAL,
    ));
    let (tx, mut rx) = mpsc::unbounded_channel();

    controller
        .start(
            StartOptions::new()
                .with_shared_monitoring_callback(monitor.callback())
                .with_workload(move |context| StatusWorkload::new().with_reports(tx).run(context)),
        )
        .unwrap();
    wait_until_running(&controller).await;
    assert_eq!(controller.mode(), MonitoringMode::HostNotified);

    // THEN: The first report asks for permission
    let first = next_report(&mut rx).await.expect("initial report");
    assert!(!first.granted);
    assert_eq!(first.lines, DENIED_STATUS);

    // WHEN: The user grants access
    oracle.set(true);

    // THEN: The workload reports ready
    let second = next_report(&mut rx).await.expect("report after grant");
    assert!(second.granted);
    assert_eq!(second.lines, GRANTED_STATUS);
    assert!(monitor.notifications() >= 1, "The grant came from the host monitor");

    monitor.stop();
}

/// **VALUE**: Verifies a preferences opener that cannot launch is harmless to the core.
///
/// **WHY THIS MATTERS**: On a denied startup the core asks the host to open System
/// Preferences; a broken launcher must not stop the core from reaching Running.
///
/// **BUG THIS CATCHES**: Would catch launcher errors propagating into the core thread.
#[tokio::test]
async fn given_broken_launcher_when_core_requests_preferences_then_core_keeps_running() {
    let oracle = ToggleOracle::new(false);
    let controller = controller_with(&oracle);
    controller.set_open_preferences(Some(Arc::new(
        PreferencesOpener::new()
            .with_launcher("/nonexistent/keyvis-launcher")
            .into_procedure(),
    )));

    controller.start(StartOptions::new()).unwrap();
    wait_until_running(&controller).await;

    controller.request_open_system_preferences();

    assert!(!controller.get_permission());
    controller.set_permission(true);
    assert!(controller.get_permission(), "Controller still serves reads and writes");
}
