use crate::helpers::{MONITOR_INTERVAL, ToggleOracle, controller_with, eventually};

use keyvis::host_shell::PermissionMonitor;

use keyvis_core::bridge::{BridgeController, HostCallback};
use keyvis_core::permission::PermissionOracle;

use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Host-side permission monitor against a real controller
// The core polls once a minute here, so every fast update comes from the monitor
// ============================================================================

fn monitor_for(
    controller: &BridgeController,
    oracle: &Arc<ToggleOracle>,
) -> Arc<PermissionMonitor> {
    let shared: Arc<dyn PermissionOracle> = oracle.clone();
    Arc::new(PermissionMonitor::with_interval(
        controller,
        shared,
        MONITOR_INTERVAL,
    ))
}

/// **VALUE**: Verifies an OS change reaches the controller through a monitoring notification.
///
/// **WHY THIS MATTERS**: This is the host → core path that keeps the visualization current
/// without core-side polling.
///
/// **BUG THIS CATCHES**: Would catch the monitor comparing against the wrong baseline or
/// never notifying.
#[tokio::test]
async fn given_started_monitor_when_os_grants_then_controller_updated() {
    // GIVEN: A denied controller and a running monitor
    let oracle = ToggleOracle::new(false);
    let controller = controller_with(&oracle);
    controller.refresh_permission();
    let monitor = monitor_for(&controller, &oracle);
    monitor.start();

    // WHEN: The OS grants
    oracle.set(true);

    // THEN: The controller picks it up and the monitor sent one notification
    assert!(eventually(|| controller.get_permission()).await);
    assert!(eventually(|| monitor.notifications() == 1).await);

    // AND: A revoke is also propagated
    oracle.set(false);
    assert!(eventually(|| !controller.get_permission()).await);
    assert!(eventually(|| monitor.notifications() == 2).await);

    monitor.stop();
}

/// **VALUE**: Verifies the monitor only notifies on real changes.
///
/// **WHY THIS MATTERS**: Each notification costs the core an oracle query.
///
/// **BUG THIS CATCHES**: Would catch notifying on every tick.
#[tokio::test]
async fn given_stable_permission_when_monitoring_then_no_notifications() {
    let oracle = ToggleOracle::new(true);
    let controller = controller_with(&oracle);
    controller.refresh_permission();
    let monitor = monitor_for(&controller, &oracle);

    monitor.start();
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(monitor.notifications(), 0);
    assert!(oracle.queries() > 1, "Monitor should still be observing");
    monitor.stop();
}

/// **VALUE**: Verifies repeated starts share one observer thread.
///
/// **WHY THIS MATTERS**: The core re-arms monitoring when a host re-registers the callback.
///
/// **BUG THIS CATCHES**: Would catch one thread per start, which doubles notifications.
#[tokio::test]
async fn given_running_monitor_when_started_again_then_single_observer() {
    let oracle = ToggleOracle::new(false);
    let controller = controller_with(&oracle);
    controller.refresh_permission();
    let monitor = monitor_for(&controller, &oracle);

    monitor.start();
    monitor.start();
    monitor.start();
    assert!(monitor.is_running());

    oracle.set(true);
    assert!(eventually(|| controller.get_permission()).await);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(monitor.notifications(), 1, "One observer, one notification");
    monitor.stop();
    assert!(!monitor.is_running());
}

/// **VALUE**: Verifies the monitor does not keep the controller alive.
///
/// **WHY THIS MATTERS**: The controller owns the monitoring callback, which owns the
/// monitor. A strong back-reference would leak both.
///
/// **BUG THIS CATCHES**: Would catch the monitor holding a `BridgeController` clone.
#[tokio::test]
async fn given_monitor_when_controller_dropped_then_observer_exits() {
    let oracle = ToggleOracle::new(false);
    let controller = controller_with(&oracle);
    let weak = controller.downgrade();
    let monitor = monitor_for(&controller, &oracle);
    monitor.start();

    drop(controller);
    assert!(weak.upgrade().is_none(), "Monitor must not own the controller");

    oracle.set(true);
    assert!(
        eventually(|| !monitor.is_running()).await,
        "Observer should exit once the controller is gone"
    );
}

/// **VALUE**: Verifies the callback form starts the monitor when the core arms it.
///
/// **BUG THIS CATCHES**: Would catch `callback()` wrapping something other than `start`.
#[tokio::test]
async fn given_monitor_callback_when_notified_then_monitor_running() {
    let oracle = ToggleOracle::new(true);
    let controller = controller_with(&oracle);
    let monitor = monitor_for(&controller, &oracle);
    let callback = monitor.callback();

    assert!(!monitor.is_running());
    callback.notify();

    assert!(monitor.is_running());
    monitor.stop();
}

/// **VALUE**: Verifies a stopped monitor can be armed again by the core.
///
/// **WHY THIS MATTERS**: The controller stays in host-notified mode after the host stops
/// its monitor. When the core re-arms monitoring, someone has to be observing again.
///
/// **BUG THIS CATCHES**: Would catch `stop` leaving the monitor marked as started, which
/// turns every later arm into a no-op.
#[tokio::test]
async fn given_stopped_monitor_when_armed_again_then_observes_changes() {
    // GIVEN: A monitor that ran and was stopped
    let oracle = ToggleOracle::new(false);
    let controller = controller_with(&oracle);
    controller.refresh_permission();
    let monitor = monitor_for(&controller, &oracle);
    let callback = monitor.callback();
    callback.notify();
    monitor.stop();
    assert!(!monitor.is_running());

    // WHEN: The core arms monitoring again
    callback.notify();

    // THEN: The monitor runs and forwards the next OS change
    assert!(monitor.is_running());
    oracle.set(true);
    assert!(eventually(|| controller.get_permission()).await);
    assert!(eventually(|| monitor.notifications() == 1).await);

    monitor.stop();
}

/// **VALUE**: Verifies arming a monitor whose controller is gone leaves it restartable.
///
/// **BUG THIS CATCHES**: Would catch the early return keeping the started flag set.
#[tokio::test]
async fn given_dropped_controller_when_monitor_started_then_not_running() {
    let oracle = ToggleOracle::new(false);
    let controller = controller_with(&oracle);
    let monitor = monitor_for(&controller, &oracle);
    drop(controller);

    monitor.start();
    assert!(!monitor.is_running());

    monitor.start();
    assert!(!monitor.is_running(), "Still nothing to observe for");
}
