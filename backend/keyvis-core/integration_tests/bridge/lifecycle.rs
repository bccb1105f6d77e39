use crate::helpers::{
    CountingCallback, EVENTUALLY, ScriptedOracle, controller_with, eventually, fast_config,
    wait_until_running,
};

use keyvis_core::bridge::{
    ControllerPhase, ControllerState, HostCallback, MonitoringMode, StartOptions,
};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

// ============================================================================
// Public API tests for the controller lifecycle
// Uninitialized -> Starting -> Running, and repeated start calls
// ============================================================================

/// **VALUE**: Verifies the state of a controller nobody has started.
///
/// **WHY THIS MATTERS**: The host may read the permission before calling start.
///
/// **BUG THIS CATCHES**: Would catch construction querying the oracle or defaulting to granted.
#[test]
fn given_unstarted_controller_when_inspected_then_uninitialized_and_not_granted() {
    // GIVEN: A controller whose oracle would say "granted"
    let oracle = ScriptedOracle::new(true);
    let controller = controller_with(&oracle, fast_config());

    // THEN: Nothing has run yet
    assert_eq!(controller.state(), ControllerState::Uninitialized);
    assert!(!controller.get_permission(), "Default before any write is false");
    assert_eq!(oracle.queries(), 0, "Construction must not query the oracle");
    assert_eq!(controller.mode(), MonitoringMode::Polling);
}

/// **VALUE**: Verifies `start` returns promptly even when the core workload runs for a long time.
///
/// **WHY THIS MATTERS**: The host shell calls start before entering its UI loop. If start
/// waited on the workload, the window would never appear.
///
/// **BUG THIS CATCHES**: Would catch running the workload (or the oracle query) on the
/// caller's thread.
#[tokio::test]
async fn given_long_running_workload_when_started_then_returns_promptly() {
    // GIVEN: A workload that would run for a minute
    let oracle = ScriptedOracle::new(true);
    let controller = controller_with(&oracle, fast_config());
    let options = StartOptions::new().with_workload(|_context| async {
        tokio::time::sleep(Duration::from_secs(60)).await;
    });

    // WHEN: Starting
    let began = Instant::now();
    let result = controller.start(options);
    let elapsed = began.elapsed();

    // THEN: Returns well before the workload could finish
    assert!(result.is_ok(), "start should succeed: {result:?}");
    assert!(
        elapsed < Duration::from_millis(500),
        "start must not block on the workload (took {elapsed:?})"
    );
    assert_ne!(controller.phase(), ControllerPhase::Uninitialized);

    // AND: The core still reaches Running
    wait_until_running(&controller).await;
}

/// **VALUE**: Verifies the startup query is stored before the controller reports Running.
///
/// **WHY THIS MATTERS**: Permission-dependent behavior must see the real answer, never the
/// placeholder default.
///
/// **BUG THIS CATCHES**: Would catch entering Running before `set_permission`.
#[tokio::test]
async fn given_granting_oracle_when_started_then_running_with_permission() {
    let oracle = ScriptedOracle::new(true);
    let controller = controller_with(&oracle, fast_config());

    controller.start(StartOptions::new()).unwrap();
    wait_until_running(&controller).await;

    assert_eq!(
        controller.state(),
        ControllerState::Running { permission: true }
    );
    assert!(oracle.queries() >= 1, "Startup query should have run");
}

/// **VALUE**: Verifies `start(None)` followed by `start(Some(cb))` neither deadlocks nor
/// loses the callback.
///
/// **WHY THIS MATTERS**: Hosts that register monitoring late must still get it armed.
///
/// **BUG THIS CATCHES**: Would catch lock-order deadlocks between start and the core
/// thread, or a late callback that is stored but never invoked.
#[tokio::test]
async fn given_started_without_callback_when_started_with_callback_then_callback_armed() {
    // GIVEN: A running controller in polling mode
    let oracle = ScriptedOracle::new(true);
    let controller = controller_with(&oracle, fast_config());
    controller.start(StartOptions::new()).unwrap();
    wait_until_running(&controller).await;
    assert_eq!(controller.mode(), MonitoringMode::Polling);

    // WHEN: Starting again with a monitoring callback
    let callback = CountingCallback::new();
    let shared: Arc<dyn HostCallback> = callback.clone();
    let began = Instant::now();
    controller
        .start(StartOptions::new().with_shared_monitoring_callback(shared))
        .unwrap();

    // THEN: Returns promptly and the host is asked to monitor exactly once
    assert!(began.elapsed() < Duration::from_millis(500));
    assert_eq!(controller.mode(), MonitoringMode::HostNotified);
    assert!(eventually(|| callback.calls() == 1).await);
}

/// **VALUE**: Verifies the callback given to the first start is armed once the core runs.
///
/// **BUG THIS CATCHES**: Would catch arming before the startup query or not at all.
#[tokio::test]
async fn given_callback_on_first_start_when_running_then_armed_once() {
    let oracle = ScriptedOracle::new(false);
    let controller = controller_with(&oracle, fast_config());
    let callback = CountingCallback::new();
    let shared: Arc<dyn HostCallback> = callback.clone();

    controller
        .start(StartOptions::new().with_shared_monitoring_callback(shared))
        .unwrap();
    wait_until_running(&controller).await;

    assert!(eventually(|| callback.calls() == 1).await);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(callback.calls(), 1, "Monitoring is requested only once");
}

/// **VALUE**: Verifies `start(Some)` then `start(None)` falls back to polling.
///
/// **WHY THIS MATTERS**: Registration replaces; "no callback" is itself a registration.
///
/// **BUG THIS CATCHES**: Would catch a stale callback keeping the controller in
/// host-notified mode where nobody re-queries.
#[tokio::test]
async fn given_started_with_callback_when_started_without_then_polling_resumes() {
    // GIVEN: Host-notified mode
    let oracle = ScriptedOracle::new(false);
    let controller = controller_with(&oracle, fast_config());
    controller
        .start(StartOptions::new().with_monitoring_callback(|| {}))
        .unwrap();
    wait_until_running(&controller).await;
    assert_eq!(controller.mode(), MonitoringMode::HostNotified);

    // WHEN: Clearing the callback
    controller.start(StartOptions::new()).unwrap();

    // THEN: Polling picks up an oracle change on its own
    assert_eq!(controller.mode(), MonitoringMode::Polling);
    oracle.set(true);
    assert!(
        eventually(|| controller.get_permission()).await,
        "Polling should observe the grant within {EVENTUALLY:?}"
    );
}

/// **VALUE**: Verifies a workload passed to a repeated start is never run.
///
/// **WHY THIS MATTERS**: There is exactly one core context per controller.
///
/// **BUG THIS CATCHES**: Would catch a second core thread being spawned.
#[tokio::test]
async fn given_running_controller_when_started_with_workload_then_workload_ignored() {
    let oracle = ScriptedOracle::new(true);
    let controller = controller_with(&oracle, fast_config());
    controller.start(StartOptions::new()).unwrap();
    wait_until_running(&controller).await;

    let ran = Arc::new(AtomicBool::new(false));
    let ran_clone = Arc::clone(&ran);
    controller
        .start(StartOptions::new().with_workload(move |_context| async move {
            ran_clone.store(true, Ordering::SeqCst);
        }))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!ran.load(Ordering::SeqCst), "Second workload must not run");
}

async fn next_value(rx: &mut mpsc::UnboundedReceiver<bool>) -> Option<bool> {
    tokio::time::timeout(EVENTUALLY, rx.recv())
        .await
        .ok()
        .flatten()
}

/// **VALUE**: Verifies the workload sees the stored permission and its change feed.
///
/// **WHY THIS MATTERS**: The visualization switches between "ready" and "permission
/// required" based on exactly this feed.
///
/// **BUG THIS CATCHES**: Would catch the workload starting before the startup query, or
/// changes not reaching `permission_changes()` receivers.
#[tokio::test]
async fn given_workload_when_permission_changes_then_workload_observes_each_value() {
    // GIVEN: A denied startup and a workload that reports what it sees
    let oracle = ScriptedOracle::new(false);
    let controller = controller_with(&oracle, fast_config());
    let (tx, mut rx) = mpsc::unbounded_channel();

    controller
        .start(
            StartOptions::new()
                .with_monitoring_callback(|| {})
                .with_workload(move |context| async move {
                    let mut changes = context.permission_changes();
                    let _ = tx.send(context.has_permission());
                    while changes.changed().await.is_ok() {
                        let granted = *changes.borrow_and_update();
                        if tx.send(granted).is_err() {
                            break;
                        }
                    }
                }),
        )
        .unwrap();

    // THEN: Startup value first
    assert_eq!(next_value(&mut rx).await, Some(false));

    // WHEN: The host reports a grant
    oracle.set(true);
    controller.notify_permission_changed();
    assert_eq!(next_value(&mut rx).await, Some(true));

    // WHEN: The host reports a revoke
    oracle.set(false);
    controller.notify_permission_changed();
    assert_eq!(next_value(&mut rx).await, Some(false));
}

/// **VALUE**: Verifies a weak handle neither keeps the controller alive nor loses it early.
///
/// **WHY THIS MATTERS**: The host monitor sits behind the monitoring callback the controller
/// owns. A strong handle there would be a reference cycle.
///
/// **BUG THIS CATCHES**: Would catch `downgrade` returning an owning handle.
#[test]
fn given_weak_handle_when_controller_dropped_then_upgrade_fails() {
    let oracle = ScriptedOracle::new(true);
    let controller = controller_with(&oracle, fast_config());
    let weak = controller.downgrade();

    let upgraded = weak.upgrade().expect("Controller is still alive");
    upgraded.set_permission(true);
    assert!(controller.get_permission(), "Upgrade drives the same controller");
    drop(upgraded);

    drop(controller);
    assert!(weak.upgrade().is_none());
}

/// **VALUE**: Verifies concurrent first and repeated starts keep replace semantics.
///
/// **WHY THIS MATTERS**: Whichever start call loses the race to launch the core registers
/// second, so its callback is the one that stays.
///
/// **BUG THIS CATCHES**: Would catch the launching call storing its callback after a
/// concurrent repeated start already registered, silently dropping the later one.
#[tokio::test]
async fn given_concurrent_starts_when_settled_then_survivor_is_armed_once() {
    for _ in 0..50 {
        // GIVEN: Two hosts starting the same controller at once, one with a callback
        let oracle = ScriptedOracle::new(true);
        let controller = controller_with(&oracle, fast_config());
        let callback = CountingCallback::new();
        let shared: Arc<dyn HostCallback> = callback.clone();
        let barrier = std::sync::Barrier::new(2);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                barrier.wait();
                controller.start(StartOptions::new()).unwrap();
            });
            scope.spawn(|| {
                barrier.wait();
                controller
                    .start(StartOptions::new().with_shared_monitoring_callback(shared))
                    .unwrap();
            });
        });

        // WHEN: The core is running
        wait_until_running(&controller).await;

        // THEN: A surviving callback was armed exactly once; a cleared one never runs
        match controller.mode() {
            MonitoringMode::HostNotified => {
                assert!(eventually(|| callback.calls() == 1).await);
            }
            MonitoringMode::Polling => {}
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(callback.calls() <= 1, "Callback armed more than once");
    }
}
