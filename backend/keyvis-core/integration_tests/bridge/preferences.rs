use crate::helpers::{
    CountingCallback, ScriptedOracle, controller_with, eventually, fast_config,
    wait_until_running,
};

use keyvis_core::bridge::{BridgeController, HostCallback, StartOptions};

use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// request_open_system_preferences(): core -> host, fire-and-forget
// ============================================================================

/// **VALUE**: Verifies the request is a harmless no-op when the host registered nothing.
///
/// **WHY THIS MATTERS**: Hosts without a preferences UI (tests, headless runs) must not
/// crash the core when it decides the user needs to act.
///
/// **BUG THIS CATCHES**: Would catch an unwrap on the empty slot.
#[test]
fn given_no_host_procedure_when_requested_then_nothing_happens() {
    let oracle = ScriptedOracle::new(false);
    let controller = controller_with(&oracle, fast_config());

    controller.request_open_system_preferences();
    controller.request_open_system_preferences();
}

/// **VALUE**: Verifies each request invokes the registered procedure once.
///
/// **BUG THIS CATCHES**: Would catch requests being deduplicated or dropped.
#[test]
fn given_host_procedure_when_requested_then_invoked_once_per_request() {
    let callback = CountingCallback::new();
    let shared: Arc<dyn HostCallback> = callback.clone();
    let controller = BridgeController::builder()
        .with_config(fast_config())
        .build()
        .unwrap();
    controller.set_open_preferences(Some(shared));

    controller.request_open_system_preferences();
    assert_eq!(callback.calls(), 1);

    controller.request_open_system_preferences();
    assert_eq!(callback.calls(), 2);
}

/// **VALUE**: Verifies a failing host procedure is invisible to the core.
///
/// **WHY THIS MATTERS**: Only the host can tell the user the pane did not open; the core
/// must keep running either way.
///
/// **BUG THIS CATCHES**: Would catch a host panic unwinding into the core.
#[test]
fn given_panicking_host_procedure_when_requested_then_core_is_unaffected() {
    let controller = BridgeController::builder()
        .with_config(fast_config())
        .with_open_preferences(|| {
            let pane_opened: Option<()> = None;
            pane_opened.expect("preferences pane failed to open");
        })
        .build()
        .unwrap();

    controller.request_open_system_preferences();

    controller.set_permission(true);
    assert!(controller.get_permission(), "Controller still usable");
}

/// **VALUE**: Verifies replacing and clearing the open-preferences procedure.
///
/// **BUG THIS CATCHES**: Would catch the old procedure still being called.
#[test]
fn given_replaced_procedure_when_requested_then_only_latest_runs() {
    let first = CountingCallback::new();
    let second = CountingCallback::new();
    let first_shared: Arc<dyn HostCallback> = first.clone();
    let second_shared: Arc<dyn HostCallback> = second.clone();
    let controller = BridgeController::builder()
        .with_config(fast_config())
        .build()
        .unwrap();

    controller.set_open_preferences(Some(first_shared));
    controller.set_open_preferences(Some(second_shared));
    controller.request_open_system_preferences();

    controller.set_open_preferences(None);
    controller.request_open_system_preferences();

    assert_eq!(first.calls(), 0);
    assert_eq!(second.calls(), 1);
}

/// **VALUE**: Verifies a denied startup asks the host to open System Preferences once.
///
/// **WHY THIS MATTERS**: First launch is the moment the user needs to be sent to the
/// accessibility pane.
///
/// **BUG THIS CATCHES**: Would catch the startup check ignoring the config flag, or
/// repeating the request on every poll.
#[tokio::test]
async fn given_denied_startup_when_flag_enabled_then_preferences_requested_once() {
    let oracle = ScriptedOracle::new(false);
    let mut config = fast_config();
    config.permission.open_preferences_when_denied = true;
    let controller = controller_with(&oracle, config);
    let callback = CountingCallback::new();
    let shared: Arc<dyn HostCallback> = callback.clone();
    controller.set_open_preferences(Some(shared));

    controller.start(StartOptions::new()).unwrap();
    wait_until_running(&controller).await;

    assert!(eventually(|| callback.calls() == 1).await);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(callback.calls(), 1, "Only the startup check requests the pane");
}

/// **VALUE**: Verifies a granted startup never bothers the user.
///
/// **BUG THIS CATCHES**: Would catch an inverted startup condition.
#[tokio::test]
async fn given_granted_startup_when_flag_enabled_then_preferences_not_requested() {
    let oracle = ScriptedOracle::new(true);
    let mut config = fast_config();
    config.permission.open_preferences_when_denied = true;
    let controller = controller_with(&oracle, config);
    let callback = CountingCallback::new();
    let shared: Arc<dyn HostCallback> = callback.clone();
    controller.set_open_preferences(Some(shared));

    controller.start(StartOptions::new()).unwrap();
    wait_until_running(&controller).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(callback.calls(), 0);
}

/// **VALUE**: Verifies which thread runs the open-preferences procedure.
///
/// **WHY THIS MATTERS**: Hosts must redispatch to their UI context themselves. The startup
/// request arrives on the core thread; an explicit request arrives on its caller's thread.
///
/// **BUG THIS CATCHES**: Would catch a change of execution context that hosts relying on
/// the documented contract would not expect.
#[tokio::test]
async fn given_requests_from_core_and_caller_when_procedure_runs_then_on_triggering_thread() {
    // GIVEN: A denied startup that asks for preferences, recording thread names
    let oracle = ScriptedOracle::new(false);
    let mut config = fast_config();
    config.permission.open_preferences_when_denied = true;
    let core_thread = config.core.thread_name.clone();

    let seen = Arc::new(std::sync::Mutex::new(Vec::<String>::new()));
    let seen_clone = Arc::clone(&seen);
    let controller = BridgeController::builder()
        .with_shared_oracle(oracle.clone())
        .with_config(config)
        .with_open_preferences(move || {
            let name = std::thread::current().name().unwrap_or("unnamed").to_string();
            seen_clone.lock().unwrap().push(name);
        })
        .build()
        .unwrap();

    // WHEN: The core starts and then a host thread asks explicitly
    controller.start(StartOptions::new()).unwrap();
    wait_until_running(&controller).await;
    assert!(eventually(|| seen.lock().unwrap().len() == 1).await);

    let requester = controller.clone();
    std::thread::Builder::new()
        .name(String::from("host-ui"))
        .spawn(move || requester.request_open_system_preferences())
        .unwrap()
        .join()
        .unwrap();

    // THEN: Startup on the core thread, explicit request on the caller's thread
    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen, vec![core_thread, String::from("host-ui")]);
}
