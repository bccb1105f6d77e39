use crate::helpers::{
    ScriptedOracle, controller_with, eventually, fast_config, wait_until_running,
};

use keyvis_core::bridge::{BridgeController, StartOptions};
use keyvis_core::error::OracleError;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// ============================================================================
// Permission updates: host notifications, polling, and oracle failures
// ============================================================================

/// **VALUE**: Verifies one monitoring notification is exactly one re-query plus one update.
///
/// **WHY THIS MATTERS**: The host may notify on every OS event; each must translate into a
/// single fresh answer, never a skipped or doubled query.
///
/// **BUG THIS CATCHES**: Would catch notifications that only flip the cached value, or that
/// query more than once per call.
#[test]
fn given_alternating_oracle_when_notified_twice_then_each_answer_is_stored() {
    // GIVEN: An oracle answering true, false, true, ...
    let queries = Arc::new(AtomicUsize::new(0));
    let oracle_queries = Arc::clone(&queries);
    let controller = BridgeController::builder()
        .with_oracle(move || -> Result<bool, OracleError> {
            let n = oracle_queries.fetch_add(1, Ordering::SeqCst);
            Ok(n % 2 == 0)
        })
        .with_config(fast_config())
        .build()
        .unwrap();

    // WHEN: First notification
    controller.notify_permission_changed();

    // THEN: First answer stored, one query made
    assert!(controller.get_permission());
    assert_eq!(queries.load(Ordering::SeqCst), 1);

    // WHEN: Second notification
    controller.notify_permission_changed();

    // THEN: Second answer stored, exactly two queries total
    assert!(!controller.get_permission());
    assert_eq!(queries.load(Ordering::SeqCst), 2);
}

/// **VALUE**: Verifies an oracle error overwrites a previous grant with "not granted".
///
/// **WHY THIS MATTERS**: After a failure the core must not keep acting on a stale grant.
///
/// **BUG THIS CATCHES**: Would catch errors leaving the previous value in place.
#[test]
fn given_granted_state_when_oracle_fails_then_permission_becomes_false() {
    let controller = BridgeController::builder()
        .with_oracle(|| -> Result<bool, OracleError> {
            Err(OracleError::Query {
                message: String::from("TCC database locked"),
                location: ErrorLocation::from(Location::caller()),
            })
        })
        .with_config(fast_config())
        .build()
        .unwrap();
    controller.set_permission(true);

    let granted = controller.refresh_permission();

    assert!(!granted);
    assert!(!controller.get_permission());
}

/// **VALUE**: Verifies polling mode follows the oracle without any host involvement.
///
/// **WHY THIS MATTERS**: Hosts that never register a monitoring callback still need the
/// core to notice when the user grants permission in System Preferences.
///
/// **BUG THIS CATCHES**: Would catch the poll loop not running, or running only once.
#[tokio::test]
async fn given_polling_mode_when_oracle_changes_then_cell_follows() {
    let oracle = ScriptedOracle::new(false);
    let controller = controller_with(&oracle, fast_config());
    controller.start(StartOptions::new()).unwrap();
    wait_until_running(&controller).await;
    assert!(!controller.get_permission());

    oracle.set(true);
    assert!(eventually(|| controller.get_permission()).await);

    oracle.set(false);
    assert!(eventually(|| !controller.get_permission()).await);
}

/// **VALUE**: Verifies host-notified mode stops the core from polling.
///
/// **WHY THIS MATTERS**: When the host observes the OS, core-side polling is wasted work
/// and can race the host's own updates.
///
/// **BUG THIS CATCHES**: Would catch the poll loop ignoring the monitoring mode.
#[tokio::test]
async fn given_host_notified_mode_when_time_passes_then_oracle_is_not_polled() {
    // GIVEN: A running controller with a monitoring callback
    let oracle = ScriptedOracle::new(true);
    let controller = controller_with(&oracle, fast_config());
    controller
        .start(StartOptions::new().with_monitoring_callback(|| {}))
        .unwrap();
    wait_until_running(&controller).await;
    let after_startup = oracle.queries();

    // WHEN: Several poll intervals pass
    tokio::time::sleep(Duration::from_millis(300)).await;

    // THEN: No further queries
    assert_eq!(oracle.queries(), after_startup, "No polling in host-notified mode");

    // AND: A notification queries exactly once
    controller.notify_permission_changed();
    assert_eq!(oracle.queries(), after_startup + 1);
}

/// **VALUE**: Verifies the change feed only fires on real changes.
///
/// **WHY THIS MATTERS**: Workloads redraw on every wake-up; repeated identical polls must
/// not cause redraw storms.
///
/// **BUG THIS CATCHES**: Would catch `set_permission` publishing unchanged values.
#[test]
fn given_subscriber_when_same_value_written_then_no_change_is_signalled() {
    let oracle = ScriptedOracle::new(false);
    let controller = controller_with(&oracle, fast_config());
    let changes = controller.subscribe_permission();

    controller.set_permission(false);
    assert!(!changes.has_changed().unwrap(), "Same value is not a change");

    controller.set_permission(true);
    assert!(changes.has_changed().unwrap(), "New value is a change");
    assert!(*changes.borrow());
}

/// **VALUE**: Verifies a host-side write lands in the cell directly.
///
/// **WHY THIS MATTERS**: Hosts that observe the OS themselves may push the value instead
/// of asking the core to re-query.
///
/// **BUG THIS CATCHES**: Would catch `set_permission` routing through the oracle.
#[test]
fn given_host_write_when_read_then_value_is_returned_without_query() {
    let oracle = ScriptedOracle::new(false);
    let controller = controller_with(&oracle, fast_config());

    controller.set_permission(true);

    assert!(controller.get_permission());
    assert_eq!(oracle.queries(), 0);
}

/// **VALUE**: Verifies the change feed and the cell agree once racing writers stop.
///
/// **WHY THIS MATTERS**: The host pushes values while the core thread re-queries. In
/// host-notified mode nothing polls, so a feed left on a stale value keeps the status
/// display wrong until the next real change.
///
/// **BUG THIS CATCHES**: Would catch the cell write and the feed update being separate
/// steps that two writers can interleave.
#[test]
fn given_racing_writers_when_quiesced_then_feed_matches_cell() {
    const WRITERS: usize = 4;
    const ROUNDS: usize = 200;
    const WRITES_PER_ROUND: usize = 50;

    // GIVEN: One controller and a feed subscriber
    let oracle = ScriptedOracle::new(false);
    let controller = controller_with(&oracle, fast_config());
    let feed = controller.subscribe_permission();
    let round_start = std::sync::Barrier::new(WRITERS + 1);
    let round_end = std::sync::Barrier::new(WRITERS + 1);

    std::thread::scope(|scope| {
        for writer in 0..WRITERS {
            let controller = &controller;
            let round_start = &round_start;
            let round_end = &round_end;
            scope.spawn(move || {
                for _ in 0..ROUNDS {
                    round_start.wait();
                    for write in 0..WRITES_PER_ROUND {
                        controller.set_permission((writer + write) % 2 == 0);
                    }
                    round_end.wait();
                }
            });
        }

        // WHEN: Every round of concurrent writes has finished
        for round in 0..ROUNDS {
            round_start.wait();
            round_end.wait();

            // THEN: Feed and cell hold the same value
            assert_eq!(
                *feed.borrow(),
                controller.get_permission(),
                "Feed diverged from cell after round {round}"
            );
        }
    });
}
