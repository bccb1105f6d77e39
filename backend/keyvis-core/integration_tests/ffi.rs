use crate::helpers::eventually;

use keyvis_core::bridge::{ControllerPhase, MonitoringMode};
use keyvis_core::ffi::{
    keyvis_get_accessibility_permission, keyvis_permission_changed,
    keyvis_register_open_system_preferences, keyvis_request_open_system_preferences,
    keyvis_set_accessibility_permission, keyvis_start, process_controller,
};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serial_test::serial;

// ============================================================================
// C ABI tests
// These drive the process-wide controller, so they run serially
// ============================================================================

static OPEN_PREFERENCES_CALLS: AtomicUsize = AtomicUsize::new(0);
static MONITORING_CALLS: AtomicUsize = AtomicUsize::new(0);

extern "C" fn count_open_preferences() {
    OPEN_PREFERENCES_CALLS.fetch_add(1, Ordering::SeqCst);
}

extern "C" fn count_monitoring() {
    MONITORING_CALLS.fetch_add(1, Ordering::SeqCst);
}

/// **VALUE**: Verifies a host-pushed value is read back through the C surface.
///
/// **WHY THIS MATTERS**: A Swift host that observes the OS itself pushes values this way.
///
/// **BUG THIS CATCHES**: Would catch the setter and getter hitting different controllers.
#[test]
#[serial]
fn given_host_pushes_value_when_read_through_ffi_then_matches() {
    keyvis_set_accessibility_permission(true);
    assert!(keyvis_get_accessibility_permission());

    keyvis_set_accessibility_permission(false);
    assert!(!keyvis_get_accessibility_permission());
    assert!(!process_controller().get_permission());
}

/// **VALUE**: Verifies open-preferences requests reach a registered C procedure and stop
/// after it is cleared with NULL.
///
/// **BUG THIS CATCHES**: Would catch NULL registration being ignored or crashing.
#[test]
#[serial]
fn given_registered_c_procedure_when_requested_then_called_until_cleared() {
    let before = OPEN_PREFERENCES_CALLS.load(Ordering::SeqCst);

    keyvis_register_open_system_preferences(Some(count_open_preferences));
    keyvis_request_open_system_preferences();
    assert_eq!(OPEN_PREFERENCES_CALLS.load(Ordering::SeqCst), before + 1);

    keyvis_register_open_system_preferences(None);
    keyvis_request_open_system_preferences();
    assert_eq!(OPEN_PREFERENCES_CALLS.load(Ordering::SeqCst), before + 1);
}

/// **VALUE**: Verifies `keyvis_start(NULL)` then `keyvis_start(cb)` returns promptly and
/// arms the C monitoring callback.
///
/// **WHY THIS MATTERS**: This is the exact sequence a host that wires monitoring late uses.
///
/// **BUG THIS CATCHES**: Would catch blocking starts or a lost late registration.
#[tokio::test]
#[serial]
async fn given_ffi_start_without_then_with_callback_when_running_then_callback_armed() {
    let before = MONITORING_CALLS.load(Ordering::SeqCst);

    let began = Instant::now();
    keyvis_start(None);
    assert!(began.elapsed() < Duration::from_millis(500));

    assert!(
        eventually(|| process_controller().phase() == ControllerPhase::Running).await,
        "Process controller should reach Running"
    );

    keyvis_start(Some(count_monitoring));
    assert_eq!(process_controller().mode(), MonitoringMode::HostNotified);
    assert!(eventually(|| MONITORING_CALLS.load(Ordering::SeqCst) > before).await);
}

/// **VALUE**: Verifies the monitoring notification re-queries the system oracle.
///
/// **WHY THIS MATTERS**: Hosts call `keyvis_permission_changed` from their OS observer.
///
/// **BUG THIS CATCHES**: Would catch the notification not reaching the oracle.
#[cfg(not(target_os = "macos"))]
#[test]
#[serial]
fn given_stale_value_when_host_notifies_then_system_answer_is_stored() {
    keyvis_set_accessibility_permission(false);

    keyvis_permission_changed();

    assert!(
        keyvis_get_accessibility_permission(),
        "Platforms without an accessibility gate report granted"
    );
}
