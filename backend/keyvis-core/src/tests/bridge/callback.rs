// Unit tests for host callback plumbing

use crate::bridge::{CallbackSlot, HostCallback, invoke_host_callback};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn counting_callback(counter: &Arc<AtomicUsize>) -> Arc<dyn HostCallback> {
    let counter = Arc::clone(counter);
    Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

/// **VALUE**: Verifies a panicking host procedure does not reach the core.
///
/// **WHY THIS MATTERS**: Host-side failures are invisible to the core by contract. A panic
/// escaping here would kill the core thread and with it permission tracking.
///
/// **BUG THIS CATCHES**: Would catch removal of the unwind guard.
#[test]
fn given_panicking_callback_when_invoked_then_panic_is_contained() {
    let callback: fn() = || panic!("preferences pane exploded");

    invoke_host_callback(&callback, "open_system_preferences");
}

/// **VALUE**: Verifies that registering replaces rather than stacks.
///
/// **WHY THIS MATTERS**: Only one monitoring callback may be active per controller.
///
/// **BUG THIS CATCHES**: Would catch a slot that keeps or fans out to old callbacks.
#[test]
fn given_registered_callback_when_replaced_then_only_new_one_runs() {
    let slot = CallbackSlot::default();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    assert!(!slot.replace(Some(counting_callback(&first))), "Slot started empty");
    assert!(slot.replace(Some(counting_callback(&second))), "Slot had a callback");

    if let Some(callback) = slot.current() {
        callback.notify();
    }

    assert_eq!(first.load(Ordering::SeqCst), 0, "Replaced callback must not run");
    assert_eq!(second.load(Ordering::SeqCst), 1, "New callback runs once");
}

/// **VALUE**: Verifies clearing the slot.
///
/// **BUG THIS CATCHES**: Would catch `replace(None)` leaving the old callback registered.
#[test]
fn given_registered_callback_when_cleared_then_slot_is_empty() {
    let slot = CallbackSlot::default();
    let counter = Arc::new(AtomicUsize::new(0));

    slot.replace(Some(counting_callback(&counter)));
    slot.replace(None);

    assert!(!slot.is_registered());
    assert!(slot.current().is_none());
}
