// Unit tests for the permission cell
// Covers the default value, last-write-wins, and concurrent access

use crate::permission::{DEFAULT_PERMISSION, PermissionCell};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

/// **VALUE**: Pins the value reported before anyone has written the cell.
///
/// **WHY THIS MATTERS**: The core may read the cell before the startup oracle query lands.
/// Reporting "granted" in that window would enable input monitoring the OS has not allowed.
///
/// **BUG THIS CATCHES**: Would catch a default flipped to `true` or an uninitialized read.
#[test]
fn given_fresh_cell_when_read_then_returns_false() {
    // GIVEN: A cell nobody has written
    let cell = PermissionCell::new();

    // WHEN/THEN: Reading returns the documented default
    assert!(!DEFAULT_PERMISSION, "Default must be 'not granted'");
    assert!(!cell.get_permission(), "Fresh cell must report not granted");
    assert!(!PermissionCell::default().get_permission());
}

/// **VALUE**: Verifies that a read after a write returns exactly the written value.
///
/// **WHY THIS MATTERS**: Host shell and core both trust the cell as the single source of truth.
///
/// **BUG THIS CATCHES**: Would catch a setter that ignores repeated values or inverts them.
#[test]
fn given_sequence_of_writes_when_read_after_each_then_matches_last_write() {
    let cell = PermissionCell::new();

    for value in [true, true, false, true, false, false] {
        cell.set_permission(value);
        assert_eq!(cell.get_permission(), value, "Read must see last write");
    }
}

/// **VALUE**: Verifies `replace()` hands back the previous value.
///
/// **WHY THIS MATTERS**: The controller detects granted/revoked transitions from it.
///
/// **BUG THIS CATCHES**: Would catch `replace()` returning the new value.
#[test]
fn given_stored_value_when_replaced_then_returns_previous() {
    let cell = PermissionCell::with_value(true);

    assert!(cell.replace(false), "Previous value was true");
    assert!(!cell.replace(true), "Previous value was false");
    assert!(cell.get_permission());
}

/// **VALUE**: Hammers the cell from several readers while one writer flips it rapidly.
///
/// **WHY THIS MATTERS**: The host UI context and the core thread touch the cell concurrently.
///
/// **BUG THIS CATCHES**: Would catch a non-atomic representation; readers must only
/// ever observe values the writer actually stored, and must see the writer's final value.
#[test]
fn given_concurrent_readers_when_writer_flips_rapidly_then_reads_are_never_torn() {
    const READERS: usize = 8;
    const WRITES: usize = 20_000;

    let cell = PermissionCell::new();
    let done = AtomicBool::new(false);
    let observed_true = AtomicUsize::new(0);
    let observed_false = AtomicUsize::new(0);

    thread::scope(|scope| {
        for _ in 0..READERS {
            scope.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    // A bool load can only produce a stored value
                    match cell.get_permission() {
                        true => observed_true.fetch_add(1, Ordering::Relaxed),
                        false => observed_false.fetch_add(1, Ordering::Relaxed),
                    };
                }
            });
        }

        scope.spawn(|| {
            for i in 0..WRITES {
                cell.set_permission(i % 2 == 0);
            }
            cell.set_permission(true);
            done.store(true, Ordering::Release);
        });
    });

    assert!(cell.get_permission(), "Final write must be visible");
    assert!(
        observed_true.load(Ordering::Relaxed) + observed_false.load(Ordering::Relaxed) > 0,
        "Readers should have run"
    );
}
