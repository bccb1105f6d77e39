use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::error;

/// A zero-argument procedure provided by the host shell.
///
/// The core only ever signals intent through it; nothing comes back.
/// Implementations run on whichever thread triggered them (the core thread
/// or a caller of the controller), so bodies that touch host UI state must
/// hop to the UI context on their own.
pub trait HostCallback: Send + Sync {
    fn notify(&self);
}

impl<F> HostCallback for F
where
    F: Fn() + Send + Sync,
{
    fn notify(&self) {
        self()
    }
}

/// Run a host callback so that nothing it does can reach the core.
///
/// A panic inside the host's procedure is logged and dropped.
pub(crate) fn invoke_host_callback(callback: &dyn HostCallback, name: &str) {
    if catch_unwind(AssertUnwindSafe(|| callback.notify())).is_err() {
        error!("Host callback '{name}' panicked; ignoring");
    }
}

/// Holds at most one registered host callback.
///
/// Registering replaces. The callback is cloned out before it is invoked so
/// no lock is held while host code runs.
#[derive(Default)]
pub(crate) struct CallbackSlot {
    inner: Mutex<Option<Arc<dyn HostCallback>>>,
}

impl CallbackSlot {
    pub(crate) fn lock(&self) -> MutexGuard<'_, Option<Arc<dyn HostCallback>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `callback`, returning whether one was already registered.
    pub(crate) fn replace(&self, callback: Option<Arc<dyn HostCallback>>) -> bool {
        let mut slot = self.lock();
        let had_previous = slot.is_some();
        *slot = callback;
        had_previous
    }

    pub(crate) fn current(&self) -> Option<Arc<dyn HostCallback>> {
        self.lock().clone()
    }

    pub(crate) fn is_registered(&self) -> bool {
        self.lock().is_some()
    }
}
