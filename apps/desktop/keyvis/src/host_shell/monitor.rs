use keyvis_core::bridge::{BridgeController, HostCallback, WeakBridgeController};
use keyvis_core::permission::{PermissionOracle, query_or_deny};

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info};

const MONITOR_THREAD_NAME: &str = "keyvis-permission-monitor";

/// Host-side observer of the OS accessibility permission.
///
/// Started by the core through the monitoring callback. Watches the oracle
/// on its own thread and sends the core a monitoring notification whenever
/// the observed value changes; the core does its own re-query.
///
/// Holds the controller weakly: the controller owns the monitoring callback,
/// and the callback owns this monitor.
pub struct PermissionMonitor {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    controller: WeakBridgeController,
    oracle: Arc<dyn PermissionOracle>,
    interval: Duration,
    started: AtomicBool,
    stopping: AtomicBool,
    notifications: AtomicUsize,
}

impl PermissionMonitor {
    /// Observe with `oracle` at the controller's configured poll interval.
    pub fn new(controller: &BridgeController, oracle: Arc<dyn PermissionOracle>) -> Self {
        let interval = controller.config().permission.poll_interval();
        Self::with_interval(controller, oracle, interval)
    }

    pub fn with_interval(
        controller: &BridgeController,
        oracle: Arc<dyn PermissionOracle>,
        interval: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                controller: controller.downgrade(),
                oracle,
                interval,
                started: AtomicBool::new(false),
                stopping: AtomicBool::new(false),
                notifications: AtomicUsize::new(0),
            }),
            handle: Mutex::new(None),
        }
    }

    /// Begin observing. Idempotent while running; starts again after `stop`.
    pub fn start(&self) {
        if self.shared.started.swap(true, Ordering::AcqRel) {
            debug!("Permission monitor already running");
            return;
        }

        let Some(controller) = self.shared.controller.upgrade() else {
            debug!("Controller gone; permission monitor not started");
            self.shared.started.store(false, Ordering::Release);
            return;
        };
        self.shared.stopping.store(false, Ordering::Release);
        let initial = controller.get_permission();
        drop(controller);

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(MONITOR_THREAD_NAME.to_string())
            .spawn(move || shared.run(initial));

        match spawned {
            Ok(handle) => {
                info!(
                    "Permission monitor started (interval {:?})",
                    self.shared.interval
                );
                *self.lock_handle() = Some(handle);
            }
            Err(e) => {
                error!("Failed to start permission monitor: {e}");
                self.shared.started.store(false, Ordering::Release);
            }
        }
    }

    /// Stop observing and wait for the monitor thread to exit.
    pub fn stop(&self) {
        self.shared.stopping.store(true, Ordering::Release);

        let handle = self.lock_handle().take();
        if let Some(handle) = handle {
            handle.thread().unpark();
            if handle.join().is_err() {
                error!("Permission monitor thread panicked");
            }
            info!("Permission monitor stopped");
        }

        self.shared.started.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.lock_handle()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// How many monitoring notifications this monitor has sent.
    pub fn notifications(&self) -> usize {
        self.shared.notifications.load(Ordering::Acquire)
    }

    /// The monitoring callback to hand to `StartOptions`.
    pub fn callback(self: &Arc<Self>) -> Arc<dyn HostCallback> {
        let monitor = Arc::clone(self);
        Arc::new(move || monitor.start())
    }

    fn lock_handle(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Shared {
    fn run(&self, mut last_observed: bool) {
        while !self.stopping.load(Ordering::Acquire) {
            thread::park_timeout(self.interval);
            if self.stopping.load(Ordering::Acquire) {
                break;
            }

            let observed = query_or_deny(self.oracle.as_ref());
            if observed == last_observed {
                continue;
            }

            let Some(controller) = self.controller.upgrade() else {
                debug!("Controller gone; permission monitor exiting");
                break;
            };

            info!("OS permission changed (granted={observed}); notifying core");
            last_observed = observed;
            self.notifications.fetch_add(1, Ordering::AcqRel);
            controller.notify_permission_changed();
        }
    }
}

impl Drop for PermissionMonitor {
    fn drop(&mut self) {
        self.shared.stopping.store(true, Ordering::Release);
        if let Some(handle) = self.lock_handle().as_ref() {
            handle.thread().unpark();
        }
    }
}

impl fmt::Debug for PermissionMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionMonitor")
            .field("interval", &self.shared.interval)
            .field("running", &self.is_running())
            .field("notifications", &self.notifications())
            .finish()
    }
}
