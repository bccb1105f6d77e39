use crate::bridge::callback::HostCallback;
use crate::bridge::{CallbackSlot, invoke_host_callback};
use crate::bridge::context::CoreContext;
use crate::bridge::options::{CoreWorkload, StartOptions};
use crate::bridge::state::{
    ControllerPhase, ControllerState, MonitoringMode, PermissionTransition,
};
use crate::config::BridgeConfig;
use crate::error::bridge::BridgeError;
use crate::error::config::ConfigError;
use crate::permission::{PermissionCell, PermissionOracle, SystemOracle, query_or_deny};

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::thread;

use log::{debug, error, info, trace, warn};
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};

/// Orchestrates the core runtime on behalf of the host shell.
///
/// Owns the [`PermissionCell`] and both host callback slots. Cloning is
/// cheap and every clone drives the same controller, which is how the host
/// context and the core thread share it.
#[derive(Clone)]
pub struct BridgeController {
    inner: Arc<Inner>,
}

struct Inner {
    cell: PermissionCell,
    oracle: Arc<dyn PermissionOracle>,
    config: BridgeConfig,

    monitoring_callback: CallbackSlot,
    open_preferences: CallbackSlot,

    /// Set by the first `start`; later calls only re-register the callback.
    started: AtomicBool,

    /// Serializes query + store so a slow, stale answer cannot overwrite a newer one.
    refresh_lock: Mutex<()>,

    phase_tx: watch::Sender<ControllerPhase>,
    permission_tx: watch::Sender<bool>,
}

impl BridgeController {
    pub fn builder() -> BridgeControllerBuilder {
        BridgeControllerBuilder::default()
    }

    fn from_parts(
        oracle: Arc<dyn PermissionOracle>,
        config: BridgeConfig,
        open_preferences: Option<Arc<dyn HostCallback>>,
    ) -> Self {
        let cell = PermissionCell::new();
        let (phase_tx, _) = watch::channel(ControllerPhase::Uninitialized);
        let (permission_tx, _) = watch::channel(cell.get_permission());

        let open_preferences_slot = CallbackSlot::default();
        open_preferences_slot.replace(open_preferences);

        Self {
            inner: Arc::new(Inner {
                cell,
                oracle,
                config,
                monitoring_callback: CallbackSlot::default(),
                open_preferences: open_preferences_slot,
                started: AtomicBool::new(false),
                refresh_lock: Mutex::new(()),
                phase_tx,
                permission_tx,
            }),
        }
    }

    // ============================================
    // LIFECYCLE
    // ============================================

    /// Launch the core and register the host's monitoring callback.
    ///
    /// The first call spawns the core thread and returns without waiting on
    /// it: the startup permission query, the monitoring request and the
    /// workload all happen on the core thread. Later calls only replace the
    /// monitoring callback and, if one is now set on a running controller,
    /// arm it on the calling thread. A workload passed to a later call is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Spawn`] if the OS refuses to create the core
    /// thread. The controller is left `Uninitialized` so `start` may be retried.
    pub fn start(&self, options: StartOptions) -> Result<(), BridgeError> {
        let StartOptions {
            monitoring_callback,
            workload,
        } = options;

        let has_callback = monitoring_callback.is_some();

        // Claiming the first start and storing the callback happen under one
        // slot lock, so a concurrent repeated start always registers after us.
        let (first_start, arm_now) = {
            let mut slot = self.inner.monitoring_callback.lock();
            let first_start = !self.inner.started.swap(true, Ordering::AcqRel);
            if !first_start && slot.is_some() {
                debug!("Replacing registered monitoring callback");
            }
            *slot = monitoring_callback;

            if first_start {
                self.inner.phase_tx.send_replace(ControllerPhase::Starting);
            }

            let running = *self.inner.phase_tx.borrow() == ControllerPhase::Running;
            (first_start, !first_start && has_callback && running)
        };

        if !first_start {
            if workload.is_some() {
                warn!("Core context already started; ignoring workload from repeated start");
            }

            info!("Bridge already started; monitoring mode is now {:?}", self.mode());

            if arm_now {
                self.start_permission_monitoring();
            }

            return Ok(());
        }

        let controller = self.clone();
        let thread_name = self.inner.config.core.thread_name.clone();

        let spawned = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || controller.run_core_context(workload));

        match spawned {
            Ok(_detached) => {
                info!(
                    "Core context '{thread_name}' launched (monitoring mode: {:?})",
                    self.mode()
                );
                Ok(())
            }
            Err(e) => {
                error!("Failed to launch core context '{thread_name}': {e}");
                self.inner.phase_tx.send_replace(ControllerPhase::Uninitialized);
                self.inner.started.store(false, Ordering::Release);
                Err(BridgeError::from(e))
            }
        }
    }

    /// Body of the core thread.
    fn run_core_context(self, workload: Option<CoreWorkload>) {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("{}", BridgeError::runtime(e));
                self.inner.phase_tx.send_replace(ControllerPhase::Uninitialized);
                self.inner.started.store(false, Ordering::Release);
                return;
            }
        };

        runtime.block_on(self.core_main(workload));
        info!("Core context finished");
    }

    async fn core_main(self, workload: Option<CoreWorkload>) {
        let granted = self.refresh_permission();
        info!("Startup accessibility permission: granted={granted}");

        let monitoring_callback = self.enter_running();

        if !granted && self.inner.config.permission.open_preferences_when_denied {
            self.request_open_system_preferences();
        }

        if let Some(callback) = monitoring_callback {
            info!("Asking host shell to start permission monitoring");
            invoke_host_callback(callback.as_ref(), "start_permission_monitoring");
        }

        let poll = self.clone().poll_loop();

        match workload {
            Some(workload) => {
                let context = CoreContext::new(self.clone());
                tokio::select! {
                    () = workload(context) => info!("Core workload finished"),
                    () = poll => {}
                }
            }
            None => poll.await,
        }
    }

    /// Move to `Running` and take the monitoring callback to arm, if any.
    ///
    /// Done under the monitoring slot lock so a concurrent `start` either
    /// sees `Running` and arms its own callback, or registered it before this
    /// point and has it armed here. Never both, never neither.
    fn enter_running(&self) -> Option<Arc<dyn HostCallback>> {
        let slot = self.inner.monitoring_callback.lock();
        self.inner.phase_tx.send_replace(ControllerPhase::Running);
        slot.clone()
    }

    async fn poll_loop(self) {
        let mut ticker = interval(self.inner.config.permission.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // First tick is immediate; the startup query already ran.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if self.mode() == MonitoringMode::Polling {
                trace!("Polling permission oracle");
                self.refresh_permission();
            }
        }
    }

    // ============================================
    // PERMISSION
    // ============================================

    /// Store a permission value. The only writer of the cell.
    ///
    /// Logs transitions and wakes [`CoreContext::permission_changes`]
    /// receivers. Does not call into the host.
    pub fn set_permission(&self, granted: bool) {
        let mut previous = granted;

        // The cell is written under the feed's lock so racing writers leave
        // both holding the same final value.
        self.inner.permission_tx.send_if_modified(|current| {
            previous = self.inner.cell.replace(granted);
            if *current == granted {
                false
            } else {
                *current = granted;
                true
            }
        });

        match PermissionTransition::between(previous, granted) {
            Some(PermissionTransition::Granted) => info!("Accessibility permission granted"),
            Some(PermissionTransition::Revoked) => warn!("Accessibility permission revoked"),
            None => trace!("Accessibility permission unchanged (granted={granted})"),
        }
    }

    pub fn get_permission(&self) -> bool {
        self.inner.cell.get_permission()
    }

    /// Query the oracle once and store the answer (errors store `false`).
    pub fn refresh_permission(&self) -> bool {
        let _guard = self
            .inner
            .refresh_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let granted = query_or_deny(self.inner.oracle.as_ref());
        self.set_permission(granted);
        granted
    }

    /// Host → core: the OS reported a permission change.
    ///
    /// Performs exactly one re-query and one store.
    pub fn notify_permission_changed(&self) {
        debug!("Host reported a permission change; re-querying");
        self.refresh_permission();
    }

    // ============================================
    // HOST ACTIONS
    // ============================================

    /// Core → host: open the System Preferences accessibility pane.
    ///
    /// Fire-and-forget. The procedure runs on the calling thread. Without a registered procedure the request is logged
    /// and dropped; whatever the host procedure does, including panicking,
    /// stays on the host side.
    pub fn request_open_system_preferences(&self) {
        match self.inner.open_preferences.current() {
            Some(callback) => {
                info!("Asking host shell to open System Preferences");
                invoke_host_callback(callback.as_ref(), "open_system_preferences");
            }
            None => warn!("No open-preferences procedure registered; request dropped"),
        }
    }

    /// Core → host: ask the host to begin observing OS permission changes.
    ///
    /// The callback runs on the calling thread.
    /// Without a registered monitoring callback the controller keeps polling.
    pub fn start_permission_monitoring(&self) {
        match self.inner.monitoring_callback.current() {
            Some(callback) => {
                info!("Asking host shell to start permission monitoring");
                invoke_host_callback(callback.as_ref(), "start_permission_monitoring");
            }
            None => debug!("No monitoring callback registered; staying in polling mode"),
        }
    }

    /// Register or replace the host's open-preferences procedure.
    pub fn set_open_preferences(&self, callback: Option<Arc<dyn HostCallback>>) {
        if self.inner.open_preferences.replace(callback) {
            debug!("Replaced registered open-preferences procedure");
        }
    }

    // ============================================
    // INSPECTION
    // ============================================

    pub fn phase(&self) -> ControllerPhase {
        *self.inner.phase_tx.borrow()
    }

    pub fn state(&self) -> ControllerState {
        match self.phase() {
            ControllerPhase::Uninitialized => ControllerState::Uninitialized,
            ControllerPhase::Starting => ControllerState::Starting,
            ControllerPhase::Running => ControllerState::Running {
                permission: self.get_permission(),
            },
        }
    }

    pub fn mode(&self) -> MonitoringMode {
        if self.inner.monitoring_callback.is_registered() {
            MonitoringMode::HostNotified
        } else {
            MonitoringMode::Polling
        }
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<ControllerPhase> {
        self.inner.phase_tx.subscribe()
    }

    pub fn subscribe_permission(&self) -> watch::Receiver<bool> {
        self.inner.permission_tx.subscribe()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// A handle that does not keep the controller alive.
    ///
    /// Host-side observers that the controller itself ends up owning (through
    /// the monitoring callback) must hold this instead of a clone.
    pub fn downgrade(&self) -> WeakBridgeController {
        WeakBridgeController {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

/// Non-owning counterpart of [`BridgeController`].
#[derive(Clone)]
pub struct WeakBridgeController {
    inner: Weak<Inner>,
}

impl WeakBridgeController {
    pub fn upgrade(&self) -> Option<BridgeController> {
        self.inner.upgrade().map(|inner| BridgeController { inner })
    }
}

impl fmt::Debug for WeakBridgeController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakBridgeController")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Default for BridgeController {
    /// System oracle, default config, no host procedures.
    fn default() -> Self {
        Self::from_parts(Arc::new(SystemOracle), BridgeConfig::default(), None)
    }
}

impl fmt::Debug for BridgeController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeController")
            .field("state", &self.state())
            .field("mode", &self.mode())
            .finish_non_exhaustive()
    }
}

// ============================================
// BUILDER
// ============================================

/// Builder for [`BridgeController`].
///
/// Defaults: [`SystemOracle`], [`BridgeConfig::default`], no open-preferences procedure.
#[derive(Default)]
pub struct BridgeControllerBuilder {
    oracle: Option<Arc<dyn PermissionOracle>>,
    config: Option<BridgeConfig>,
    open_preferences: Option<Arc<dyn HostCallback>>,
}

impl BridgeControllerBuilder {
    pub fn with_oracle(mut self, oracle: impl PermissionOracle + 'static) -> Self {
        self.oracle = Some(Arc::new(oracle));
        self
    }

    pub fn with_shared_oracle(mut self, oracle: Arc<dyn PermissionOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_open_preferences(mut self, callback: impl HostCallback + 'static) -> Self {
        self.open_preferences = Some(Arc::new(callback));
        self
    }

    /// Build the controller, validating the config.
    #[track_caller]
    pub fn build(self) -> Result<BridgeController, ConfigError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let oracle = self.oracle.unwrap_or_else(|| Arc::new(SystemOracle));

        Ok(BridgeController::from_parts(
            oracle,
            config,
            self.open_preferences,
        ))
    }
}

impl fmt::Debug for BridgeControllerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeControllerBuilder")
            .field("custom_oracle", &self.oracle.is_some())
            .field("config", &self.config)
            .field("open_preferences", &self.open_preferences.is_some())
            .finish()
    }
}
