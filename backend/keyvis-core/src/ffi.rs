//! C ABI used by a native host shell (e.g. a Swift app) to drive the bridge.
//!
//! A C caller has nowhere to keep a Rust value, so this module owns one
//! process-wide [`BridgeController`], created on first use with the
//! [`SystemOracle`](crate::permission::SystemOracle) and the config found in
//! `$KEYVIS_CONFIG_DIR` (defaults otherwise). Rust code linked into the same
//! process reaches it through [`process_controller`].
//!
//! Every exported function returns plain values only and never unwinds into
//! the caller.

use crate::bridge::{BridgeController, HostCallback, StartOptions};
use crate::config::BridgeConfig;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;

use log::{error, info};
use once_cell::sync::OnceCell;

/// Environment variable naming the directory that holds `config.json`.
pub const CONFIG_DIR_ENV: &str = "KEYVIS_CONFIG_DIR";

/// Host procedure as seen from C: `void (*)(void)`.
pub type HostProcedure = extern "C" fn();

static PROCESS_CONTROLLER: OnceCell<BridgeController> = OnceCell::new();

/// The controller behind the C surface.
pub fn process_controller() -> &'static BridgeController {
    PROCESS_CONTROLLER.get_or_init(|| {
        let config = std::env::var_os(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .map(|dir| BridgeConfig::load_or_default(&dir))
            .unwrap_or_default();

        BridgeController::builder()
            .with_config(config)
            .build()
            .unwrap_or_else(|e| {
                error!("Invalid bridge config, using defaults: {e}");
                BridgeController::default()
            })
    })
}

fn host_procedure(procedure: HostProcedure) -> Arc<dyn HostCallback> {
    Arc::new(move || procedure())
}

/// Run `body`, turning a panic into `fallback`.
fn guarded<T>(name: &str, fallback: T, body: impl FnOnce() -> T) -> T {
    catch_unwind(AssertUnwindSafe(body)).unwrap_or_else(|_| {
        error!("{name} panicked; returning fallback value");
        fallback
    })
}

/// Start the core. `monitoring_callback` may be NULL, which selects polling.
///
/// Returns immediately; the core runs on its own thread.
#[unsafe(no_mangle)]
pub extern "C" fn keyvis_start(monitoring_callback: Option<HostProcedure>) {
    guarded("keyvis_start", (), || {
        let options = match monitoring_callback {
            Some(procedure) => {
                StartOptions::new().with_shared_monitoring_callback(host_procedure(procedure))
            }
            None => StartOptions::new(),
        };

        if let Err(e) = process_controller().start(options) {
            error!("keyvis_start failed: {e}");
        }
    });
}

/// Register (or, with NULL, clear) the host's open-preferences procedure.
#[unsafe(no_mangle)]
pub extern "C" fn keyvis_register_open_system_preferences(procedure: Option<HostProcedure>) {
    guarded("keyvis_register_open_system_preferences", (), || {
        info!(
            "Host {} open-preferences procedure",
            if procedure.is_some() { "registered" } else { "cleared" }
        );
        process_controller().set_open_preferences(procedure.map(host_procedure));
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn keyvis_set_accessibility_permission(granted: bool) {
    guarded("keyvis_set_accessibility_permission", (), || {
        process_controller().set_permission(granted);
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn keyvis_get_accessibility_permission() -> bool {
    guarded("keyvis_get_accessibility_permission", false, || {
        process_controller().get_permission()
    })
}

/// Monitoring notification: the host observed an OS permission change.
#[unsafe(no_mangle)]
pub extern "C" fn keyvis_permission_changed() {
    guarded("keyvis_permission_changed", (), || {
        process_controller().notify_permission_changed();
    });
}

/// Exported for native core code linked alongside the bridge.
#[unsafe(no_mangle)]
pub extern "C" fn keyvis_request_open_system_preferences() {
    guarded("keyvis_request_open_system_preferences", (), || {
        process_controller().request_open_system_preferences();
    });
}
