use keyvis::error::KeyvisError;
use keyvis::host_shell::{PermissionMonitor, PreferencesOpener};
use keyvis::logger::initialize as LoggerInitialize;
use keyvis::paths;
use keyvis::workload::StatusWorkload;

use keyvis_core::bridge::{BridgeController, StartOptions};
use keyvis_core::config::BridgeConfig;
use keyvis_core::permission::{PermissionOracle, SystemOracle};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use log::{info, warn};

#[tokio::main]
async fn main() -> Result<(), KeyvisError> {
    // Logger first so everything after it, core thread included, is captured
    let log_dir = paths::log_dir()?;
    LoggerInitialize(&log_dir)?;

    info!("KeyVis host shell starting");
    info!("Log directory: {}", log_dir.display());

    let config_dir = paths::config_dir()?;
    let config = BridgeConfig::load(&config_dir)?;
    info!("Config directory: {}", config_dir.display());

    if !SystemOracle.prompt() {
        warn!("Accessibility permission not granted yet; the system prompt was shown");
    }

    let oracle: Arc<dyn PermissionOracle> = Arc::new(SystemOracle);

    let controller = BridgeController::builder()
        .with_shared_oracle(Arc::clone(&oracle))
        .with_config(config)
        .with_open_preferences(PreferencesOpener::new().into_procedure())
        .build()?;

    let monitor = Arc::new(PermissionMonitor::new(&controller, oracle));

    controller.start(
        StartOptions::new()
            .with_shared_monitoring_callback(monitor.callback())
            .with_workload(|context| StatusWorkload::new().run(context)),
    )?;

    info!("Core started; press Ctrl-C to quit");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| KeyvisError::Keyvis {
            message: format!("Failed to wait for Ctrl-C: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    monitor.stop();
    info!("KeyVis host shell exiting ({:?})", controller.state());
    Ok(())
}
