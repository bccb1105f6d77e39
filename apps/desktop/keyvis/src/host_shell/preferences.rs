use crate::error::KeyvisError;

use common::ErrorLocation;

use std::panic::Location;
use std::process::{Child, Command, ExitStatus};
use std::thread::{self, JoinHandle};

use log::{debug, error, info, warn};

/// Deep link to the Accessibility list under Security & Privacy.
pub const ACCESSIBILITY_PANE_URL: &str =
    "x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility";

const REAPER_THREAD_NAME: &str = "keyvis-preferences-launcher";

#[cfg(target_os = "macos")]
const DEFAULT_LAUNCHER: Option<&str> = Some("open");

#[cfg(not(target_os = "macos"))]
const DEFAULT_LAUNCHER: Option<&str> = None;

/// Opens the accessibility preferences pane on behalf of the core.
///
/// Registered with the controller as its open-preferences procedure. The
/// launcher process is spawned and not waited on.
#[derive(Debug, Clone)]
pub struct PreferencesOpener {
    launcher: Option<String>,
    url: String,
}

impl Default for PreferencesOpener {
    fn default() -> Self {
        Self {
            launcher: DEFAULT_LAUNCHER.map(str::to_string),
            url: ACCESSIBILITY_PANE_URL.to_string(),
        }
    }
}

impl PreferencesOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `launcher <url>` instead of the platform default.
    pub fn with_launcher(mut self, launcher: impl Into<String>) -> Self {
        self.launcher = Some(launcher.into());
        self
    }

    /// Only log requests; nothing is launched.
    pub fn without_launcher(mut self) -> Self {
        self.launcher = None;
        self
    }

    pub fn launcher(&self) -> Option<&str> {
        self.launcher.as_deref()
    }

    /// Launch the preferences pane without waiting for the launcher.
    ///
    /// # Errors
    ///
    /// Returns [`KeyvisError::Preferences`] if the launcher cannot be spawned.
    #[track_caller]
    pub fn open(&self) -> Result<(), KeyvisError> {
        self.launch().map(|_reaper| ())
    }

    /// Launch the preferences pane and hand back the thread reaping the
    /// launcher, which yields its exit status. `None` when there is nothing
    /// to launch on this platform.
    ///
    /// # Errors
    ///
    /// Returns [`KeyvisError::Preferences`] if the launcher cannot be spawned.
    #[track_caller]
    pub fn launch(&self) -> Result<Option<JoinHandle<Option<ExitStatus>>>, KeyvisError> {
        let Some(launcher) = self.launcher.as_deref() else {
            info!(
                "No preferences launcher on this platform; grant accessibility access via {}",
                self.url
            );
            return Ok(None);
        };

        let child = Command::new(launcher)
            .arg(&self.url)
            .spawn()
            .map_err(|e| KeyvisError::Preferences {
                message: format!("Failed to run '{launcher} {}': {e}", self.url),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("Opened accessibility preferences with '{launcher}'");

        let reaper = thread::Builder::new()
            .name(REAPER_THREAD_NAME.to_string())
            .spawn(move || reap(child))
            .map_err(|e| KeyvisError::Preferences {
                message: format!("Failed to start launcher reaper: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Some(reaper))
    }

    /// The form the controller stores: errors are logged here and never
    /// reach the core.
    pub fn into_procedure(self) -> impl Fn() + Send + Sync + 'static {
        move || {
            if let Err(e) = self.open() {
                error!("{e}");
            }
        }
    }
}

/// Wait on the launcher so it does not linger as a zombie.
fn reap(mut child: Child) -> Option<ExitStatus> {
    match child.wait() {
        Ok(status) if status.success() => {
            debug!("Preferences launcher exited");
            Some(status)
        }
        Ok(status) => {
            warn!("Preferences launcher exited with {status}");
            Some(status)
        }
        Err(e) => {
            error!("Failed to wait on preferences launcher: {e}");
            None
        }
    }
}
