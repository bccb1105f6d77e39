//! Headless stand-in for the keyboard visualization.
//!
//! Runs as the core workload and reports the status text the visualization
//! would draw every time the permission changes.

use keyvis_core::bridge::CoreContext;

use log::{info, warn};
use tokio::sync::mpsc;

pub const GRANTED_STATUS: &[&str] = &["Permission granted - ready!"];

pub const DENIED_STATUS: &[&str] = &[
    "Accessibility permission required",
    "Please grant permission in System Preferences",
    "Security & Privacy > Accessibility",
];

pub fn status_lines(granted: bool) -> &'static [&'static str] {
    if granted { GRANTED_STATUS } else { DENIED_STATUS }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub granted: bool,
    pub lines: &'static [&'static str],
}

impl StatusReport {
    pub fn for_permission(granted: bool) -> Self {
        Self {
            granted,
            lines: status_lines(granted),
        }
    }
}

/// Core workload that reports the permission status.
///
/// Reports once on entry and then once per change. Reports go to the log
/// and, if set, to a channel so callers can observe them.
#[derive(Debug, Default)]
pub struct StatusWorkload {
    reports: Option<mpsc::UnboundedSender<StatusReport>>,
}

impl StatusWorkload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reports(mut self, reports: mpsc::UnboundedSender<StatusReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Run until the controller goes away.
    pub async fn run(self, context: CoreContext) {
        let mut changes = context.permission_changes();
        changes.mark_changed();

        while changes.changed().await.is_ok() {
            let granted = *changes.borrow_and_update();
            self.report(StatusReport::for_permission(granted));
        }

        info!("Permission feed closed; status workload finished");
    }

    fn report(&self, report: StatusReport) {
        for line in report.lines {
            if report.granted {
                info!("{line}");
            } else {
                warn!("{line}");
            }
        }

        if let Some(reports) = &self.reports {
            // A dropped receiver only means nobody is watching anymore
            let _ = reports.send(report);
        }
    }
}
