use crate::bridge::callback::HostCallback;
use crate::bridge::context::CoreContext;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type WorkloadFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// The core's own main loop, run on the core thread once the startup
/// permission query has been stored.
pub type CoreWorkload = Box<dyn FnOnce(CoreContext) -> WorkloadFuture + Send + 'static>;

/// Options for [`BridgeController::start`](super::BridgeController::start).
///
/// Every field is optional. With no monitoring callback the controller
/// polls; with no workload the core thread only keeps the permission
/// current.
#[derive(Default)]
pub struct StartOptions {
    pub(crate) monitoring_callback: Option<Arc<dyn HostCallback>>,
    pub(crate) workload: Option<CoreWorkload>,
}

impl StartOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_monitoring_callback(mut self, callback: impl HostCallback + 'static) -> Self {
        self.monitoring_callback = Some(Arc::new(callback));
        self
    }

    /// Register a callback the host also keeps a handle to.
    pub fn with_shared_monitoring_callback(mut self, callback: Arc<dyn HostCallback>) -> Self {
        self.monitoring_callback = Some(callback);
        self
    }

    pub fn with_workload<F, Fut>(mut self, workload: F) -> Self
    where
        F: FnOnce(CoreContext) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.workload = Some(Box::new(move |context| Box::pin(workload(context))));
        self
    }
}

impl fmt::Debug for StartOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartOptions")
            .field("monitoring_callback", &self.monitoring_callback.is_some())
            .field("workload", &self.workload.is_some())
            .finish()
    }
}
