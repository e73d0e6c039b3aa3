//! Tracked background tasks.

use std::future::Future;
use std::time::Duration;

use tokio_util::task::TaskTracker;
use tracing::{error, info, warn, Instrument};

use crate::error::TinselError;

/// A set of fire-and-forget tasks that are still awaited on shutdown.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a task. Failures are logged under `label`.
    pub fn spawn<F>(&self, label: &'static str, future: F)
    where
        F: Future<Output = Result<(), TinselError>> + Send + 'static,
    {
        let span = tracing::info_span!("background", task = label);
        self.tracker.spawn(
            async move {
                if let Err(e) = future.await {
                    error!(error = %e, "background task failed");
                }
            }
            .instrument(span),
        );
    }

    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Stop accepting new work and wait for running tasks, up to `grace`.
    /// Returns false if tasks were still running when the grace period ended.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            info!(pending, "waiting for background tasks");
        }
        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    pending = self.tracker.len(),
                    "background tasks still running after grace period"
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for BackgroundTasks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundTasks")
            .field("pending", &self.tracker.len())
            .finish()
    }
}
