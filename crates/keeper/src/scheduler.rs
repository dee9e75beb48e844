//! Periodic auto-start of stopped instances.

use std::sync::Arc;
use std::time::Duration;

use keeper_cloud::{ComputeApi, auto_start_stopped};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle to the background auto-start loop.
///
/// The loop sleeps `interval`, runs one auto-start pass, and repeats until
/// [`Scheduler::shutdown`] is called. A failed pass is logged by
/// [`auto_start_stopped`] and does not end the loop.
#[derive(Debug)]
pub struct Scheduler {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Scheduler {
    pub fn spawn(compute: Arc<dyn ComputeApi>, interval: Duration, page_size: u32) -> Self {
        let (stop, mut stopped) = watch::channel(false);
        tracing::info!(interval_secs = interval.as_secs(), "auto-start scheduler started");

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        tracing::info!("running scheduled auto-start check");
                        let report = auto_start_stopped(compute.as_ref(), page_size).await;
                        if let Some(error) = &report.error {
                            tracing::error!(%error, "scheduled auto-start failed");
                        }
                    }
                    _ = stopped.changed() => break,
                }
            }
            tracing::info!("auto-start scheduler stopped");
        });

        Self { stop, task }
    }

    /// Stop the loop and wait for an in-flight pass to finish.
    pub async fn shutdown(self) {
        if self.stop.send(true).is_err() {
            tracing::debug!("auto-start scheduler already exited");
        }
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "auto-start scheduler task failed");
        }
    }
}

/// Await `work`, then shut `scheduler` down whatever `work` returned.
pub async fn stop_after<F: IntoFuture>(scheduler: Option<Scheduler>, work: F) -> F::Output {
    let output = work.await;
    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }
    output
}
