//! Background refresh of the address registry
//!
//! Periodically runs a reconciliation cycle so cached reads of the registry
//! stay warm. Nothing runs until [`RefreshMonitor::start`] is called.

use crate::RegistryMetrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};
use upstream_core::{connect_str, AddressRegistry, RefreshReport, Result, UpstreamError};

/// Periodic caller of the registry's refresh cycle
pub struct RefreshMonitor {
    registry: Arc<AddressRegistry>,
    refresh_interval: Duration,
    metrics: Option<RegistryMetrics>,
}

impl RefreshMonitor {
    /// Create a new refresh monitor
    pub fn new(registry: Arc<AddressRegistry>, refresh_interval: Duration) -> Result<Self> {
        if refresh_interval.is_zero() {
            return Err(UpstreamError::InvalidConfiguration(
                "refresh interval must be non-zero".to_string(),
            ));
        }

        Ok(Self {
            registry,
            refresh_interval,
            metrics: None,
        })
    }

    /// Record every cycle into the given metrics
    pub fn with_metrics(mut self, metrics: RegistryMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Spawn the background refresh task.
    ///
    /// The first cycle runs one interval after start. The task stops when the
    /// returned handle is stopped or dropped.
    pub fn start(self: Arc<Self>) -> RefreshHandle {
        info!(
            refresh_interval_secs = self.refresh_interval.as_secs_f64(),
            "Starting endpoint refresh task"
        );

        let task = tokio::spawn(async move {
            let mut timer = interval(self.refresh_interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            // Skip the first immediate tick
            timer.tick().await;

            loop {
                timer.tick().await;
                self.tick_once().await;
            }
        });

        RefreshHandle { task }
    }

    /// Run a single refresh cycle now
    pub async fn tick_once(&self) -> RefreshReport {
        if tracing::enabled!(tracing::Level::DEBUG) {
            let current = self.registry.available().await;
            debug!(
                "Refreshing the active endpoints [{}] if necessary",
                connect_str::format(&current)
            );
        }

        let report = self.registry.refresh().await;
        if let Some(metrics) = &self.metrics {
            metrics.record(&report);
        }
        report
    }
}

/// Control handle for a running refresh task
pub struct RefreshHandle {
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Stop the refresh task. A cycle in flight is abandoned before it commits.
    pub fn stop(self) {
        info!("Stopping endpoint refresh task");
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
