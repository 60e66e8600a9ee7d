//! Prometheus metrics for the address registry

use anyhow::Result;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;
use tracing::debug;
use upstream_core::RefreshReport;

/// Prometheus metrics describing reconciliation cycles
#[derive(Clone)]
pub struct RegistryMetrics {
    /// Endpoints currently in the active set
    pub active_endpoints: IntGauge,
    /// Endpoints in the configured set of the last cycle
    pub configured_endpoints: IntGauge,
    /// Completed reconciliation cycles
    pub refresh_cycles_total: IntCounter,
    /// Endpoints added back to the active set
    pub endpoints_added_total: IntCounter,
    /// Endpoints removed from the active set
    pub endpoints_removed_total: IntCounter,
    /// Cycles where every active endpoint was unreachable
    pub all_unreachable_total: IntCounter,
    /// Prometheus registry for metrics
    pub registry: Arc<Registry>,
}

impl RegistryMetrics {
    /// Create and register the registry metrics
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let active_endpoints = IntGauge::new(
            "upstream_active_endpoints",
            "Endpoints currently considered reachable",
        )?;
        let configured_endpoints = IntGauge::new(
            "upstream_configured_endpoints",
            "Endpoints in the configured connect string",
        )?;
        let refresh_cycles_total = IntCounter::new(
            "upstream_refresh_cycles_total",
            "Total reconciliation cycles",
        )?;
        let endpoints_added_total = IntCounter::new(
            "upstream_endpoints_added_total",
            "Total endpoints added to the active set",
        )?;
        let endpoints_removed_total = IntCounter::new(
            "upstream_endpoints_removed_total",
            "Total endpoints removed from the active set",
        )?;
        let all_unreachable_total = IntCounter::new(
            "upstream_all_unreachable_total",
            "Total cycles that found no reachable endpoint",
        )?;

        registry.register(Box::new(active_endpoints.clone()))?;
        registry.register(Box::new(configured_endpoints.clone()))?;
        registry.register(Box::new(refresh_cycles_total.clone()))?;
        registry.register(Box::new(endpoints_added_total.clone()))?;
        registry.register(Box::new(endpoints_removed_total.clone()))?;
        registry.register(Box::new(all_unreachable_total.clone()))?;

        Ok(Self {
            active_endpoints,
            configured_endpoints,
            refresh_cycles_total,
            endpoints_added_total,
            endpoints_removed_total,
            all_unreachable_total,
            registry,
        })
    }

    /// Record the outcome of one reconciliation cycle
    pub fn record(&self, report: &RefreshReport) {
        debug!(
            added = report.added.len(),
            removed = report.removed.len(),
            all_unreachable = report.all_unreachable,
            "Recording refresh metrics"
        );

        self.refresh_cycles_total.inc();
        self.endpoints_added_total.inc_by(report.added.len() as u64);
        self.endpoints_removed_total.inc_by(report.removed.len() as u64);
        if report.all_unreachable {
            self.all_unreachable_total.inc();
        }
        self.active_endpoints.set(report.active.len() as i64);
        self.configured_endpoints.set(report.configured as i64);
    }

    /// Gather all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
