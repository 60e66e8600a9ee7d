use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use upstream_core::AddressRegistry;
use upstream_health::{
    HealthCheckConfig, InstanceListSupplier, RefreshMonitor, RegistryMetrics, TcpProber,
};

mod config;

use config::MonitorConfig;

const SERVICE_ID: &str = "upstream";

#[tokio::main]
async fn main() -> Result<()> {
    let config = MonitorConfig::from_env()?;
    init_tracing(config.json_logs);

    info!("Starting upstream-monitor...");
    info!("  - Endpoints: {}", config.connect_str);
    info!("  - Probe timeout: {:?}", config.probe_timeout);

    let prober = TcpProber::new(HealthCheckConfig {
        timeout: config.probe_timeout,
    })?;
    let registry = Arc::new(AddressRegistry::new(
        config.connect_str.clone(),
        Arc::new(prober),
    )?);
    let metrics = RegistryMetrics::new()?;
    info!("Address registry initialized");

    let _refresh = match config.refresh_interval {
        Some(every) => {
            let monitor =
                RefreshMonitor::new(registry.clone(), every)?.with_metrics(metrics.clone());
            Some(Arc::new(monitor).start())
        }
        None => {
            warn!("Background refresh disabled - set UPSTREAM_REFRESH_INTERVAL_SECS to enable it");
            None
        }
    };

    let supplier = InstanceListSupplier::new(SERVICE_ID, registry.clone());
    let mut snapshots = tokio::time::interval(config.snapshot_interval);

    loop {
        tokio::select! {
            _ = snapshots.tick() => {
                let instances = supplier.get().await;
                info!(
                    count = instances.len(),
                    instances = %serde_json::to_string(&instances)?,
                    "Available endpoints"
                );
                debug!("Metrics:\n{}", metrics.gather()?);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down upstream-monitor");
                break;
            }
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
