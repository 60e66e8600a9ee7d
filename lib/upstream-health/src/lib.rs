//! Health checking and refresh for the upstream address registry
pub mod health_check;
pub mod metrics;
pub mod refresh;
pub mod server_list;

pub use health_check::{HealthCheckConfig, TcpProber, DEFAULT_PROBE_TIMEOUT};
pub use metrics::RegistryMetrics;
pub use refresh::{RefreshHandle, RefreshMonitor};
pub use server_list::{InstanceListSupplier, ServerListProvider, ServiceInstance};
