//! TCP reachability checks for upstream endpoints

use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time;
use tracing::debug;
use upstream_core::{Endpoint, Prober, Result, UpstreamError};

/// Default bound on a single connection attempt
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Health check configuration
#[derive(Clone, Debug)]
pub struct HealthCheckConfig {
    /// Timeout for a single connection attempt. Replaces the platform
    /// connect timeout, which varies between hosts.
    pub timeout: Duration,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl HealthCheckConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(UpstreamError::InvalidConfiguration(
                "probe timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Probes endpoints by opening and immediately closing a TCP connection
#[derive(Clone, Debug)]
pub struct TcpProber {
    config: HealthCheckConfig,
}

impl TcpProber {
    /// Create a new TCP prober
    pub fn new(config: HealthCheckConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    async fn connect(&self, endpoint: &Endpoint) -> std::io::Result<TcpStream> {
        match endpoint.socket_addr() {
            Some(addr) => TcpStream::connect(addr).await,
            None => TcpStream::connect((endpoint.host.as_str(), endpoint.port)).await,
        }
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, endpoint: &Endpoint) -> bool {
        match time::timeout(self.config.timeout, self.connect(endpoint)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                debug!("TCP connection to {} succeeded", endpoint);
                true
            }
            Ok(Err(e)) => {
                debug!("TCP connection to {} failed: {}", endpoint, e);
                false
            }
            Err(_) => {
                debug!(
                    "TCP connection to {} timed out after {:?}",
                    endpoint, self.config.timeout
                );
                false
            }
        }
    }
}
