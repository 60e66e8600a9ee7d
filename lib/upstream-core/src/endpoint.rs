//! Endpoint value type

use crate::{Result, UpstreamError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::{IpAddr, SocketAddr};

/// One backend network destination.
///
/// Two endpoints are equal when their ports match and either both carry the
/// same resolved address, or neither is resolved and their host names match
/// case-insensitively. An endpoint known only by name is therefore never equal
/// to a resolved one, so callers should store one form consistently.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<IpAddr>,
    pub port: u16,
}

impl Endpoint {
    /// Create an unresolved endpoint
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            resolved: None,
            port,
        }
    }

    /// Create an endpoint that already carries its resolved address
    pub fn with_address(host: impl Into<String>, addr: IpAddr, port: u16) -> Self {
        Self {
            host: host.into(),
            resolved: Some(addr),
            port,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// Socket address for a resolved endpoint
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.resolved.map(|ip| SocketAddr::new(ip, self.port))
    }

    /// Look the host up and return a copy carrying the first address found
    pub async fn resolve(&self) -> Result<Endpoint> {
        let resolution_error = |source| UpstreamError::Resolution {
            host: self.host.clone(),
            source,
        };

        let mut addrs = tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(resolution_error)?;

        match addrs.next() {
            Some(addr) => Ok(Endpoint::with_address(self.host.clone(), addr.ip(), self.port)),
            None => Err(resolution_error(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "lookup returned no addresses",
            ))),
        }
    }
}

impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        let same_destination = match (self.resolved, other.resolved) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.host.eq_ignore_ascii_case(&other.host),
            _ => false,
        };
        same_destination && self.port == other.port
    }
}

impl Eq for Endpoint {}

impl Hash for Endpoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.resolved {
            Some(ip) => ip.hash(state),
            None => self.host.to_ascii_lowercase().hash(state),
        }
        self.port.hash(state);
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolved {
            None => write!(f, "{}:{}", self.host, self.port),
            Some(ip) => write!(f, "{}/{}:{}", self.host, ip, self.port),
        }
    }
}
