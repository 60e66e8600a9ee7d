//! Adapters handing the registry's endpoints to load balancer clients

use crate::RegistryMetrics;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use upstream_core::{connect_str, AddressRegistry};

/// Supplies a freshly probed server list as a connect string
pub struct ServerListProvider {
    registry: Arc<AddressRegistry>,
    metrics: Option<RegistryMetrics>,
}

impl ServerListProvider {
    pub fn new(registry: Arc<AddressRegistry>) -> Self {
        Self {
            registry,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: RegistryMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run a reconciliation cycle and return the routable servers
    pub async fn updated_list_of_servers(&self) -> String {
        let report = self.registry.refresh().await;
        if let Some(metrics) = &self.metrics {
            metrics.record(&report);
        }
        connect_str::format(&report.active)
    }
}

/// A routable instance of a named service
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceInstance {
    pub instance_id: String,
    pub service_id: String,
    pub host: String,
    pub port: u16,
    pub secure: bool,
}

/// Supplies service instances from the registry's cached endpoints
pub struct InstanceListSupplier {
    service_id: String,
    registry: Arc<AddressRegistry>,
}

impl InstanceListSupplier {
    pub fn new(service_id: impl Into<String>, registry: Arc<AddressRegistry>) -> Self {
        Self {
            service_id: service_id.into(),
            registry,
        }
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Instances for the currently active endpoints, without probing
    pub async fn get(&self) -> Vec<ServiceInstance> {
        let mut instances: Vec<ServiceInstance> = self
            .registry
            .available()
            .await
            .into_iter()
            .map(|endpoint| ServiceInstance {
                instance_id: format!("{}-{}:{}", self.service_id, endpoint.host, endpoint.port),
                service_id: self.service_id.clone(),
                host: endpoint.host,
                port: endpoint.port,
                secure: false,
            })
            .collect();
        instances.sort_by(|a, b| a.host.cmp(&b.host).then(a.port.cmp(&b.port)));

        debug!("Supplying {} instances for {}", instances.len(), self.service_id);
        instances
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use upstream_core::{Endpoint, Prober};

    /// Reports only even ports as reachable
    struct EvenPortProber;

    #[async_trait]
    impl Prober for EvenPortProber {
        async fn probe(&self, endpoint: &Endpoint) -> bool {
            endpoint.port % 2 == 0
        }
    }

    fn registry(connect_str: &str) -> Arc<AddressRegistry> {
        Arc::new(AddressRegistry::new(connect_str, Arc::new(EvenPortProber)).unwrap())
    }

    #[tokio::test]
    async fn test_updated_list_of_servers() {
        let metrics = RegistryMetrics::new().unwrap();
        let provider =
            ServerListProvider::new(registry("a:1,b:2,c:4")).with_metrics(metrics.clone());

        assert_eq!(provider.updated_list_of_servers().await, "b:2,c:4");
        assert_eq!(metrics.endpoints_removed_total.get(), 1);
    }

    #[tokio::test]
    async fn test_updated_list_keeps_last_known_when_all_down() {
        let provider = ServerListProvider::new(registry("a:1,b:3"));
        assert_eq!(provider.updated_list_of_servers().await, "a:1,b:3");
    }

    #[tokio::test]
    async fn test_instance_supplier_uses_cached_endpoints() {
        let registry = registry("b:2,a:1");
        let supplier = InstanceListSupplier::new("say-hello", registry.clone());
        assert_eq!(supplier.service_id(), "say-hello");

        let instances = supplier.get().await;
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].host, "a");
        assert_eq!(instances[0].instance_id, "say-hello-a:1");
        assert!(!instances[0].secure);

        registry.refresh().await;
        let instances = supplier.get().await;
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].port, 2);
    }

    #[test]
    fn test_service_instance_serialization() {
        let instance = ServiceInstance {
            instance_id: "say-hello-a:1".to_string(),
            service_id: "say-hello".to_string(),
            host: "a".to_string(),
            port: 1,
            secure: false,
        };
        let json = serde_json::to_value(&instance).unwrap();
        assert_eq!(json["service_id"], "say-hello");
        assert_eq!(json["port"], 1);
    }
}
