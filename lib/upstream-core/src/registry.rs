//! Address registry tracking which configured endpoints are currently routable

use crate::{connect_str, Endpoint, Prober, Result};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// AddressRegistry maintains the active subset of the configured endpoints
///
/// The full set is re-derived from the connect string on every reconciliation
/// cycle. The active set is seeded optimistically with the full set on first
/// read and afterwards only changes inside a reconciliation cycle.
pub struct AddressRegistry {
    connect_str: RwLock<String>,
    // None until the first read seeds it
    active: Mutex<Option<HashSet<Endpoint>>>,
    prober: Arc<dyn Prober>,
}

/// Outcome of one reconciliation cycle
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Endpoints that became reachable and joined the active set
    pub added: HashSet<Endpoint>,
    /// Endpoints that were dropped from the active set
    pub removed: HashSet<Endpoint>,
    /// Every active endpoint failed its probe; the active set was kept as is
    pub all_unreachable: bool,
    /// Number of endpoints in the configured set for this cycle
    pub configured: usize,
    /// Active set after the cycle committed
    pub active: HashSet<Endpoint>,
}

impl RefreshReport {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl AddressRegistry {
    /// Create a registry for the given connect string.
    ///
    /// The connect string is validated up front so that later cycles can
    /// always derive the full set from it.
    pub fn new(connect_str: impl Into<String>, prober: Arc<dyn Prober>) -> Result<Self> {
        let connect_str = connect_str.into();
        connect_str::parse(&connect_str)?;

        Ok(Self {
            connect_str: RwLock::new(connect_str),
            active: Mutex::new(None),
            prober,
        })
    }

    /// Current connect string
    pub async fn connect_str(&self) -> String {
        self.connect_str.read().await.clone()
    }

    /// Replace the connect string; picked up by the next reconciliation cycle
    pub async fn update_connect_str(&self, connect_str: impl Into<String>) -> Result<()> {
        let connect_str = connect_str.into();
        connect_str::parse(&connect_str)?;

        let mut current = self.connect_str.write().await;
        if *current != connect_str {
            info!("Connect string changed from '{}' to '{}'", *current, connect_str);
            *current = connect_str;
        }
        Ok(())
    }

    /// Get the endpoints currently believed reachable.
    ///
    /// With `refresh` set, a full reconciliation cycle runs first. The returned
    /// set is a snapshot and never an error; at worst it is stale.
    pub async fn get_available(&self, refresh: bool) -> HashSet<Endpoint> {
        if refresh {
            self.refresh().await.active
        } else {
            let mut active = self.active.lock().await;
            let snapshot = self.seeded(&mut active).await.clone();
            snapshot
        }
    }

    /// Cached read, equivalent to `get_available(false)`
    pub async fn available(&self) -> HashSet<Endpoint> {
        self.get_available(false).await
    }

    /// Run one reconciliation cycle and report what changed.
    ///
    /// The registry lock is held for the whole cycle, so concurrent callers
    /// serialize and readers never see a partially applied cycle.
    pub async fn refresh(&self) -> RefreshReport {
        let mut guard = self.active.lock().await;
        let active = self.seeded(&mut guard).await;
        self.reconcile(active).await
    }

    async fn seeded<'a>(
        &self,
        active: &'a mut Option<HashSet<Endpoint>>,
    ) -> &'a mut HashSet<Endpoint> {
        if active.is_none() {
            let seed = self.full_set().await.unwrap_or_default();
            debug!("Seeding active endpoints with {} configured endpoints", seed.len());
            *active = Some(seed);
        }
        active.get_or_insert_with(HashSet::new)
    }

    async fn full_set(&self) -> Option<HashSet<Endpoint>> {
        let connect_str = self.connect_str.read().await;
        match connect_str::parse(&connect_str) {
            Ok(endpoints) => Some(endpoints),
            Err(e) => {
                error!("Failed to parse connect string '{}': {}", *connect_str, e);
                None
            }
        }
    }

    /// Probe the configured endpoints and commit additions and removals.
    ///
    /// Endpoints that are no longer configured count as removals. Removals
    /// that would empty the active set are skipped, so switching to a
    /// configuration whose endpoints are all unreachable (or to an empty one)
    /// never evicts the last known set.
    async fn reconcile(&self, active: &mut HashSet<Endpoint>) -> RefreshReport {
        let Some(full) = self.full_set().await else {
            return RefreshReport {
                active: active.clone(),
                ..Default::default()
            };
        };

        let probes = full.iter().map(|endpoint| async move {
            (endpoint, self.prober.probe(endpoint).await)
        });
        let results = join_all(probes).await;

        let mut added = HashSet::new();
        let mut removed = HashSet::new();
        for (endpoint, healthy) in results {
            let present = active.contains(endpoint);
            if !healthy && present {
                warn!(
                    endpoint = %endpoint,
                    "Endpoint is unreachable and will be removed from the available list"
                );
                removed.insert(endpoint.clone());
            } else if healthy && !present {
                info!(
                    endpoint = %endpoint,
                    "Endpoint is available now and will be added to the available list"
                );
                added.insert(endpoint.clone());
            }
        }

        for endpoint in active.iter().filter(|e| !full.contains(*e)) {
            warn!(
                endpoint = %endpoint,
                "Endpoint is no longer configured and will be removed from the available list"
            );
            removed.insert(endpoint.clone());
        }

        if !added.is_empty() {
            active.extend(added.iter().cloned());
            warn!("Added endpoints: {}", connect_str::format(&added));
        }

        let mut all_unreachable = false;
        if !removed.is_empty() {
            if removed.len() == active.len() {
                error!(
                    endpoints = %connect_str::format(active),
                    "No reachable endpoints left, keeping the last known endpoints"
                );
                all_unreachable = true;
                removed.clear();
            } else {
                active.retain(|e| !removed.contains(e));
                warn!("Removed endpoints: {}", connect_str::format(&removed));
            }
        }

        RefreshReport {
            added,
            removed,
            all_unreachable,
            configured: full.len(),
            active: active.clone(),
        }
    }
}
