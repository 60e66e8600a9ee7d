//! Reachability probing seam

use crate::Endpoint;
use async_trait::async_trait;

/// Classifies a single endpoint as reachable or not.
///
/// Implementations fold every failure (refused, timed out, unresolvable)
/// into `false` and never retry within one call.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, endpoint: &Endpoint) -> bool;
}
