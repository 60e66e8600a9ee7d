//! Core upstream endpoint registry
//!
//! This library provides:
//! - Endpoint value type with resolved/unresolved equality semantics
//! - Connect string parsing and formatting
//! - Address registry that reconciles the configured endpoints against
//!   reachability probes

pub mod connect_str;
pub mod endpoint;
pub mod error;
pub mod probe;
pub mod registry;

pub use connect_str::DEFAULT_CONNECT_STR;
pub use endpoint::Endpoint;
pub use error::{Result, UpstreamError};
pub use probe::Prober;
pub use registry::{AddressRegistry, RefreshReport};
