//! Environment configuration for the monitor daemon

use anyhow::{Context, Result};
use std::time::Duration;
use upstream_core::{connect_str, DEFAULT_CONNECT_STR};
use upstream_health::DEFAULT_PROBE_TIMEOUT;

const DEFAULT_SNAPSHOT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, PartialEq)]
pub struct MonitorConfig {
    pub connect_str: String,
    pub probe_timeout: Duration,
    /// None keeps the background refresh disabled
    pub refresh_interval: Option<Duration>,
    pub snapshot_interval: Duration,
    pub json_logs: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            connect_str: DEFAULT_CONNECT_STR.to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            refresh_interval: None,
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
            json_logs: false,
        }
    }
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup("UPSTREAM_CONNECT_STR") {
            connect_str::parse(&value).context("UPSTREAM_CONNECT_STR")?;
            config.connect_str = value;
        }

        if let Some(ms) = parse_u64(&lookup, "UPSTREAM_PROBE_TIMEOUT_MS")? {
            anyhow::ensure!(ms > 0, "UPSTREAM_PROBE_TIMEOUT_MS must be non-zero");
            config.probe_timeout = Duration::from_millis(ms);
        }

        if let Some(secs) = parse_u64(&lookup, "UPSTREAM_REFRESH_INTERVAL_SECS")? {
            config.refresh_interval = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(secs) = parse_u64(&lookup, "UPSTREAM_SNAPSHOT_INTERVAL_SECS")? {
            anyhow::ensure!(secs > 0, "UPSTREAM_SNAPSHOT_INTERVAL_SECS must be non-zero");
            config.snapshot_interval = Duration::from_secs(secs);
        }

        config.json_logs =
            lookup("UPSTREAM_LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));

        Ok(config)
    }
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{} must be a non-negative integer, got '{}'", key, value))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<MonitorConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        MonitorConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config, MonitorConfig::default());
        assert_eq!(config.connect_str, "localhost:8090,localhost:9092,localhost:9999");
        assert_eq!(config.probe_timeout, Duration::from_secs(3));
        assert!(config.refresh_interval.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("UPSTREAM_CONNECT_STR", "a:1,b:2"),
            ("UPSTREAM_PROBE_TIMEOUT_MS", "250"),
            ("UPSTREAM_REFRESH_INTERVAL_SECS", "5"),
            ("UPSTREAM_SNAPSHOT_INTERVAL_SECS", "10"),
            ("UPSTREAM_LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(config.connect_str, "a:1,b:2");
        assert_eq!(config.probe_timeout, Duration::from_millis(250));
        assert_eq!(config.refresh_interval, Some(Duration::from_secs(5)));
        assert_eq!(config.snapshot_interval, Duration::from_secs(10));
        assert!(config.json_logs);
    }

    #[test]
    fn test_zero_refresh_interval_disables_refresh() {
        let config = config(&[("UPSTREAM_REFRESH_INTERVAL_SECS", "0")]).unwrap();
        assert!(config.refresh_interval.is_none());
    }

    #[test]
    fn test_invalid_values() {
        assert!(config(&[("UPSTREAM_CONNECT_STR", "foo:bar")]).is_err());
        assert!(config(&[("UPSTREAM_PROBE_TIMEOUT_MS", "0")]).is_err());
        assert!(config(&[("UPSTREAM_PROBE_TIMEOUT_MS", "soon")]).is_err());
        assert!(config(&[("UPSTREAM_REFRESH_INTERVAL_SECS", "-1")]).is_err());
    }
}
