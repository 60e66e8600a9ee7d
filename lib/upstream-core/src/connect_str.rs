//! Connect string codec
//!
//! The configured endpoint list is a comma separated `host:port[,host:port]*`
//! string, e.g. `localhost:8090,localhost:9092`.

use crate::{Endpoint, Result, UpstreamError};
use std::collections::HashSet;

/// Endpoint list used when no connect string is configured
pub const DEFAULT_CONNECT_STR: &str = "localhost:8090,localhost:9092,localhost:9999";

/// Parse a connect string into a set of unresolved endpoints.
///
/// Each token is split on its first `:`. No DNS lookup happens here.
pub fn parse(connect_str: &str) -> Result<HashSet<Endpoint>> {
    if connect_str.trim().is_empty() {
        return Ok(HashSet::new());
    }

    connect_str.split(',').map(parse_token).collect()
}

fn parse_token(token: &str) -> Result<Endpoint> {
    let token = token.trim();
    if token.is_empty() {
        return Err(UpstreamError::config_format(token, "empty endpoint"));
    }

    let (host, port) = token
        .split_once(':')
        .ok_or_else(|| UpstreamError::config_format(token, "missing ':' separator"))?;

    let (host, port) = (host.trim(), port.trim());
    if host.is_empty() {
        return Err(UpstreamError::config_format(token, "empty host"));
    }

    let port = port
        .parse::<u16>()
        .map_err(|e| UpstreamError::config_format(token, format!("invalid port: {}", e)))?;

    Ok(Endpoint::new(host, port))
}

/// Render endpoints back into a connect string.
///
/// Tokens are sorted so the output is stable for a given set. Only the host
/// name and port are written, so parsing the output yields unresolved
/// endpoints; the round trip reproduces the set only when it holds no
/// resolved endpoints.
pub fn format(endpoints: &HashSet<Endpoint>) -> String {
    let mut tokens: Vec<String> = endpoints
        .iter()
        .map(|e| format!("{}:{}", e.host, e.port))
        .collect();
    tokens.sort();
    tokens.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn set(endpoints: &[(&str, u16)]) -> HashSet<Endpoint> {
        endpoints.iter().map(|(h, p)| Endpoint::new(*h, *p)).collect()
    }

    #[test]
    fn test_parse_list() {
        let parsed = parse("a:1,b:2").unwrap();
        assert_eq!(parsed, set(&[("a", 1), ("b", 2)]));
    }

    #[test]
    fn test_parse_default() {
        let parsed = parse(DEFAULT_CONNECT_STR).unwrap();
        assert_eq!(
            parsed,
            set(&[("localhost", 8090), ("localhost", 9092), ("localhost", 9999)])
        );
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("   ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_trims_tokens() {
        let parsed = parse(" a:1 , b:2").unwrap();
        assert_eq!(parsed, set(&[("a", 1), ("b", 2)]));

        let parsed = parse("a :1,b: 2").unwrap();
        assert_eq!(parsed, set(&[("a", 1), ("b", 2)]));
        assert!(parsed.iter().all(|e| !e.host.ends_with(' ')));
    }

    #[test]
    fn test_parse_collapses_duplicates() {
        let parsed = parse("Host:1,host:1").unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["foo", "foo:bar", "foo:-1", "foo:65536", ":80", "a:1,,b:2", "a:1,"] {
            let err = parse(input).unwrap_err();
            assert!(
                matches!(err, UpstreamError::ConfigFormat { .. }),
                "expected format error for {:?}, got {:?}",
                input,
                err
            );
        }
    }

    #[test]
    fn test_parse_splits_on_first_colon() {
        assert!(parse("::1:80").is_err());
        assert!(parse("host:80:90").is_err());
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format(&HashSet::new()), "");
    }

    #[test]
    fn test_format_is_sorted() {
        let endpoints = set(&[("b", 2), ("a", 1), ("c", 3)]);
        assert_eq!(format(&endpoints), "a:1,b:2,c:3");
    }

    #[test]
    fn test_format_then_parse() {
        let endpoints = set(&[("localhost", 8090), ("Backend.internal", 9092), ("10.0.0.7", 0)]);
        assert_eq!(parse(&format(&endpoints)).unwrap(), endpoints);
        assert!(parse(&format(&HashSet::new())).unwrap().is_empty());
    }

    #[test]
    fn test_format_drops_resolved_address() {
        let loopback = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let endpoints = HashSet::from([Endpoint::with_address("localhost", loopback, 80)]);

        assert_eq!(format(&endpoints), "localhost:80");
        let parsed = parse(&format(&endpoints)).unwrap();
        assert_ne!(parsed, endpoints);
        assert_eq!(parsed, set(&[("localhost", 80)]));
    }
}
