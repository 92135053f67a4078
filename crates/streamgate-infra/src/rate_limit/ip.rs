//! Client address extraction for rate limit keys.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

const UNKNOWN: &str = "unknown";

/// Resolve the client address behind `trusted_proxy_count` proxies.
///
/// Tries `X-Forwarded-For`, then `X-Real-IP`, then the socket address. Returns
/// `"unknown"` when none of them yields a valid address.
pub fn extract_client_ip(
    headers: &HeaderMap,
    socket_addr: Option<&SocketAddr>,
    trusted_proxy_count: usize,
) -> String {
    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| from_forwarded_for(v, trusted_proxy_count))
    {
        return ip;
    }

    if let Some(ip) = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| is_valid_ip(v))
    {
        return ip.to_string();
    }

    socket_addr
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// `X-Forwarded-For` reads `client, proxy1, proxy2`. The last
/// `trusted_proxy_count` entries were appended by our own proxies; the entry
/// just before them is the client. A chain shorter than that falls back to the
/// nearest hop.
fn from_forwarded_for(header_value: &str, trusted_proxy_count: usize) -> Option<String> {
    let ips: Vec<&str> = header_value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let candidate = if trusted_proxy_count == 0 || ips.len() <= trusted_proxy_count {
        ips.last()?
    } else {
        ips.get(ips.len() - trusted_proxy_count - 1)?
    };

    is_valid_ip(candidate).then(|| candidate.to_string())
}

fn is_valid_ip(ip: &str) -> bool {
    ip.parse::<IpAddr>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_forwarded_for_with_proxies() {
        assert_eq!(from_forwarded_for("192.168.1.1, 10.0.0.1", 1).as_deref(), Some("192.168.1.1"));
        assert_eq!(
            from_forwarded_for("203.0.113.9, 10.0.0.1, 10.0.0.2", 2).as_deref(),
            Some("203.0.113.9")
        );
        // Spoofed leading entries are skipped
        assert_eq!(
            from_forwarded_for("6.6.6.6, 203.0.113.9, 10.0.0.1", 1).as_deref(),
            Some("203.0.113.9")
        );
    }

    #[test]
    fn test_forwarded_for_short_chain_and_garbage() {
        assert_eq!(from_forwarded_for("192.168.1.1", 3).as_deref(), Some("192.168.1.1"));
        assert_eq!(from_forwarded_for("not-an-ip, 10.0.0.1", 1), None);
        assert_eq!(from_forwarded_for(" , ", 1), None);
    }

    #[test]
    fn test_extract_falls_back_in_order() {
        let socket: SocketAddr = "127.0.0.1:5000".parse().unwrap();

        let xff = headers("x-forwarded-for", "198.51.100.7, 10.0.0.1");
        assert_eq!(extract_client_ip(&xff, Some(&socket), 1), "198.51.100.7");

        let real = headers("x-real-ip", " 198.51.100.8 ");
        assert_eq!(extract_client_ip(&real, Some(&socket), 1), "198.51.100.8");

        assert_eq!(extract_client_ip(&HeaderMap::new(), Some(&socket), 1), "127.0.0.1");
        assert_eq!(extract_client_ip(&HeaderMap::new(), None, 1), "unknown");
    }

    #[test]
    fn test_ipv6() {
        let xff = headers("x-forwarded-for", "2001:db8::1");
        assert_eq!(extract_client_ip(&xff, None, 0), "2001:db8::1");
    }
}
