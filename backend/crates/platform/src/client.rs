//! Client identification utilities
//!
//! Common functions for identifying clients via HTTP headers.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Identifier shared by every client that presents no address signal
pub const ANONYMOUS_CLIENT: &str = "anonymous";

/// Header set by the reverse proxy with the chain of client addresses
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Header set by the reverse proxy with the directly connected address
pub const REAL_IP_HEADER: &str = "x-real-ip";

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For first (first IP in the list), then X-Real-IP,
/// then falls back to the direct connection IP. Values that do not parse
/// as an IP address are ignored.
///
/// ## Arguments
/// * `headers` - HTTP request headers
/// * `direct_ip` - Direct connection IP address
///
/// ## Returns
/// The client IP address, or None if not determinable
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    if let Some(xff) = header_str(headers, FORWARDED_FOR_HEADER) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }

    if let Some(real_ip) = header_str(headers, REAL_IP_HEADER) {
        if let Ok(ip) = real_ip.trim().parse::<IpAddr>() {
            return Some(ip);
        }
    }

    direct_ip
}

/// Derive the rate limiting identifier for a request
///
/// Falls back to [`ANONYMOUS_CLIENT`], so clients without any address
/// signal share one bucket: stricter than necessary, never bypassed.
pub fn client_identifier(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> String {
    extract_client_ip(headers, direct_ip)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| ANONYMOUS_CLIENT.to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_client_ip_xff() {
        let mut headers = HeaderMap::new();
        headers.insert(
            FORWARDED_FOR_HEADER,
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );
        headers.insert(REAL_IP_HEADER, HeaderValue::from_static("10.9.9.9"));

        let ip = extract_client_ip(&headers, None);
        assert_eq!(ip, Some("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn test_extract_client_ip_real_ip_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR_HEADER, HeaderValue::from_static("not-an-ip"));
        headers.insert(REAL_IP_HEADER, HeaderValue::from_static("2001:db8::1"));

        let ip = extract_client_ip(&headers, Some("127.0.0.1".parse().unwrap()));
        assert_eq!(ip, Some("2001:db8::1".parse().unwrap()));
    }

    #[test]
    fn test_extract_client_ip_direct() {
        let headers = HeaderMap::new();
        let direct: IpAddr = "127.0.0.1".parse().unwrap();

        let ip = extract_client_ip(&headers, Some(direct));
        assert_eq!(ip, Some(direct));
    }

    #[test]
    fn test_client_identifier_anonymous() {
        let headers = HeaderMap::new();
        assert_eq!(client_identifier(&headers, None), ANONYMOUS_CLIENT);
    }

    #[test]
    fn test_client_identifier_uses_address() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR_HEADER, HeaderValue::from_static("203.0.113.7"));
        assert_eq!(client_identifier(&headers, None), "203.0.113.7");
    }
}
