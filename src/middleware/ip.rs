//! Client IP resolution for per-client rate limiting.
//!
//! # Resolution Order
//!
//! 1. `X-Forwarded-For` (first entry in the list)
//! 2. `X-Real-IP`
//! 3. The socket peer address (`ConnectInfo<SocketAddr>`)
//! 4. [`UNKNOWN_IP`]
//!
//! # IP Spoofing
//!
//! Forwarding headers are client-controlled unless a reverse proxy overwrites
//! them. Configure `TRUSTED_PROXIES` with the proxy's CIDR ranges: when the
//! socket peer is outside every range, forwarding headers are ignored and the
//! peer address is used instead.
//!
//! ```nginx
//! # nginx: overwrite, never append, the client-supplied value
//! proxy_set_header X-Real-IP $remote_addr;
//! proxy_set_header X-Forwarded-For $remote_addr;
//! ```
//!
//! Requests with no headers and no peer information (for example when the
//! router is driven without `into_make_service_with_connect_info`) share the
//! `"unknown"` key and are limited collectively.

use std::borrow::Cow;
use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::Request;
use tracing::{debug, warn};

/// Fallback key when no client IP can be determined.
pub const UNKNOWN_IP: &str = "unknown";

// =============================================================================
// Trusted Proxy CIDR Matching
// =============================================================================

/// Parsed CIDR network range.
#[derive(Debug, Clone)]
pub struct CidrRange {
    network: IpAddr,
    prefix_len: u8,
}

impl CidrRange {
    /// Parse CIDR notation ("10.0.0.0/8", "::1/128") or a bare address
    /// (implicit /32 or /128). Returns `None` if the format is invalid.
    pub fn parse(cidr: &str) -> Option<Self> {
        let cidr = cidr.trim();

        let Some((addr, prefix)) = cidr.split_once('/') else {
            let network: IpAddr = cidr.parse().ok()?;
            return Some(Self {
                network,
                prefix_len: max_prefix(&network),
            });
        };

        let network: IpAddr = addr.parse().ok()?;
        let prefix_len: u8 = prefix.parse().ok()?;
        if prefix_len > max_prefix(&network) {
            return None;
        }

        Some(Self {
            network,
            prefix_len,
        })
    }

    /// Check if an IP address falls inside this range.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        match (&self.network, ip) {
            (IpAddr::V4(net), IpAddr::V4(addr)) => {
                let mask = u32::MAX
                    .checked_shl(32 - u32::from(self.prefix_len))
                    .unwrap_or(0);
                (u32::from(*net) & mask) == (u32::from(*addr) & mask)
            }
            (IpAddr::V6(net), IpAddr::V6(addr)) => {
                let mask = u128::MAX
                    .checked_shl(128 - u32::from(self.prefix_len))
                    .unwrap_or(0);
                (u128::from(*net) & mask) == (u128::from(*addr) & mask)
            }
            _ => false,
        }
    }
}

fn max_prefix(ip: &IpAddr) -> u8 {
    match ip {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

/// Reverse proxies whose forwarding headers are honored.
///
/// Empty means every peer is trusted.
#[derive(Debug, Clone, Default)]
pub struct TrustedProxyConfig {
    ranges: Vec<CidrRange>,
}

impl TrustedProxyConfig {
    /// Build from CIDR strings. Invalid entries are logged and skipped.
    pub fn new(cidrs: &[String]) -> Self {
        let ranges: Vec<CidrRange> = cidrs
            .iter()
            .filter_map(|cidr| {
                let parsed = CidrRange::parse(cidr);
                if parsed.is_none() {
                    warn!(cidr = %cidr, "Invalid CIDR range in TRUSTED_PROXIES, skipping");
                }
                parsed
            })
            .collect();

        if !ranges.is_empty() {
            debug!(count = ranges.len(), "Trusted proxy validation enabled");
        }

        Self { ranges }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ranges.is_empty()
    }

    /// Whether `ip` may set forwarding headers.
    pub fn is_trusted(&self, ip: &IpAddr) -> bool {
        self.ranges.is_empty() || self.ranges.iter().any(|range| range.contains(ip))
    }
}

// =============================================================================
// Extraction
// =============================================================================

/// Where the resolved client IP came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractedIp<'a> {
    FromXff(&'a str),
    FromRealIp(&'a str),
    NotFound,
}

/// Raw forwarding-header lookup. Blank values count as absent.
fn extract_ip_from_headers<B>(req: &Request<B>) -> ExtractedIp<'_> {
    // Format: "client, proxy1, proxy2"
    if let Some(first_ip) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return ExtractedIp::FromXff(first_ip);
    }

    if let Some(real_ip) = req
        .headers()
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return ExtractedIp::FromRealIp(real_ip);
    }

    ExtractedIp::NotFound
}

/// The socket peer, when the server was started with connect info.
fn peer_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// Resolve the key identifying a client for rate limiting.
///
/// Returns `Cow::Borrowed(UNKNOWN_IP)` when nothing identifies the client.
pub fn extract_client_ip<B>(
    req: &Request<B>,
    trusted_proxies: &TrustedProxyConfig,
) -> Cow<'static, str> {
    let peer = peer_ip(req);

    if let Some(peer) = peer
        && !trusted_proxies.is_trusted(&peer)
    {
        if extract_ip_from_headers(req) != ExtractedIp::NotFound {
            debug!(peer = %peer, "Ignoring forwarding headers from untrusted peer");
        }
        return Cow::Owned(peer.to_string());
    }

    match extract_ip_from_headers(req) {
        ExtractedIp::FromXff(ip) | ExtractedIp::FromRealIp(ip) => Cow::Owned(ip.to_string()),
        ExtractedIp::NotFound => match peer {
            Some(peer) => Cow::Owned(peer.to_string()),
            None => Cow::Borrowed(UNKNOWN_IP),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn no_proxies() -> TrustedProxyConfig {
        TrustedProxyConfig::default()
    }

    fn with_peer(mut req: Request<Body>, peer: &str) -> Request<Body> {
        let addr: SocketAddr = peer.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        req
    }

    #[test]
    fn test_extract_ip_from_xff() {
        let req = Request::builder()
            .header("x-forwarded-for", "192.168.1.1, 10.0.0.1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&req, &no_proxies()), "192.168.1.1");
    }

    #[test]
    fn test_extract_ip_from_real_ip() {
        let req = Request::builder()
            .header("x-real-ip", "192.168.1.1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&req, &no_proxies()), "192.168.1.1");
    }

    #[test]
    fn test_extract_ip_xff_priority_over_real_ip() {
        let req = Request::builder()
            .header("x-forwarded-for", "10.0.0.1")
            .header("x-real-ip", "192.168.1.1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&req, &no_proxies()), "10.0.0.1");
    }

    #[test]
    fn test_extract_ip_with_whitespace() {
        let req = Request::builder()
            .header("x-forwarded-for", "  192.168.1.1  , 10.0.0.1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&req, &no_proxies()), "192.168.1.1");
    }

    #[test]
    fn test_blank_xff_falls_through_to_real_ip() {
        let req = Request::builder()
            .header("x-forwarded-for", "   ")
            .header("x-real-ip", "::1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&req, &no_proxies()), "::1");
    }

    #[test]
    fn test_peer_address_fallback() {
        let req = with_peer(Request::new(Body::empty()), "198.51.100.7:51234");

        assert_eq!(extract_client_ip(&req, &no_proxies()), "198.51.100.7");
    }

    #[test]
    fn test_unknown_is_borrowed() {
        let req = Request::new(Body::empty());

        let ip = extract_client_ip(&req, &no_proxies());
        assert_eq!(ip, UNKNOWN_IP);
        assert!(matches!(ip, Cow::Borrowed(_)));
    }

    #[test]
    fn test_untrusted_peer_headers_ignored() {
        let trusted = TrustedProxyConfig::new(&["10.0.0.0/8".to_string()]);
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::empty())
            .unwrap();
        let req = with_peer(req, "192.0.2.44:4000");

        assert_eq!(extract_client_ip(&req, &trusted), "192.0.2.44");
    }

    #[test]
    fn test_trusted_peer_headers_honored() {
        let trusted = TrustedProxyConfig::new(&["10.0.0.0/8".to_string()]);
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.1.2.3")
            .body(Body::empty())
            .unwrap();
        let req = with_peer(req, "10.1.2.3:4000");

        assert_eq!(extract_client_ip(&req, &trusted), "203.0.113.9");
    }

    #[test]
    fn test_extract_ip_xff_with_ipv6() {
        let req = Request::builder()
            .header("x-forwarded-for", "2001:db8::1, 10.0.0.1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&req, &no_proxies()), "2001:db8::1");
    }

    // ==========================================================================
    // CIDR Range Tests
    // ==========================================================================

    #[test]
    fn test_cidr_parse() {
        assert_eq!(CidrRange::parse("10.0.0.0/8").unwrap().prefix_len, 8);
        assert_eq!(CidrRange::parse("::1/128").unwrap().prefix_len, 128);
        assert_eq!(CidrRange::parse("192.168.1.1").unwrap().prefix_len, 32);
    }

    #[test]
    fn test_cidr_parse_invalid() {
        assert!(CidrRange::parse("not-an-ip").is_none());
        assert!(CidrRange::parse("10.0.0.0/33").is_none());
        assert!(CidrRange::parse("10.0.0.0/8/1").is_none());
    }

    #[test]
    fn test_cidr_contains_ipv4() {
        let cidr = CidrRange::parse("192.168.1.0/24").unwrap();

        assert!(cidr.contains(&"192.168.1.1".parse().unwrap()));
        assert!(cidr.contains(&"192.168.1.254".parse().unwrap()));
        assert!(!cidr.contains(&"192.168.2.1".parse().unwrap()));
        assert!(!cidr.contains(&"::1".parse().unwrap()));
    }

    #[test]
    fn test_cidr_zero_prefix_matches_everything() {
        let cidr = CidrRange::parse("0.0.0.0/0").unwrap();
        assert!(cidr.contains(&"8.8.8.8".parse().unwrap()));
    }

    #[test]
    fn test_trusted_proxy_config() {
        let empty = TrustedProxyConfig::new(&[]);
        assert!(!empty.is_enabled());
        assert!(empty.is_trusted(&"1.2.3.4".parse().unwrap()));

        let config = TrustedProxyConfig::new(&[
            "10.0.0.0/8".to_string(),
            "bogus".to_string(),
            "172.16.0.0/12".to_string(),
        ]);
        assert!(config.is_enabled());
        assert!(config.is_trusted(&"172.31.255.255".parse().unwrap()));
        assert!(!config.is_trusted(&"8.8.8.8".parse().unwrap()));
    }
}
