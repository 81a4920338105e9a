//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Only the public account endpoints (register, login, password reset) are
//! limited; everything else requires a session.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Key extractor keyed on the client IP.
///
/// Proxy headers are only honoured when a trusted reverse proxy sits in
/// front of the API. Otherwise a client could pick a fresh key per request,
/// so the peer address of the connection is used.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor {
    trust_proxy_headers: bool,
}

impl ClientIpKeyExtractor {
    #[must_use]
    pub const fn new(trust_proxy_headers: bool) -> Self {
        Self {
            trust_proxy_headers,
        }
    }
}

/// Proxy headers carrying a single client IP, in order of preference.
const SINGLE_IP_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-real-ip", "fly-client-ip"];

fn header_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let single = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    };

    // X-Forwarded-For: first IP in the chain
    let forwarded = || {
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    };

    single(SINGLE_IP_HEADERS[0])
        .or_else(forwarded)
        .or_else(|| SINGLE_IP_HEADERS[1..].iter().copied().find_map(single))
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if self.trust_proxy_headers
            && let Some(ip) = header_ip(req.headers())
        {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
/// `trust_proxy_headers` decides where the client IP is read from, see
/// [`ClientIpKeyExtractor`].
///
/// # Panics
///
/// This function will not panic. `per_second(6)` and `burst_size(5)` are
/// always accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter(trust_proxy_headers: bool) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor::new(trust_proxy_headers))
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    const BEHIND_PROXY: ClientIpKeyExtractor = ClientIpKeyExtractor::new(true);
    const DIRECT: ClientIpKeyExtractor = ClientIpKeyExtractor::new(false);

    fn request() -> axum::http::request::Builder {
        Request::builder().uri("/api/users/login")
    }

    fn with_peer<T>(mut req: Request<T>, peer: &str) -> Request<T> {
        req.extensions_mut()
            .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
        req
    }

    #[test]
    fn test_prefers_cloudflare_header() {
        let req = request()
            .header("cf-connecting-ip", "203.0.113.7")
            .header("x-forwarded-for", "198.51.100.1")
            .body(())
            .unwrap();
        assert_eq!(
            BEHIND_PROXY.extract(&req).unwrap(),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_uses_first_forwarded_address() {
        let req = request()
            .header("x-forwarded-for", "198.51.100.1, 10.0.0.1")
            .body(())
            .unwrap();
        assert_eq!(
            BEHIND_PROXY.extract(&req).unwrap(),
            "198.51.100.1".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let req = with_peer(request().body(()).unwrap(), "192.0.2.10:51000");
        assert_eq!(
            BEHIND_PROXY.extract(&req).unwrap(),
            "192.0.2.10".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_untrusted_headers_cannot_pick_a_new_key() {
        let keys: Vec<IpAddr> = (1..=3)
            .map(|n| {
                let req = request()
                    .header("x-forwarded-for", format!("10.0.0.{n}"))
                    .header("cf-connecting-ip", format!("10.0.1.{n}"))
                    .body(())
                    .unwrap();
                DIRECT
                    .extract(&with_peer(req, "192.0.2.10:51000"))
                    .unwrap()
            })
            .collect();

        let peer = "192.0.2.10".parse::<IpAddr>().unwrap();
        assert_eq!(keys, vec![peer; 3]);
    }

    #[test]
    fn test_no_source_is_an_error() {
        let req = request().header("x-forwarded-for", "10.0.0.1").body(()).unwrap();
        assert!(DIRECT.extract(&req).is_err());
        assert!(BEHIND_PROXY.extract(&request().body(()).unwrap()).is_err());
    }
}
