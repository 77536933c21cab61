//! Client address resolution.
//!
//! View counting trusts the first entry of `X-Forwarded-For` and falls back
//! to the socket peer recorded by `into_make_service_with_connect_info`.
//! Throttling uses the opposite order, since the header is client-supplied.

use std::convert::Infallible;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use agora_shared::constants::{FORWARDED_FOR_HEADER, UNKNOWN_CLIENT_IP};
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap};

/// Resolve the client IP: forwarded header first, then the peer address.
pub fn resolve_client_ip(headers: &HeaderMap, extensions: &Extensions) -> Option<IpAddr> {
    forwarded_for(headers).or_else(|| peer_ip(extensions))
}

/// Resolve the address to throttle: the socket peer first, then the
/// forwarded header when no peer was recorded.
pub fn resolve_throttle_ip(headers: &HeaderMap, extensions: &Extensions) -> Option<IpAddr> {
    peer_ip(extensions).or_else(|| forwarded_for(headers))
}

fn peer_ip(extensions: &Extensions) -> Option<IpAddr> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|connect_info| connect_info.0.ip())
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    let value = headers.get(FORWARDED_FOR_HEADER)?.to_str().ok()?;
    value.split(',').next()?.trim().parse::<IpAddr>().ok()
}

/// Extractor yielding the resolved client address, or `None` when neither
/// source is available (e.g. requests driven directly through the router in
/// tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub Option<IpAddr>);

impl ClientIp {
    /// Key under which per-IP state (view records, rate buckets) is stored.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ClientIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ip) => write!(f, "{ip}"),
            None => f.write_str(UNKNOWN_CLIENT_IP),
        }
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(resolve_client_ip(&parts.headers, &parts.extensions)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(xff: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(FORWARDED_FOR_HEADER, HeaderValue::from_str(xff).unwrap());
        h
    }

    fn peer(addr: &str) -> Extensions {
        let mut ext = Extensions::new();
        ext.insert(ConnectInfo(addr.parse::<SocketAddr>().unwrap()));
        ext
    }

    #[test]
    fn forwarded_for_takes_first_entry() {
        let ip = resolve_client_ip(&headers("203.0.113.7, 10.0.0.1"), &peer("127.0.0.1:5000"));
        assert_eq!(ip, Some("203.0.113.7".parse().unwrap()));
    }

    #[test]
    fn falls_back_to_peer_address() {
        let ip = resolve_client_ip(&HeaderMap::new(), &peer("192.168.1.9:40000"));
        assert_eq!(ip, Some("192.168.1.9".parse().unwrap()));
    }

    #[test]
    fn garbage_forwarded_header_is_ignored() {
        let ip = resolve_client_ip(&headers("not-an-ip"), &peer("10.1.1.1:1"));
        assert_eq!(ip, Some("10.1.1.1".parse().unwrap()));
    }

    #[test]
    fn throttling_prefers_the_peer() {
        let ip = resolve_throttle_ip(&headers("203.0.113.7"), &peer("198.51.100.4:443"));
        assert_eq!(ip, Some("198.51.100.4".parse().unwrap()));

        let ip = resolve_throttle_ip(&headers("203.0.113.7"), &Extensions::new());
        assert_eq!(ip, Some("203.0.113.7".parse().unwrap()));
    }

    #[test]
    fn unknown_when_no_source() {
        let ip = ClientIp(resolve_client_ip(&HeaderMap::new(), &Extensions::new()));
        assert_eq!(ip.key(), "unknown");
    }
}
