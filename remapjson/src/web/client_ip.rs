//! Client address resolution.
//!
//! `X-Real-IP` wins, then the leftmost `X-Forwarded-For` entry, then the
//! socket peer address.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

/// Resolved client address, stored as a request extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub Option<IpAddr>);

pub fn resolve(headers: &HeaderMap, remote: Option<SocketAddr>) -> Option<IpAddr> {
    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    header_ip("x-real-ip")
        .or_else(|| header_ip("x-forwarded-for"))
        .or_else(|| remote.map(|addr| addr.ip()))
}

/// Attach a [`ClientIp`] to every request.
pub async fn real_ip(mut request: Request, next: Next) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let ip = resolve(request.headers(), remote);
    request.extensions_mut().insert(ClientIp(ip));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn test_precedence() {
        let peer: SocketAddr = "10.0.0.1:5000".parse().unwrap();
        let peer_ip: IpAddr = "10.0.0.1".parse().unwrap();

        assert_eq!(resolve(&headers(&[]), Some(peer)), Some(peer_ip));
        assert_eq!(
            resolve(&headers(&[("x-forwarded-for", "1.2.3.4, 10.0.0.9")]), Some(peer)),
            Some("1.2.3.4".parse().unwrap())
        );
        assert_eq!(
            resolve(
                &headers(&[("x-real-ip", "5.6.7.8"), ("x-forwarded-for", "1.2.3.4")]),
                Some(peer)
            ),
            Some("5.6.7.8".parse().unwrap())
        );
    }

    #[test]
    fn test_garbage_headers_fall_back() {
        let peer: SocketAddr = "[::1]:80".parse().unwrap();
        let resolved = resolve(&headers(&[("x-real-ip", "not-an-ip")]), Some(peer));
        assert_eq!(resolved, Some("::1".parse().unwrap()));
        assert_eq!(resolve(&headers(&[]), None), None);
    }
}
