//! Client IP attribution behind CDNs and reverse proxies.
//!
//! A forwarding header is believed only when the socket peer that delivered
//! it belongs to the matching trusted network set:
//!
//! | Header             | Trusted when peer is in  | Entry used  |
//! |--------------------|--------------------------|-------------|
//! | `CF-Connecting-IP` | CDN set                  | whole value |
//! | `X-Forwarded-For`  | reverse-proxy set        | right-most  |
//!
//! `CF-Connecting-IP` wins when both are present. In every other case the
//! request is attributed to the socket peer.

use axum::http::HeaderMap;
use std::net::IpAddr;

use super::network::NetworkSet;

pub const CDN_CLIENT_IP_HEADER: &str = "cf-connecting-ip";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Why a request was attributed to the address it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpSource {
    /// No forwarding header; the socket peer.
    Peer,
    /// `CF-Connecting-IP` from a trusted CDN peer.
    Cdn,
    /// Right-most `X-Forwarded-For` entry from a trusted proxy peer.
    ReverseProxy,
    /// A header was present but the peer is not trusted to set it.
    UntrustedProxy,
    /// A trusted peer sent a header that is not an IP address.
    UnparseableHeader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedIp {
    pub ip: IpAddr,
    pub source: IpSource,
}

#[derive(Debug, Clone, Default)]
pub struct TrustResolver {
    cdn: NetworkSet,
    reverse_proxy: NetworkSet,
}

impl TrustResolver {
    pub fn new(cdn: NetworkSet, reverse_proxy: NetworkSet) -> Self {
        Self { cdn, reverse_proxy }
    }

    /// Picks the address to rate-limit `peer`'s request under.
    pub fn resolve(&self, peer: IpAddr, headers: &HeaderMap) -> ResolvedIp {
        if let Some(value) = last_header(headers, CDN_CLIENT_IP_HEADER) {
            return self.believe(peer, value, &self.cdn, IpSource::Cdn, |v| Some(v));
        }

        if let Some(value) = last_header(headers, FORWARDED_FOR_HEADER) {
            return self.believe(peer, value, &self.reverse_proxy, IpSource::ReverseProxy, |v| {
                v.rsplit(',').next()
            });
        }

        ResolvedIp {
            ip: peer,
            source: IpSource::Peer,
        }
    }

    fn believe(
        &self,
        peer: IpAddr,
        value: &axum::http::HeaderValue,
        trusted: &NetworkSet,
        source: IpSource,
        pick: impl Fn(&str) -> Option<&str>,
    ) -> ResolvedIp {
        if !trusted.contains(peer) {
            tracing::warn!(
                peer = %peer,
                header = ?value,
                "Forwarding header from untrusted peer ignored, possible spoof"
            );
            return ResolvedIp {
                ip: peer,
                source: IpSource::UntrustedProxy,
            };
        }

        let declared = value
            .to_str()
            .ok()
            .and_then(pick)
            .and_then(|entry| entry.trim().parse::<IpAddr>().ok());

        match declared {
            Some(ip) => ResolvedIp { ip, source },
            None => {
                tracing::warn!(
                    peer = %peer,
                    header = ?value,
                    "Trusted peer sent an unparseable client address"
                );
                ResolvedIp {
                    ip: peer,
                    source: IpSource::UnparseableHeader,
                }
            }
        }
    }
}

fn last_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a axum::http::HeaderValue> {
    headers.get_all(name).iter().last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const CDN_PEER: &str = "173.245.48.10";
    const PROXY_PEER: &str = "10.0.0.2";
    const STRANGER: &str = "203.0.113.50";

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn resolver() -> TrustResolver {
        TrustResolver::new(
            NetworkSet::from_csv("173.245.48.0/20,2400:cb00::/32", "cdn"),
            NetworkSet::from_csv("10.0.0.0/8", "proxy"),
        )
    }

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_no_headers_uses_peer() {
        let resolved = resolver().resolve(ip(STRANGER), &HeaderMap::new());
        assert_eq!(
            resolved,
            ResolvedIp {
                ip: ip(STRANGER),
                source: IpSource::Peer
            }
        );
    }

    #[test]
    fn test_trusted_cdn_header_replaces_peer() {
        let resolved = resolver().resolve(
            ip(CDN_PEER),
            &headers(&[("cf-connecting-ip", "198.51.100.23")]),
        );
        assert_eq!(resolved.ip, ip("198.51.100.23"));
        assert_eq!(resolved.source, IpSource::Cdn);
    }

    #[test]
    fn test_cdn_header_from_stranger_is_ignored() {
        let resolved = resolver().resolve(
            ip(STRANGER),
            &headers(&[("cf-connecting-ip", "198.51.100.23")]),
        );
        assert_eq!(resolved.ip, ip(STRANGER));
        assert_eq!(resolved.source, IpSource::UntrustedProxy);
    }

    #[test]
    fn test_cdn_header_from_reverse_proxy_is_ignored() {
        let resolved = resolver().resolve(
            ip(PROXY_PEER),
            &headers(&[("cf-connecting-ip", "198.51.100.23")]),
        );
        assert_eq!(resolved.ip, ip(PROXY_PEER));
        assert_eq!(resolved.source, IpSource::UntrustedProxy);
    }

    #[test]
    fn test_trusted_proxy_uses_rightmost_forwarded_entry() {
        let resolved = resolver().resolve(
            ip(PROXY_PEER),
            &headers(&[("x-forwarded-for", "1.1.1.1, 2.2.2.2, 198.51.100.9")]),
        );
        assert_eq!(resolved.ip, ip("198.51.100.9"));
        assert_eq!(resolved.source, IpSource::ReverseProxy);
    }

    #[test]
    fn test_forwarded_header_from_stranger_is_ignored() {
        let resolved = resolver().resolve(
            ip(STRANGER),
            &headers(&[("x-forwarded-for", "198.51.100.9")]),
        );
        assert_eq!(resolved.ip, ip(STRANGER));
        assert_eq!(resolved.source, IpSource::UntrustedProxy);
    }

    #[test]
    fn test_cdn_header_takes_precedence() {
        let resolved = resolver().resolve(
            ip(CDN_PEER),
            &headers(&[
                ("x-forwarded-for", "192.0.2.1"),
                ("cf-connecting-ip", "198.51.100.23"),
            ]),
        );
        assert_eq!(resolved.ip, ip("198.51.100.23"));
    }

    #[test]
    fn test_unparseable_header_falls_back_to_peer() {
        let resolved = resolver().resolve(
            ip(PROXY_PEER),
            &headers(&[("x-forwarded-for", "198.51.100.9, unknown")]),
        );
        assert_eq!(resolved.ip, ip(PROXY_PEER));
        assert_eq!(resolved.source, IpSource::UnparseableHeader);
    }

    #[test]
    fn test_ipv6_cdn_peer_and_client() {
        let resolved = resolver().resolve(
            ip("2400:cb00:2049::1"),
            &headers(&[("cf-connecting-ip", "2001:db8::42")]),
        );
        assert_eq!(resolved.ip, ip("2001:db8::42"));
        assert_eq!(resolved.source, IpSource::Cdn);
    }

    #[test]
    fn test_repeated_forwarded_headers_use_last_line() {
        let resolved = resolver().resolve(
            ip(PROXY_PEER),
            &headers(&[
                ("x-forwarded-for", "192.0.2.1"),
                ("x-forwarded-for", "192.0.2.2"),
            ]),
        );
        assert_eq!(resolved.ip, ip("192.0.2.2"));
    }
}
