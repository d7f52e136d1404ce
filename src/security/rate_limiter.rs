//! Per-client request quota for mutating and API routes.

use axum::http::{HeaderMap, Method};
use std::net::IpAddr;
use std::time::Duration;

use super::access_counter::AccessCounter;
use super::trust::{ResolvedIp, TrustResolver};

pub const DEFAULT_LIMIT_PER_MINUTE: u32 = 60;

/// Outcome of admitting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Route is not rate limited.
    Exempt,
    Allowed { client: ResolvedIp, rate: u32 },
    Rejected { client: ResolvedIp, rate: u32 },
}

pub struct RateLimiter {
    resolver: TrustResolver,
    counter: AccessCounter,
    limit_per_minute: u32,
}

impl RateLimiter {
    pub fn new(resolver: TrustResolver, limit_per_minute: u32, ttl: Duration) -> Self {
        Self {
            resolver,
            counter: AccessCounter::new(ttl),
            limit_per_minute,
        }
    }

    pub fn limit_per_minute(&self) -> u32 {
        self.limit_per_minute
    }

    /// Attributes the request to a client, counts it, and decides whether it
    /// is within quota. Read-only routes are exempt and not counted.
    pub fn admit(&self, method: &Method, path: &str, peer: IpAddr, headers: &HeaderMap) -> Admission {
        if !is_rate_limited(method, path) {
            return Admission::Exempt;
        }

        let client = self.resolver.resolve(peer, headers);
        let rate = self.counter.hit(client.ip);

        if rate > self.limit_per_minute {
            Admission::Rejected { client, rate }
        } else {
            Admission::Allowed { client, rate }
        }
    }
}

/// Mutating methods and everything under `/api/` count against the quota.
pub fn is_rate_limited(method: &Method, path: &str) -> bool {
    [Method::POST, Method::PUT, Method::DELETE, Method::PATCH].contains(method)
        || path.starts_with("/api/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::network::NetworkSet;
    use crate::security::trust::IpSource;

    fn limiter(limit: u32) -> RateLimiter {
        RateLimiter::new(
            TrustResolver::new(NetworkSet::default(), NetworkSet::from_csv("10.0.0.0/8", "proxy")),
            limit,
            Duration::from_secs(86_400),
        )
    }

    #[test]
    fn test_route_classification() {
        assert!(is_rate_limited(&Method::POST, "/api/v1/create"));
        assert!(is_rate_limited(&Method::PUT, "/anything"));
        assert!(is_rate_limited(&Method::DELETE, "/abc1234"));
        assert!(is_rate_limited(&Method::GET, "/api/v1/create"));
        assert!(!is_rate_limited(&Method::GET, "/abc1234"));
        assert!(!is_rate_limited(&Method::GET, "/health"));
        assert!(!is_rate_limited(&Method::HEAD, "/apiary"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejects_after_limit() {
        let limiter = limiter(3);
        let peer: IpAddr = "203.0.113.1".parse().unwrap();
        let headers = HeaderMap::new();

        for expected in 1..=3 {
            assert_eq!(
                limiter.admit(&Method::POST, "/api/v1/create", peer, &headers),
                Admission::Allowed {
                    client: ResolvedIp {
                        ip: peer,
                        source: IpSource::Peer
                    },
                    rate: expected
                }
            );
        }

        assert!(matches!(
            limiter.admit(&Method::POST, "/api/v1/create", peer, &headers),
            Admission::Rejected { rate: 4, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exempt_routes_are_not_counted() {
        let limiter = limiter(1);
        let peer: IpAddr = "203.0.113.1".parse().unwrap();
        let headers = HeaderMap::new();

        for _ in 0..10 {
            assert_eq!(
                limiter.admit(&Method::GET, "/abc1234", peer, &headers),
                Admission::Exempt
            );
        }
        assert!(matches!(
            limiter.admit(&Method::POST, "/api/v1/create", peer, &headers),
            Admission::Allowed { rate: 1, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spoofed_header_counts_against_peer() {
        let limiter = limiter(2);
        let peer: IpAddr = "203.0.113.1".parse().unwrap();

        for i in 0..3 {
            let mut headers = HeaderMap::new();
            headers.insert(
                "x-forwarded-for",
                format!("198.51.100.{i}").parse().unwrap(),
            );
            let admission = limiter.admit(&Method::POST, "/api/v1/create", peer, &headers);
            if i < 2 {
                assert!(matches!(admission, Admission::Allowed { .. }));
            } else {
                assert!(matches!(admission, Admission::Rejected { .. }));
            }
        }
    }
}
