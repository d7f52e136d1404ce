//! Abuse prevention: client attribution and request quotas.
//!
//! - [`network`] - CIDR blocks and trusted network sets
//! - [`trust`] - which forwarding headers to believe
//! - [`access_counter`] - per-IP hit counts with periodic reset
//! - [`rate_limiter`] - ties the above into an admit/reject decision

pub mod access_counter;
pub mod network;
pub mod rate_limiter;
pub mod trust;

pub use access_counter::AccessCounter;
pub use network::{NetworkSet, parse_network};
pub use rate_limiter::{Admission, RateLimiter};
pub use trust::{IpSource, ResolvedIp, TrustResolver};
