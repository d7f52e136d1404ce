//! CIDR network blocks and membership sets.

use ipnetwork::{IpNetwork, IpNetworkError, Ipv4Network, Ipv6Network};
use std::collections::HashSet;
use std::hash::Hash;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Parses a block such as `10.0.0.0/8` or `2001:db8::/32`.
///
/// Host bits are cleared, so `10.1.2.3/8` equals `10.0.0.0/8`. A bare
/// address parses as a single-host block.
pub fn parse_network(s: &str) -> Result<IpNetwork, IpNetworkError> {
    let network: IpNetwork = s.trim().parse()?;
    IpNetwork::new(network.network(), network.prefix())
}

/// Whether `network` contains `ip`, matching IPv4-mapped IPv6 addresses
/// against IPv4 blocks.
pub fn network_contains(network: &IpNetwork, ip: IpAddr) -> bool {
    network.contains(ip.to_canonical())
}

/// Membership set over many network blocks.
///
/// Blocks are grouped by prefix length, so a lookup costs one hash probe per
/// distinct prefix length rather than one comparison per block.
#[derive(Debug, Clone, Default)]
pub struct NetworkSet {
    v4: Vec<(u8, HashSet<Ipv4Addr>)>,
    v6: Vec<(u8, HashSet<Ipv6Addr>)>,
    len: usize,
}

impl NetworkSet {
    pub fn new(networks: impl IntoIterator<Item = IpNetwork>) -> Self {
        let mut set = NetworkSet::default();

        for network in networks {
            let inserted = match network {
                IpNetwork::V4(net) => insert_grouped(&mut set.v4, net.prefix(), net.network()),
                IpNetwork::V6(net) => insert_grouped(&mut set.v6, net.prefix(), net.network()),
            };
            if inserted {
                set.len += 1;
            }
        }

        // Most specific first.
        set.v4.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        set.v6.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        set
    }

    /// Parses a comma-separated list of blocks. Invalid entries are logged
    /// and skipped; empty entries are ignored.
    pub fn from_csv(csv: &str, label: &str) -> Self {
        let networks = csv
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| match parse_network(entry) {
                Ok(network) => Some(network),
                Err(e) => {
                    tracing::error!(list = label, entry, "Skipping invalid network block: {}", e);
                    None
                }
            });

        let set = Self::new(networks);
        if set.is_empty() {
            tracing::warn!(list = label, "No trusted network blocks configured");
        }
        set
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        match ip.to_canonical() {
            IpAddr::V4(addr) => self.v4.iter().any(|(prefix, blocks)| {
                Ipv4Network::new(addr, *prefix)
                    .is_ok_and(|block| blocks.contains(&block.network()))
            }),
            IpAddr::V6(addr) => self.v6.iter().any(|(prefix, blocks)| {
                Ipv6Network::new(addr, *prefix)
                    .is_ok_and(|block| blocks.contains(&block.network()))
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Returns false when the block was already present.
fn insert_grouped<T: Hash + Eq>(groups: &mut Vec<(u8, HashSet<T>)>, prefix: u8, network: T) -> bool {
    match groups.iter_mut().find(|(p, _)| *p == prefix) {
        Some((_, blocks)) => blocks.insert(network),
        None => {
            groups.push((prefix, HashSet::from([network])));
            true
        }
    }
}
