// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IPv4 address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32 for IPv4)")]
    InvalidPrefixLength(u8),

    #[error("Host bits set in network block: {0}")]
    HostBitsSet(String),

    #[error("Invalid port: {0} (must be 1-65535)")]
    InvalidPort(u16),

    #[error("Invalid port range: {from}-{to}")]
    InvalidPortRange { from: u16, to: u16 },
}

/// IPv4 network block in CIDR notation
///
/// Invariants:
/// - Prefix length 0-32
/// - Canonical form (no host bits set below the prefix)
///
/// # Examples
///
/// ```rust
/// use cim_cluster_topology::domain::Ipv4Cidr;
///
/// let block: Ipv4Cidr = "10.92.0.0/16".parse().unwrap();
/// assert_eq!(block.subnet_capacity(24), 256);
/// assert_eq!(block.subnet(24, 2).unwrap().to_string(), "10.92.2.0/24");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Cidr {
    /// The default route destination
    pub const ANY: Ipv4Cidr = Ipv4Cidr {
        network: Ipv4Addr::UNSPECIFIED,
        prefix_len: 0,
    };

    /// Create a network block
    ///
    /// # Invariants
    /// - Prefix length 0-32
    /// - Address must be the network address of the block
    pub fn new(network: Ipv4Addr, prefix_len: u8) -> Result<Self, NetworkError> {
        if prefix_len > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix_len));
        }

        if u32::from(network) & !Self::mask(prefix_len) != 0 {
            return Err(NetworkError::HostBitsSet(format!("{network}/{prefix_len}")));
        }

        Ok(Self {
            network,
            prefix_len,
        })
    }

    pub(super) const fn new_unchecked(network: Ipv4Addr, prefix_len: u8) -> Self {
        Self {
            network,
            prefix_len,
        }
    }

    fn mask(prefix_len: u8) -> u32 {
        if prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(prefix_len))
        }
    }

    /// Get the network address
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// Get the prefix length
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Last address in the block
    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network) | !Self::mask(self.prefix_len))
    }

    /// Number of disjoint `/new_prefix` blocks this block partitions into
    ///
    /// Zero when `new_prefix` is shorter than this block's prefix or longer
    /// than 32.
    pub fn subnet_capacity(&self, new_prefix: u8) -> u64 {
        if new_prefix < self.prefix_len || new_prefix > 32 {
            return 0;
        }
        1u64 << (new_prefix - self.prefix_len)
    }

    /// The `index`-th `/new_prefix` block, counting upward from the network address
    pub fn subnet(&self, new_prefix: u8, index: u64) -> Option<Ipv4Cidr> {
        if index >= self.subnet_capacity(new_prefix) {
            return None;
        }

        let step = 1u64 << (32 - u32::from(new_prefix));
        let start = u64::from(u32::from(self.network)) + index * step;
        let network = Ipv4Addr::from(u32::try_from(start).ok()?);

        Some(Ipv4Cidr {
            network,
            prefix_len: new_prefix,
        })
    }

    /// Check whether `other` lies entirely within this block
    pub fn contains(&self, other: &Ipv4Cidr) -> bool {
        other.prefix_len >= self.prefix_len
            && u32::from(other.network) & Self::mask(self.prefix_len) == u32::from(self.network)
    }

    /// Check whether two blocks share any address
    pub fn overlaps(&self, other: &Ipv4Cidr) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, prefix_str) = s
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(s.to_string()))?;

        let network = Ipv4Addr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;

        let prefix_len = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(s.to_string()))?;

        Self::new(network, prefix_len)
    }
}

impl TryFrom<String> for Ipv4Cidr {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ipv4Cidr> for String {
    fn from(value: Ipv4Cidr) -> Self {
        value.to_string()
    }
}

/// TCP/UDP port value object
///
/// Invariant: 1-65535. Port 0 is not addressable by a listener or rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// Remote shell
    pub const SSH: Port = Port(22);
    /// Plaintext web
    pub const HTTP: Port = Port(80);
    /// Secure web
    pub const HTTPS: Port = Port(443);
    /// Cluster API server
    pub const CLUSTER_API: Port = Port(16443);

    /// Create a port with validation
    pub fn new(port: u16) -> Result<Self, NetworkError> {
        if port == 0 {
            return Err(NetworkError::InvalidPort(port));
        }
        Ok(Self(port))
    }

    /// Get the port number
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = NetworkError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Port> for u16 {
    fn from(value: Port) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_parse_cidr() {
        let block: Ipv4Cidr = "10.92.0.0/16".parse().unwrap();
        assert_eq!(block.network(), Ipv4Addr::new(10, 92, 0, 0));
        assert_eq!(block.prefix_len(), 16);
        assert_eq!(block.to_string(), "10.92.0.0/16");
        assert_eq!(block.broadcast(), Ipv4Addr::new(10, 92, 255, 255));
    }

    #[test_case("10.92.0.0"; "missing prefix")]
    #[test_case("10.92.0.0/33"; "prefix too long")]
    #[test_case("10.92.0.1/16"; "host bits set")]
    #[test_case("999.0.0.0/8"; "bad octet")]
    #[test_case("10.92.0.0/x"; "non numeric prefix")]
    fn test_invalid_cidr(input: &str) {
        assert!(input.parse::<Ipv4Cidr>().is_err());
    }

    #[test_case(16, 24, 256)]
    #[test_case(20, 24, 16)]
    #[test_case(24, 24, 1)]
    #[test_case(25, 24, 0)]
    #[test_case(8, 24, 65536)]
    fn test_subnet_capacity(prefix: u8, new_prefix: u8, expected: u64) {
        let block = Ipv4Cidr::new(Ipv4Addr::new(10, 0, 0, 0), prefix).unwrap();
        assert_eq!(block.subnet_capacity(new_prefix), expected);
    }

    #[test]
    fn test_sequential_subnets() {
        let block: Ipv4Cidr = "10.92.0.0/16".parse().unwrap();
        let subnets: Vec<String> = (0..3)
            .map(|i| block.subnet(24, i).unwrap().to_string())
            .collect();
        assert_eq!(subnets, vec!["10.92.0.0/24", "10.92.1.0/24", "10.92.2.0/24"]);
        assert_eq!(block.subnet(24, 255).unwrap().to_string(), "10.92.255.0/24");
        assert!(block.subnet(24, 256).is_none());
    }

    #[test]
    fn test_overlap() {
        let block: Ipv4Cidr = "10.92.0.0/16".parse().unwrap();
        let a = block.subnet(24, 0).unwrap();
        let b = block.subnet(24, 1).unwrap();
        assert!(block.contains(&a));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&block));
        assert!(Ipv4Cidr::ANY.contains(&block));
    }

    #[test]
    fn test_port() {
        assert_eq!(Port::new(443).unwrap(), Port::HTTPS);
        assert!(Port::new(0).is_err());
        assert_eq!(serde_json::to_string(&Port::HTTP).unwrap(), "80");
        assert!(serde_json::from_str::<Port>("0").is_err());
    }

    #[test]
    fn test_cidr_serde() {
        let block: Ipv4Cidr = serde_json::from_str("\"10.90.0.0/16\"").unwrap();
        assert_eq!(serde_json::to_string(&block).unwrap(), "\"10.90.0.0/16\"");
        assert!(serde_json::from_str::<Ipv4Cidr>("\"10.90.0.1/16\"").is_err());
    }
}
