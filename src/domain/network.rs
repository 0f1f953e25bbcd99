// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants
//!
//! Address space, ports, ingress rules and listener descriptors used by the
//! network and traffic builders.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

use crate::graph::LogicalId;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IPv4 address: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(u8),

    #[error("Address {address} has host bits set for /{prefix_length}")]
    HostBitsSet { address: Ipv4Addr, prefix_length: u8 },

    #[error("Cannot carve /{requested} subnets out of {block}")]
    SubnetTooLarge { block: String, requested: u8 },

    #[error("Subnet index {index} out of range for /{requested} in {block} ({available} available)")]
    SubnetIndexOutOfRange {
        block: String,
        requested: u8,
        index: u32,
        available: u32,
    },

    #[error("Invalid port: {0}")]
    InvalidPort(u16),
}

/// IPv4 CIDR block value object
///
/// Invariants:
/// - Prefix length 0-32
/// - Network address has no host bits set
///
/// # Examples
///
/// ```rust
/// use portfolio_infrastructure::domain::CidrBlock;
///
/// let vpc = CidrBlock::new("10.0.0.0/16").unwrap();
/// assert_eq!(vpc.subnet(24, 3).unwrap().to_string(), "10.0.3.0/24");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CidrBlock {
    network: Ipv4Addr,
    prefix_length: u8,
}

impl CidrBlock {
    /// Parse a block such as `10.0.0.0/16`
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref();
        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(cidr.to_string()))?;

        let network = Ipv4Addr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;
        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        Self::from_parts(network, prefix_length)
    }

    /// Create from a network address and prefix length
    pub fn from_parts(network: Ipv4Addr, prefix_length: u8) -> Result<Self, NetworkError> {
        if prefix_length > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        if u32::from(network) & !Self::mask(prefix_length) != 0 {
            return Err(NetworkError::HostBitsSet {
                address: network,
                prefix_length,
            });
        }

        Ok(Self {
            network,
            prefix_length,
        })
    }

    fn mask(prefix_length: u8) -> u32 {
        if prefix_length == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(prefix_length))
        }
    }

    /// Network address
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// Prefix length
    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// Number of `/new_prefix` subnets this block holds
    pub fn subnet_count(&self, new_prefix: u8) -> Result<u32, NetworkError> {
        if new_prefix > 32 {
            return Err(NetworkError::InvalidPrefixLength(new_prefix));
        }
        if new_prefix < self.prefix_length {
            return Err(NetworkError::SubnetTooLarge {
                block: self.to_string(),
                requested: new_prefix,
            });
        }
        let bits = u32::from(new_prefix - self.prefix_length);
        Ok(1u32.checked_shl(bits).unwrap_or(u32::MAX))
    }

    /// The `index`-th `/new_prefix` subnet of this block
    pub fn subnet(&self, new_prefix: u8, index: u32) -> Result<Self, NetworkError> {
        let available = self.subnet_count(new_prefix)?;
        if index >= available {
            return Err(NetworkError::SubnetIndexOutOfRange {
                block: self.to_string(),
                requested: new_prefix,
                index,
                available,
            });
        }

        let size = 1u64 << (32 - u32::from(new_prefix));
        let base = u64::from(u32::from(self.network)) + size * u64::from(index);
        // base stays within the parent block, so it fits in 32 bits
        let network = Ipv4Addr::from(base as u32);
        Self::from_parts(network, new_prefix)
    }

    /// Whether `other` lies entirely inside this block
    pub fn contains(&self, other: &CidrBlock) -> bool {
        other.prefix_length >= self.prefix_length
            && u32::from(other.network) & Self::mask(self.prefix_length)
                == u32::from(self.network)
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_length)
    }
}

impl FromStr for CidrBlock {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CidrBlock {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CidrBlock> for String {
    fn from(value: CidrBlock) -> Self {
        value.to_string()
    }
}

/// TCP port value object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Port(u16);

impl Port {
    /// Plain HTTP listener
    pub const HTTP: Port = Port(80);

    /// TLS listener
    pub const HTTPS: Port = Port(443);

    /// Port the site container listens on
    pub const CONTAINER: Port = Port(3000);

    /// Create a port, rejecting 0
    pub fn new(port: u16) -> Result<Self, NetworkError> {
        if port == 0 {
            return Err(NetworkError::InvalidPort(port));
        }
        Ok(Self(port))
    }

    /// Numeric value
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where inbound traffic may come from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IngressSource {
    /// Any IPv4 address (`0.0.0.0/0`)
    AnyIpv4,
    /// Members of another security group in the same graph
    SecurityGroup(LogicalId),
}

impl fmt::Display for IngressSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyIpv4 => write!(f, "0.0.0.0/0"),
            Self::SecurityGroup(id) => write!(f, "sg:{id}"),
        }
    }
}

/// A single TCP ingress permission
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IngressRule {
    pub source: IngressSource,
    pub port: Port,
    pub description: String,
}

impl IngressRule {
    /// Allow `port` from anywhere
    pub fn from_anywhere(port: Port, description: impl Into<String>) -> Self {
        Self {
            source: IngressSource::AnyIpv4,
            port,
            description: description.into(),
        }
    }

    /// Allow `port` from members of `group`
    pub fn from_group(group: &LogicalId, port: Port, description: impl Into<String>) -> Self {
        Self {
            source: IngressSource::SecurityGroup(group.clone()),
            port,
            description: description.into(),
        }
    }
}

/// Listener protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    /// Canonical upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "HTTP",
            Self::Https => "HTTPS",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a listener does with a request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListenerAction {
    /// Forward to a target group
    Forward { target_group: LogicalId },
    /// Answer with a redirect
    Redirect {
        protocol: Protocol,
        port: Port,
        permanent: bool,
    },
}

/// Port, protocol and default action of one listener
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerDescriptor {
    pub port: Port,
    pub protocol: Protocol,
    pub action: ListenerAction,
    pub certificate: Option<LogicalId>,
}

impl ListenerDescriptor {
    /// Whether this listener forwards traffic to a target group
    pub fn is_forwarding(&self) -> bool {
        matches!(self.action, ListenerAction::Forward { .. })
    }
}
