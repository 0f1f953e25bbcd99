// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment Environment and Topology Variant
//!
//! The environment tag drives replica and capacity policy; the topology
//! variant independently selects whether the CDN/TLS/DNS layer is built.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::network::Port;

/// Unrecognised environment or topology tag
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvironmentError {
    #[error("Unknown environment: {0:?} (expected dev, staging or prod)")]
    UnknownEnvironment(String),

    #[error("Unknown topology variant: {0:?} (expected simple or full)")]
    UnknownTopology(String),
}

/// Deployment target tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    /// All environments, in promotion order
    pub const ALL: [Environment; 3] = [Self::Dev, Self::Staging, Self::Prod];

    /// Canonical tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Staging => "staging",
            Self::Prod => "prod",
        }
    }

    /// Capitalised name used in stack names
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Dev => "Dev",
            Self::Staging => "Staging",
            Self::Prod => "Prod",
        }
    }

    /// Long-form name, also the `CostCenter` tag value
    pub fn cost_center(&self) -> &'static str {
        match self {
            Self::Dev => "development",
            Self::Staging => "staging",
            Self::Prod => "production",
        }
    }

    /// Whether this is the production tier
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Prod)
    }

    /// Number of replicas the service starts with
    pub fn desired_count(&self) -> u32 {
        if self.is_production() {
            2
        } else {
            1
        }
    }

    /// Autoscaling bounds for the service
    pub fn capacity_bounds(&self) -> CapacityBounds {
        CapacityBounds {
            min: 1,
            max: if self.is_production() { 10 } else { 3 },
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = EnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Dev),
            "staging" | "stage" => Ok(Self::Staging),
            "prod" | "production" => Ok(Self::Prod),
            _ => Err(EnvironmentError::UnknownEnvironment(s.to_string())),
        }
    }
}

/// Min/max replica bounds for the scaling control loops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapacityBounds {
    pub min: u32,
    pub max: u32,
}

impl CapacityBounds {
    /// Whether `count` lies within the bounds
    pub fn contains(&self, count: u32) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

/// Which deployment topology to build
///
/// `Simple` is an HTTP-only stack reached through the load balancer's own DNS
/// name. `Full` adds TLS, the CDN distribution and DNS records for the custom
/// domain. The choice is an explicit input and never inferred from the
/// environment tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopologyVariant {
    #[default]
    Simple,
    Full,
}

impl TopologyVariant {
    /// Canonical tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Full => "full",
        }
    }

    /// Path probed by the target group and the container health check
    pub fn health_check_path(&self) -> &'static str {
        match self {
            Self::Simple => "/",
            Self::Full => "/api/health",
        }
    }

    /// Ports the load balancer listens on
    pub fn listener_ports(&self) -> &'static [Port] {
        match self {
            Self::Simple => &[Port::HTTP],
            Self::Full => &[Port::HTTP, Port::HTTPS],
        }
    }

    /// Whether the variant terminates TLS and fronts the site with a CDN
    pub fn has_edge(&self) -> bool {
        matches!(self, Self::Full)
    }
}

impl fmt::Display for TopologyVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TopologyVariant {
    type Err = EnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" | "minimal" => Ok(Self::Simple),
            "full" => Ok(Self::Full),
            _ => Err(EnvironmentError::UnknownTopology(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_environment() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!("Production".parse::<Environment>().unwrap(), Environment::Prod);
        assert_eq!("stage".parse::<Environment>().unwrap(), Environment::Staging);
        assert!(matches!(
            "qa".parse::<Environment>(),
            Err(EnvironmentError::UnknownEnvironment(_))
        ));
    }

    #[test]
    fn test_replica_policy() {
        assert_eq!(Environment::Prod.desired_count(), 2);
        assert_eq!(Environment::Staging.desired_count(), 1);
        assert_eq!(Environment::Dev.desired_count(), 1);

        assert_eq!(Environment::Prod.capacity_bounds(), CapacityBounds { min: 1, max: 10 });
        assert_eq!(Environment::Dev.capacity_bounds(), CapacityBounds { min: 1, max: 3 });
    }

    #[test]
    fn test_desired_count_within_bounds() {
        for env in Environment::ALL {
            assert!(env.capacity_bounds().contains(env.desired_count()));
        }
    }

    #[test]
    fn test_topology_variant() {
        assert_eq!(TopologyVariant::default(), TopologyVariant::Simple);
        assert_eq!(TopologyVariant::Simple.health_check_path(), "/");
        assert_eq!(TopologyVariant::Full.health_check_path(), "/api/health");
        assert_eq!(TopologyVariant::Simple.listener_ports(), &[Port::HTTP]);
        assert_eq!(
            TopologyVariant::Full.listener_ports(),
            &[Port::HTTP, Port::HTTPS]
        );
        assert_eq!("minimal".parse::<TopologyVariant>().unwrap(), TopologyVariant::Simple);
    }

    #[test]
    fn test_serde_tags() {
        assert_eq!(serde_json::to_string(&Environment::Staging).unwrap(), "\"staging\"");
        let variant: TopologyVariant = serde_json::from_str("\"full\"").unwrap();
        assert_eq!(variant, TopologyVariant::Full);
    }
}
