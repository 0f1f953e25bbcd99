// Copyright (c) 2025 - Cowboy AI, Inc.

//! Managed DNS zone lookup
//!
//! The full topology publishes certificate validation records and alias
//! records into the zone that owns the site's domain. Finding that zone is an
//! external lookup; when it fails there is no fallback.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::DomainName;

/// A managed DNS zone
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostedZone {
    pub zone_id: String,
    pub zone_name: DomainName,
}

/// Find the zone responsible for a domain
pub trait HostedZoneLookup {
    fn find_zone(&self, domain: &DomainName) -> Option<HostedZone>;

    /// Adapter name for diagnostics
    fn name(&self) -> &str {
        "hosted-zone-lookup"
    }
}

/// In-memory set of known zones
///
/// A domain matches every zone it equals or sits under; the most specific
/// (longest) zone wins, so `app.example.com` prefers a delegated
/// `app.example.com` zone over `example.com`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticHostedZones {
    zones: BTreeMap<DomainName, String>,
}

impl StaticHostedZones {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zone by name and id
    pub fn with_zone(mut self, zone_name: DomainName, zone_id: impl Into<String>) -> Self {
        self.zones.insert(zone_name, zone_id.into());
        self
    }
}

impl HostedZoneLookup for StaticHostedZones {
    fn find_zone(&self, domain: &DomainName) -> Option<HostedZone> {
        self.zones
            .iter()
            .filter(|(zone, _)| domain.is_within(zone))
            .max_by_key(|(zone, _)| zone.as_str().len())
            .map(|(zone, id)| HostedZone {
                zone_id: id.clone(),
                zone_name: zone.clone(),
            })
    }

    fn name(&self) -> &str {
        "static-hosted-zones"
    }
}
