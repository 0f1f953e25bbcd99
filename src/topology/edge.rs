// Copyright (c) 2025 - Cowboy AI, Inc.

//! Edge distribution (full topology only)
//!
//! Built in two passes around the routing layer:
//!
//! 1. [`issue_certificates`] looks up the hosted zone and requests two
//!    DNS-validated certificates: one in the stack region for the load
//!    balancer's TLS listener and one in `us-east-1`, the only region the CDN
//!    accepts certificates from.
//! 2. [`build_distribution`] fronts the load balancer with the CDN and points
//!    the apex and `www` names at the distribution.
//!
//! ```text
//! HostedZone ──▶ ALBCertificate ──▶ ALBCertificateValidation ──▶ HTTPSListener
//!      └──────▶ CloudFrontCertificate ──▶ CloudFrontCertificateValidation
//!                                              │
//!                         PortfolioDistribution ◀┘ ──▶ AliasRecord, WWWAliasRecord
//! ```

use serde_json::{json, Value};
use tracing::{debug, info};

use super::routing::TrafficPlan;
use super::{attribute, logical_id, reference};
use crate::adapters::{Collaborators, HostedZone};
use crate::config::StackConfiguration;
use crate::domain::ResourceKind;
use crate::errors::{SynthesisError, SynthesisResult};
use crate::graph::{LogicalId, ResourceGraph, ResourceNode};

/// Region the CDN requires its certificate to live in
pub const EDGE_CERTIFICATE_REGION: &str = "us-east-1";

/// Managed "CachingOptimized" cache policy
pub const CACHING_OPTIMIZED_POLICY_ID: &str = "658327ea-f89d-4fab-a63d-7e88639e58f6";

/// Hosted zone id every CDN alias target lives in
pub const DISTRIBUTION_ALIAS_ZONE_ID: &str = "Z2FDTNDATAQYW2";

/// Minimum TLS version viewers may negotiate
pub const MINIMUM_PROTOCOL_VERSION: &str = "TLSv1.2_2021";

/// Cheapest edge location tier
pub const PRICE_CLASS: &str = "PriceClass_100";

/// A DNS-validated certificate and its validation record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCertificate {
    pub id: LogicalId,
    pub validation: LogicalId,
    pub region: String,
    pub domain_names: Vec<String>,
}

/// Output of [`issue_certificates`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeCertificates {
    pub zone: HostedZone,
    pub zone_node: LogicalId,
    /// Certificate for the load balancer, in the stack region
    pub regional: IssuedCertificate,
    /// Certificate for the distribution, pinned to [`EDGE_CERTIFICATE_REGION`]
    pub distribution: IssuedCertificate,
}

/// CDN distribution in front of the load balancer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionSpec {
    pub id: LogicalId,
    pub aliases: Vec<String>,
    pub origin: LogicalId,
    pub certificate: LogicalId,
}

/// DNS alias record pointing at the distribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRecord {
    pub id: LogicalId,
    pub name: String,
    pub target: LogicalId,
}

/// Handles produced by the edge layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgePlan {
    pub certificates: EdgeCertificates,
    pub distribution: DistributionSpec,
    pub alias_records: [AliasRecord; 2],
}

impl EdgePlan {
    /// Both certificates, regional first
    pub fn certificates(&self) -> [&IssuedCertificate; 2] {
        [
            &self.certificates.regional,
            &self.certificates.distribution,
        ]
    }
}

fn add_certificate(
    graph: &mut ResourceGraph,
    name: &str,
    region: &str,
    domain_names: Vec<String>,
    zone: &HostedZone,
    zone_node: &LogicalId,
) -> SynthesisResult<IssuedCertificate> {
    let id = graph.add(
        ResourceNode::new(logical_id(name)?, ResourceKind::Certificate)
            .property("DomainName", domain_names[0].clone())
            .property("SubjectAlternativeNames", json!(&domain_names[1..]))
            .property("ValidationMethod", "DNS")
            .property("Region", region)
            .property(
                "DomainValidationOptions",
                Value::Array(
                    domain_names
                        .iter()
                        .map(|d| json!({ "DomainName": d, "HostedZoneId": zone.zone_id }))
                        .collect(),
                ),
            )
            .depends_on(zone_node),
    )?;

    // Records are published asynchronously; the edge only orders readiness
    let validation = graph.add(
        ResourceNode::new(id.with_suffix("Validation")?, ResourceKind::ValidationRecord)
            .property("HostedZoneId", zone.zone_id.clone())
            .property("Type", "CNAME")
            .property("Certificate", reference(&id))
            .property("DomainNames", json!(domain_names))
            .depends_on(zone_node)
            .depends_on(&id),
    )?;

    Ok(IssuedCertificate {
        id,
        validation,
        region: region.to_string(),
        domain_names,
    })
}

/// Look up the hosted zone and issue both certificates
///
/// # Errors
/// [`SynthesisError::DependencyResolution`] naming `HostedZone` and the
/// domain when no zone owns the domain. There is no fallback zone.
pub fn issue_certificates(
    graph: &mut ResourceGraph,
    config: &StackConfiguration,
    collaborators: &Collaborators<'_>,
) -> SynthesisResult<EdgeCertificates> {
    let domain = config.domain_name();
    let zone = collaborators
        .zones
        .find_zone(domain)
        .ok_or_else(|| SynthesisError::dependency("HostedZone", domain.as_str()))?;

    info!(
        domain = %domain,
        zone = %zone.zone_name,
        zone_id = %zone.zone_id,
        "Resolved hosted zone"
    );

    // Imported: orders the records in the graph, never created
    let zone_node = graph.add(
        ResourceNode::new(logical_id("PortfolioHostedZone")?, ResourceKind::HostedZone)
            .property("HostedZoneId", zone.zone_id.clone())
            .property("Name", zone.zone_name.as_str()),
    )?;

    let names = vec![domain.as_str().to_string(), domain.www()];
    let regional = add_certificate(
        graph,
        "ALBCertificate",
        config.region(),
        names.clone(),
        &zone,
        &zone_node,
    )?;
    let distribution = add_certificate(
        graph,
        "CloudFrontCertificate",
        EDGE_CERTIFICATE_REGION,
        names,
        &zone,
        &zone_node,
    )?;

    debug!(
        regional = %regional.id,
        regional_region = %regional.region,
        distribution = %distribution.id,
        "Issued edge certificates"
    );

    Ok(EdgeCertificates {
        zone,
        zone_node,
        regional,
        distribution,
    })
}

/// Front the load balancer with the CDN and add the alias records
pub fn build_distribution(
    graph: &mut ResourceGraph,
    config: &StackConfiguration,
    certificates: EdgeCertificates,
    traffic: &TrafficPlan,
) -> SynthesisResult<EdgePlan> {
    let domain = config.domain_name();
    let aliases = vec![domain.as_str().to_string(), domain.www()];
    let origin_id = "PortfolioALBOrigin";
    let cert = &certificates.distribution;

    let distribution_id = graph.add(
        ResourceNode::new(logical_id("PortfolioDistribution")?, ResourceKind::Distribution)
            .property(
                "DistributionConfig",
                json!({
                    "Enabled": true,
                    "Aliases": aliases,
                    "Origins": [{
                        "Id": origin_id,
                        "DomainName": attribute(&traffic.load_balancer, "DNSName"),
                        "CustomOriginConfig": { "OriginProtocolPolicy": "https-only" },
                    }],
                    "DefaultCacheBehavior": {
                        "TargetOriginId": origin_id,
                        "ViewerProtocolPolicy": "redirect-to-https",
                        "AllowedMethods": ["GET", "HEAD", "OPTIONS", "PUT", "PATCH", "POST", "DELETE"],
                        "CachePolicyId": CACHING_OPTIMIZED_POLICY_ID,
                        "Compress": true,
                    },
                    "ViewerCertificate": {
                        "AcmCertificateArn": reference(&cert.id),
                        "SslSupportMethod": "sni-only",
                        "MinimumProtocolVersion": MINIMUM_PROTOCOL_VERSION,
                    },
                    "HttpVersion": "http2",
                    "IPV6Enabled": true,
                    "PriceClass": PRICE_CLASS,
                }),
            )
            .depends_on(&cert.id)
            .depends_on(&cert.validation)
            .depends_on(&traffic.load_balancer)
            .depends_on(&traffic.listeners.forwarding().id),
    )?;

    let mut records = Vec::with_capacity(aliases.len());
    for (name, record_name) in ["AliasRecord", "WWWAliasRecord"].iter().zip(&aliases) {
        let id = graph.add(
            ResourceNode::new(logical_id(name)?, ResourceKind::AliasRecord)
                .property("HostedZoneId", certificates.zone.zone_id.clone())
                .property("Name", record_name.clone())
                .property("Type", "A")
                .property(
                    "AliasTarget",
                    json!({
                        "DNSName": attribute(&distribution_id, "DomainName"),
                        "HostedZoneId": DISTRIBUTION_ALIAS_ZONE_ID,
                    }),
                )
                .depends_on(&certificates.zone_node)
                .depends_on(&distribution_id),
        )?;
        records.push(AliasRecord {
            id,
            name: record_name.clone(),
            target: distribution_id.clone(),
        });
    }

    let alias_records: [AliasRecord; 2] = records.try_into().map_err(|_| {
        SynthesisError::configuration("AliasRecord", "expected apex and www records")
    })?;

    debug!(
        distribution = %distribution_id,
        aliases = ?aliases,
        "Built edge distribution"
    );

    let distribution = DistributionSpec {
        id: distribution_id,
        aliases,
        origin: traffic.load_balancer.clone(),
        certificate: cert.id.clone(),
    };

    Ok(EdgePlan {
        distribution,
        alias_records,
        certificates,
    })
}
