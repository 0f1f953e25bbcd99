// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Topology Invariants
//!
//! Business rules every synthesized topology must satisfy. All functions are
//! pure (no side effects) and return a detailed [`ValidationError`] on failure.
//!
//! # Invariant Categories
//!
//! 1. **Network isolation**: who may reach the service and the load balancer
//! 2. **Routing**: shape of the listener set with and without a certificate
//! 3. **Capacity**: replica counts, scaling bounds, rollout window
//! 4. **Edge**: certificate regions, and edge resources only in the full topology

use std::time::Duration;

use crate::domain::{
    CapacityBounds, Environment, IngressSource, ListenerAction, ListenerDescriptor, Port,
    Protocol, ResourceKind, TopologyVariant,
};
use crate::graph::LogicalId;

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Validation error with context
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Service-facing group admits something other than the edge group
    #[error("Service ingress from {origin} on port {port} is not allowed")]
    UnauthorizedIngress { origin: String, port: Port },

    /// A group that must admit traffic has no rules
    #[error("Security group has no ingress rule for port {0}")]
    MissingIngress(Port),

    /// Listener set does not match the certificate situation
    #[error("Invalid listener set: {0}")]
    ListenerSet(String),

    /// Replica count or bounds break the environment policy
    #[error("Capacity policy violated for {environment}: {reason}")]
    Capacity {
        environment: Environment,
        reason: String,
    },

    /// Scale-in must wait longer than scale-out
    #[error("Scale-in cooldown {scale_in:?} must exceed scale-out cooldown {scale_out:?}")]
    Cooldown {
        scale_in: Duration,
        scale_out: Duration,
    },

    /// Target utilization outside 1-100
    #[error("Target utilization {0}% must be between 1 and 100")]
    TargetUtilization(u32),

    /// Rollout window outside the supported bounds
    #[error("Deployment window {minimum_healthy_percent}%..{maximum_percent}% is not allowed")]
    DeploymentWindow {
        minimum_healthy_percent: u32,
        maximum_percent: u32,
    },

    /// Certificate placed in the wrong region
    #[error("Certificate must be issued in {required}, found {actual}")]
    CertificateRegion { required: String, actual: String },

    /// Health-check path does not match the topology variant
    #[error("Health check path {actual:?} does not match {expected:?}")]
    HealthCheckPath { expected: String, actual: String },

    /// Certificate, DNS or CDN resource in a topology without an edge layer
    #[error("{kind} is only allowed in the {required} topology, found in {variant}")]
    EdgeResource {
        kind: ResourceKind,
        variant: TopologyVariant,
        required: TopologyVariant,
    },
}

/// Validate the service-facing ingress policy
///
/// # Rules
/// - At least one rule exists
/// - Every rule's source is the edge-facing group
/// - Every rule opens the container port only
pub fn validate_service_ingress(
    rules: &[crate::domain::IngressRule],
    edge_group: &LogicalId,
    container_port: Port,
) -> ValidationResult {
    if rules.is_empty() {
        return Err(ValidationError::MissingIngress(container_port));
    }

    for rule in rules {
        let from_edge = matches!(&rule.source, IngressSource::SecurityGroup(id) if id == edge_group);
        if !from_edge || rule.port != container_port {
            return Err(ValidationError::UnauthorizedIngress {
                origin: rule.source.to_string(),
                port: rule.port,
            });
        }
    }
    Ok(())
}

/// Validate the edge-facing ingress policy
///
/// # Rules
/// - Each listener port is open to any IPv4 source
pub fn validate_edge_ingress(
    rules: &[crate::domain::IngressRule],
    listener_ports: &[Port],
) -> ValidationResult {
    for port in listener_ports {
        let open = rules
            .iter()
            .any(|rule| rule.port == *port && rule.source == IngressSource::AnyIpv4);
        if !open {
            return Err(ValidationError::MissingIngress(*port));
        }
    }
    Ok(())
}

/// Validate the listener set
///
/// # Rules
/// - With a certificate: exactly one HTTPS listener forwarding with that
///   certificate, and exactly one HTTP listener permanently redirecting to HTTPS
/// - Without a certificate: exactly one HTTP listener forwarding directly
pub fn validate_listener_set(
    listeners: &[ListenerDescriptor],
    certificate: Option<&LogicalId>,
) -> ValidationResult {
    match certificate {
        None => match listeners {
            [only] if only.protocol == Protocol::Http && only.is_forwarding() => Ok(()),
            _ => Err(ValidationError::ListenerSet(format!(
                "expected a single forwarding HTTP listener, found {}",
                listeners.len()
            ))),
        },
        Some(certificate) => {
            if listeners.len() != 2 {
                return Err(ValidationError::ListenerSet(format!(
                    "expected an HTTPS and a redirecting HTTP listener, found {}",
                    listeners.len()
                )));
            }

            let https_forwarding = listeners
                .iter()
                .filter(|l| {
                    l.protocol == Protocol::Https
                        && l.is_forwarding()
                        && l.certificate.as_ref() == Some(certificate)
                })
                .count();
            let http_redirects = listeners
                .iter()
                .filter(|l| {
                    l.protocol == Protocol::Http
                        && matches!(
                            l.action,
                            ListenerAction::Redirect {
                                protocol: Protocol::Https,
                                permanent: true,
                                ..
                            }
                        )
                })
                .count();

            if https_forwarding != 1 || http_redirects != 1 {
                return Err(ValidationError::ListenerSet(format!(
                    "found {https_forwarding} forwarding HTTPS and {http_redirects} redirecting HTTP listeners"
                )));
            }
            Ok(())
        }
    }
}

/// Validate replica policy for an environment
///
/// # Rules
/// - Production starts with at least 2 replicas, other tiers with exactly 1
/// - Minimum capacity is 1 everywhere
/// - Maximum capacity is 10 in production, 3 elsewhere
pub fn validate_capacity(
    environment: Environment,
    desired_count: u32,
    bounds: CapacityBounds,
) -> ValidationResult {
    let fail = |reason: String| {
        Err(ValidationError::Capacity {
            environment,
            reason,
        })
    };

    if environment.is_production() && desired_count < 2 {
        return fail(format!("desired count {desired_count} is below 2"));
    }
    if !environment.is_production() && desired_count != 1 {
        return fail(format!("desired count {desired_count} must be 1"));
    }
    if bounds.min != 1 {
        return fail(format!("minimum capacity {} must be 1", bounds.min));
    }
    let expected_max = if environment.is_production() { 10 } else { 3 };
    if bounds.max != expected_max {
        return fail(format!(
            "maximum capacity {} must be {expected_max}",
            bounds.max
        ));
    }
    if !bounds.contains(desired_count) {
        return fail(format!(
            "desired count {desired_count} outside {}..={}",
            bounds.min, bounds.max
        ));
    }
    Ok(())
}

/// Validate scaling cooldowns
///
/// # Rules
/// - Scale-in cooldown is strictly longer than scale-out cooldown
pub fn validate_scaling_cooldowns(scale_in: Duration, scale_out: Duration) -> ValidationResult {
    if scale_in <= scale_out {
        return Err(ValidationError::Cooldown {
            scale_in,
            scale_out,
        });
    }
    Ok(())
}

/// Validate a target utilization percentage (1-100)
pub fn validate_target_utilization(percent: u32) -> ValidationResult {
    if !(1..=100).contains(&percent) {
        return Err(ValidationError::TargetUtilization(percent));
    }
    Ok(())
}

/// Validate the rollout window
///
/// # Rules
/// - Old and new replicas may coexist between 50% and 200% of desired count
pub fn validate_deployment_window(
    minimum_healthy_percent: u32,
    maximum_percent: u32,
) -> ValidationResult {
    if minimum_healthy_percent != 50 || maximum_percent != 200 {
        return Err(ValidationError::DeploymentWindow {
            minimum_healthy_percent,
            maximum_percent,
        });
    }
    Ok(())
}

/// Validate that a certificate sits in the region the platform requires
pub fn validate_certificate_region(actual: &str, required: &str) -> ValidationResult {
    if actual != required {
        return Err(ValidationError::CertificateRegion {
            required: required.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

/// Validate the health-check path for a topology variant
pub fn validate_health_check_path(variant: TopologyVariant, path: &str) -> ValidationResult {
    let expected = variant.health_check_path();
    if path != expected {
        return Err(ValidationError::HealthCheckPath {
            expected: expected.to_string(),
            actual: path.to_string(),
        });
    }
    Ok(())
}

/// Validate that edge-only resources appear only where the variant has an edge
pub fn validate_edge_resource(variant: TopologyVariant, kind: ResourceKind) -> ValidationResult {
    if kind.category().is_edge_only() && !variant.has_edge() {
        return Err(ValidationError::EdgeResource {
            kind,
            variant,
            required: TopologyVariant::Full,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IngressRule;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).unwrap()
    }

    #[test]
    fn test_validate_edge_resource() {
        assert!(validate_edge_resource(TopologyVariant::Full, ResourceKind::Distribution).is_ok());
        assert!(validate_edge_resource(TopologyVariant::Simple, ResourceKind::LoadBalancer).is_ok());
        assert_eq!(
            validate_edge_resource(TopologyVariant::Simple, ResourceKind::Certificate),
            Err(ValidationError::EdgeResource {
                kind: ResourceKind::Certificate,
                variant: TopologyVariant::Simple,
                required: TopologyVariant::Full,
            })
        );
        assert!(validate_edge_resource(TopologyVariant::Simple, ResourceKind::HostedZone).is_err());
    }

    #[test]
    fn test_validate_service_ingress() {
        let edge = id("ALBSecurityGroup");
        let ok = vec![IngressRule::from_group(&edge, Port::CONTAINER, "from alb")];
        assert!(validate_service_ingress(&ok, &edge, Port::CONTAINER).is_ok());

        let open = vec![IngressRule::from_anywhere(Port::CONTAINER, "anyone")];
        assert!(matches!(
            validate_service_ingress(&open, &edge, Port::CONTAINER),
            Err(ValidationError::UnauthorizedIngress { .. })
        ));

        let wrong_port = vec![IngressRule::from_group(&edge, Port::HTTP, "from alb")];
        assert!(validate_service_ingress(&wrong_port, &edge, Port::CONTAINER).is_err());

        let other_group = vec![IngressRule::from_group(&id("Other"), Port::CONTAINER, "x")];
        assert!(validate_service_ingress(&other_group, &edge, Port::CONTAINER).is_err());

        assert_eq!(
            validate_service_ingress(&[], &edge, Port::CONTAINER),
            Err(ValidationError::MissingIngress(Port::CONTAINER))
        );
    }

    #[test]
    fn test_validate_edge_ingress() {
        let rules = vec![IngressRule::from_anywhere(Port::HTTP, "http")];
        assert!(validate_edge_ingress(&rules, &[Port::HTTP]).is_ok());
        assert_eq!(
            validate_edge_ingress(&rules, &[Port::HTTP, Port::HTTPS]),
            Err(ValidationError::MissingIngress(Port::HTTPS))
        );
    }

    #[test]
    fn test_validate_listener_set() {
        let tg = id("PortfolioTargetGroup");
        let cert = id("ALBCertificate");
        let forward_http = ListenerDescriptor {
            port: Port::HTTP,
            protocol: Protocol::Http,
            action: ListenerAction::Forward {
                target_group: tg.clone(),
            },
            certificate: None,
        };
        let forward_https = ListenerDescriptor {
            port: Port::HTTPS,
            protocol: Protocol::Https,
            action: ListenerAction::Forward { target_group: tg },
            certificate: Some(cert.clone()),
        };
        let redirect = ListenerDescriptor {
            port: Port::HTTP,
            protocol: Protocol::Http,
            action: ListenerAction::Redirect {
                protocol: Protocol::Https,
                port: Port::HTTPS,
                permanent: true,
            },
            certificate: None,
        };

        assert!(validate_listener_set(&[forward_http.clone()], None).is_ok());
        assert!(validate_listener_set(&[forward_https.clone(), redirect.clone()], Some(&cert)).is_ok());

        // Plain HTTP forwarding alongside a certificate is not allowed
        assert!(validate_listener_set(&[forward_https.clone(), forward_http.clone()], Some(&cert)).is_err());
        assert!(validate_listener_set(&[redirect.clone()], None).is_err());
        assert!(validate_listener_set(&[forward_https, redirect], None).is_err());
        assert!(validate_listener_set(&[forward_http], Some(&cert)).is_err());
    }

    #[test]
    fn test_validate_capacity() {
        assert!(validate_capacity(Environment::Prod, 2, CapacityBounds { min: 1, max: 10 }).is_ok());
        assert!(validate_capacity(Environment::Dev, 1, CapacityBounds { min: 1, max: 3 }).is_ok());

        assert!(validate_capacity(Environment::Prod, 1, CapacityBounds { min: 1, max: 10 }).is_err());
        assert!(validate_capacity(Environment::Staging, 2, CapacityBounds { min: 1, max: 3 }).is_err());
        assert!(validate_capacity(Environment::Dev, 1, CapacityBounds { min: 1, max: 10 }).is_err());
        assert!(validate_capacity(Environment::Prod, 2, CapacityBounds { min: 2, max: 10 }).is_err());
    }

    #[test]
    fn test_validate_scaling_cooldowns() {
        assert!(validate_scaling_cooldowns(Duration::from_secs(300), Duration::from_secs(120)).is_ok());
        assert!(validate_scaling_cooldowns(Duration::from_secs(120), Duration::from_secs(120)).is_err());
        assert!(validate_scaling_cooldowns(Duration::from_secs(60), Duration::from_secs(120)).is_err());
    }

    #[test]
    fn test_validate_target_utilization() {
        assert!(validate_target_utilization(70).is_ok());
        assert!(validate_target_utilization(0).is_err());
        assert!(validate_target_utilization(101).is_err());
    }

    #[test]
    fn test_validate_deployment_window() {
        assert!(validate_deployment_window(50, 200).is_ok());
        assert!(validate_deployment_window(100, 200).is_err());
    }

    #[test]
    fn test_validate_certificate_region() {
        assert!(validate_certificate_region("us-east-1", "us-east-1").is_ok());
        assert!(matches!(
            validate_certificate_region("eu-west-1", "us-east-1"),
            Err(ValidationError::CertificateRegion { .. })
        ));
    }

    #[test]
    fn test_validate_health_check_path() {
        assert!(validate_health_check_path(TopologyVariant::Simple, "/").is_ok());
        assert!(validate_health_check_path(TopologyVariant::Full, "/api/health").is_ok());
        assert!(validate_health_check_path(TopologyVariant::Full, "/").is_err());
    }
}
