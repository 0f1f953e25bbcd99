// Copyright (c) 2025 - Cowboy AI, Inc.

//! Traffic routing
//!
//! Internet-facing load balancer, an IP target group with its health-check
//! policy, and the listener set. With a certificate the set is an HTTPS
//! listener plus a permanent HTTP→HTTPS redirect; without one it is a single
//! forwarding HTTP listener.

use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::compute::ComputeSpec;
use super::edge::IssuedCertificate;
use super::network::NetworkTopology;
use super::{attribute, logical_id, reference};
use crate::config::StackConfiguration;
use crate::domain::{ListenerAction, ListenerDescriptor, Port, Protocol, ResourceKind};
use crate::errors::SynthesisResult;
use crate::graph::{LogicalId, ResourceGraph, ResourceNode};

/// Target-group health-check policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGroupHealthCheck {
    pub path: String,
    pub matcher: String,
    pub interval: Duration,
    pub timeout: Duration,
    pub healthy_threshold: u32,
    pub unhealthy_threshold: u32,
}

impl TargetGroupHealthCheck {
    pub fn for_path(path: &str) -> Self {
        Self {
            path: path.to_string(),
            matcher: "200".to_string(),
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(5),
            healthy_threshold: 2,
            unhealthy_threshold: 3,
        }
    }
}

/// Routing unit in front of the service replicas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGroupSpec {
    pub id: LogicalId,
    pub port: Port,
    pub protocol: Protocol,
    pub health_check: TargetGroupHealthCheck,
    /// Grace period for in-flight requests while a target drains
    pub deregistration_delay: Duration,
}

/// A listener node and what it does
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listener {
    pub id: LogicalId,
    pub descriptor: ListenerDescriptor,
}

/// Listener set, shaped by whether a certificate is present
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerSet {
    /// Single HTTP listener forwarding to the target group
    Plain { http: Listener },
    /// HTTPS listener forwarding, HTTP listener redirecting to it
    Tls { https: Listener, redirect: Listener },
}

impl ListenerSet {
    /// The listener that forwards to the target group
    pub fn forwarding(&self) -> &Listener {
        match self {
            Self::Plain { http } => http,
            Self::Tls { https, .. } => https,
        }
    }

    pub fn listeners(&self) -> Vec<&Listener> {
        match self {
            Self::Plain { http } => vec![http],
            Self::Tls { https, redirect } => vec![https, redirect],
        }
    }

    pub fn descriptors(&self) -> Vec<ListenerDescriptor> {
        self.listeners()
            .into_iter()
            .map(|l| l.descriptor.clone())
            .collect()
    }

    /// Certificate terminating TLS, if any
    pub fn certificate(&self) -> Option<&LogicalId> {
        match self {
            Self::Plain { .. } => None,
            Self::Tls { https, .. } => https.descriptor.certificate.as_ref(),
        }
    }
}

/// Handles produced by [`build_routing`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficPlan {
    pub load_balancer: LogicalId,
    pub load_balancer_name: String,
    pub target_group: TargetGroupSpec,
    pub listeners: ListenerSet,
    /// Binding of the service's tasks to the target group
    pub registration: LogicalId,
}

fn action_property(action: &ListenerAction) -> Value {
    match action {
        ListenerAction::Forward { target_group } => json!([{
            "Type": "forward",
            "TargetGroupArn": reference(target_group),
        }]),
        ListenerAction::Redirect {
            protocol,
            port,
            permanent,
        } => json!([{
            "Type": "redirect",
            "RedirectConfig": {
                "Protocol": protocol.as_str(),
                "Port": port.to_string(),
                "StatusCode": if *permanent { "HTTP_301" } else { "HTTP_302" },
            },
        }]),
    }
}

fn add_listener(
    graph: &mut ResourceGraph,
    name: &str,
    load_balancer: &LogicalId,
    descriptor: ListenerDescriptor,
    extra_dependencies: &[&LogicalId],
) -> SynthesisResult<Listener> {
    let mut node = ResourceNode::new(logical_id(name)?, ResourceKind::Listener)
        .property("LoadBalancerArn", reference(load_balancer))
        .property("Port", descriptor.port.value())
        .property("Protocol", descriptor.protocol.as_str())
        .property("DefaultActions", action_property(&descriptor.action))
        .depends_on(load_balancer)
        .depends_on_all(extra_dependencies.iter().copied());

    if let ListenerAction::Forward { target_group } = &descriptor.action {
        node = node.depends_on(target_group);
    }
    if let Some(certificate) = &descriptor.certificate {
        node = node
            .property("Certificates", json!([{ "CertificateArn": reference(certificate) }]))
            .depends_on(certificate);
    }

    let id = graph.add(node)?;
    Ok(Listener { id, descriptor })
}

/// Build the load-balancing layer
///
/// `certificate` is the regional certificate from the edge layer; its
/// presence selects the TLS listener set.
pub fn build_routing(
    graph: &mut ResourceGraph,
    config: &StackConfiguration,
    network: &NetworkTopology,
    compute: &ComputeSpec,
    certificate: Option<&IssuedCertificate>,
) -> SynthesisResult<TrafficPlan> {
    let name = config.resource_name();
    let public_subnets = network.public_subnet_ids();

    let load_balancer = graph.add(
        ResourceNode::new(logical_id("PortfolioALB")?, ResourceKind::LoadBalancer)
            .property("Name", name.clone())
            .property("Scheme", "internet-facing")
            .property("Type", "application")
            .property(
                "Subnets",
                Value::Array(public_subnets.iter().map(|id| reference(id)).collect()),
            )
            .property(
                "SecurityGroups",
                json!([attribute(&network.edge_security_group.id, "GroupId")]),
            )
            .depends_on_all(public_subnets.iter().copied())
            .depends_on(&network.edge_security_group.id)
            .depends_on(&network.public_route_table),
    )?;

    let target_group = TargetGroupSpec {
        id: logical_id("PortfolioTargetGroup")?,
        port: compute.container.port,
        protocol: Protocol::Http,
        health_check: TargetGroupHealthCheck::for_path(config.topology().health_check_path()),
        deregistration_delay: Duration::from_secs(30),
    };
    let health = &target_group.health_check;
    graph.add(
        ResourceNode::new(target_group.id.clone(), ResourceKind::TargetGroup)
            .property("Port", target_group.port.value())
            .property("Protocol", target_group.protocol.as_str())
            .property("TargetType", "ip")
            .property("VpcId", reference(&network.vpc))
            .property("HealthCheckPath", health.path.clone())
            .property("HealthCheckIntervalSeconds", health.interval.as_secs())
            .property("HealthCheckTimeoutSeconds", health.timeout.as_secs())
            .property("HealthyThresholdCount", health.healthy_threshold)
            .property("UnhealthyThresholdCount", health.unhealthy_threshold)
            .property("Matcher", json!({ "HttpCode": health.matcher }))
            .property(
                "TargetGroupAttributes",
                json!([{
                    "Key": "deregistration_delay.timeout_seconds",
                    "Value": target_group.deregistration_delay.as_secs().to_string(),
                }]),
            )
            .depends_on(&network.vpc),
    )?;

    let forward = ListenerAction::Forward {
        target_group: target_group.id.clone(),
    };
    let listeners = match certificate {
        None => ListenerSet::Plain {
            http: add_listener(
                graph,
                "HTTPListener",
                &load_balancer,
                ListenerDescriptor {
                    port: Port::HTTP,
                    protocol: Protocol::Http,
                    action: forward,
                    certificate: None,
                },
                &[],
            )?,
        },
        Some(certificate) => {
            let https = add_listener(
                graph,
                "HTTPSListener",
                &load_balancer,
                ListenerDescriptor {
                    port: Port::HTTPS,
                    protocol: Protocol::Https,
                    action: forward,
                    certificate: Some(certificate.id.clone()),
                },
                &[&certificate.validation],
            )?;
            let redirect = add_listener(
                graph,
                "HTTPListener",
                &load_balancer,
                ListenerDescriptor {
                    port: Port::HTTP,
                    protocol: Protocol::Http,
                    action: ListenerAction::Redirect {
                        protocol: Protocol::Https,
                        port: Port::HTTPS,
                        permanent: true,
                    },
                    certificate: None,
                },
                &[],
            )?;
            ListenerSet::Tls { https, redirect }
        }
    };

    let registration = graph.add(
        ResourceNode::new(
            logical_id("ServiceTargetRegistration")?,
            ResourceKind::TargetRegistration,
        )
        .property("Cluster", reference(&compute.cluster))
        .property("ServiceName", compute.service.name.clone())
        .property("ContainerName", compute.container.name.clone())
        .property("ContainerPort", compute.container.port.value())
        .property("TargetGroupArn", reference(&target_group.id))
        .depends_on(&compute.service.id)
        .depends_on(&target_group.id)
        .depends_on(&listeners.forwarding().id),
    )?;

    debug!(
        load_balancer = %name,
        listeners = listeners.listeners().len(),
        tls = listeners.certificate().is_some(),
        health_path = %target_group.health_check.path,
        "Built traffic routing"
    );

    Ok(TrafficPlan {
        load_balancer,
        load_balancer_name: name,
        target_group,
        listeners,
        registration,
    })
}
