// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Kind Taxonomy
//!
//! Every node in a synthesized graph has exactly one [`ResourceKind`]. The kind
//! fixes the provider resource type written into the manifest and groups nodes
//! into categories for counting and invariant checks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of cloud resources a deployment topology is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    // Network
    /// Isolated virtual network
    Vpc,
    /// Public or private subnet in one availability zone
    Subnet,
    /// Internet gateway for public subnets
    InternetGateway,
    /// Static public address for the NAT gateway
    ElasticIp,
    /// Shared NAT egress point
    NatGateway,
    /// Route table for one subnet tier
    RouteTable,

    // Security
    /// Security group policy
    SecurityGroup,

    // Identity
    /// IAM role
    Role,
    /// Inline IAM policy
    Policy,

    // Observability
    /// Container log sink
    LogGroup,

    // Compute
    /// Container cluster
    Cluster,
    /// Task definition (CPU/memory profile and container spec)
    TaskDefinition,
    /// Long-running container service
    Service,

    // Routing
    /// Application load balancer
    LoadBalancer,
    /// Target group with health-check policy
    TargetGroup,
    /// Load-balancer listener
    Listener,
    /// Binding of the service's tasks to the target group
    TargetRegistration,

    // Certificates and DNS
    /// Managed DNS zone, imported by lookup
    HostedZone,
    /// TLS certificate
    Certificate,
    /// DNS record proving domain ownership for a certificate
    ValidationRecord,
    /// DNS alias record pointing at the distribution
    AliasRecord,

    // Edge
    /// CDN distribution
    Distribution,

    // Scaling
    /// Capacity bounds for the service
    ScalableTarget,
    /// Target-tracking scaling policy
    ScalingPolicy,
}

impl ResourceKind {
    /// Every kind, in taxonomy order
    pub const ALL: [ResourceKind; 24] = [
        Self::Vpc,
        Self::Subnet,
        Self::InternetGateway,
        Self::ElasticIp,
        Self::NatGateway,
        Self::RouteTable,
        Self::SecurityGroup,
        Self::Role,
        Self::Policy,
        Self::LogGroup,
        Self::Cluster,
        Self::TaskDefinition,
        Self::Service,
        Self::LoadBalancer,
        Self::TargetGroup,
        Self::Listener,
        Self::TargetRegistration,
        Self::HostedZone,
        Self::Certificate,
        Self::ValidationRecord,
        Self::AliasRecord,
        Self::Distribution,
        Self::ScalableTarget,
        Self::ScalingPolicy,
    ];

    /// Canonical snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vpc => "vpc",
            Self::Subnet => "subnet",
            Self::InternetGateway => "internet_gateway",
            Self::ElasticIp => "elastic_ip",
            Self::NatGateway => "nat_gateway",
            Self::RouteTable => "route_table",
            Self::SecurityGroup => "security_group",
            Self::Role => "role",
            Self::Policy => "policy",
            Self::LogGroup => "log_group",
            Self::Cluster => "cluster",
            Self::TaskDefinition => "task_definition",
            Self::Service => "service",
            Self::LoadBalancer => "load_balancer",
            Self::TargetGroup => "target_group",
            Self::Listener => "listener",
            Self::TargetRegistration => "target_registration",
            Self::HostedZone => "hosted_zone",
            Self::Certificate => "certificate",
            Self::ValidationRecord => "validation_record",
            Self::AliasRecord => "alias_record",
            Self::Distribution => "distribution",
            Self::ScalableTarget => "scalable_target",
            Self::ScalingPolicy => "scaling_policy",
        }
    }

    /// Provider resource type written into the manifest
    pub fn provider_type(&self) -> &'static str {
        match self {
            Self::Vpc => "AWS::EC2::VPC",
            Self::Subnet => "AWS::EC2::Subnet",
            Self::InternetGateway => "AWS::EC2::InternetGateway",
            Self::ElasticIp => "AWS::EC2::EIP",
            Self::NatGateway => "AWS::EC2::NatGateway",
            Self::RouteTable => "AWS::EC2::RouteTable",
            Self::SecurityGroup => "AWS::EC2::SecurityGroup",
            Self::Role => "AWS::IAM::Role",
            Self::Policy => "AWS::IAM::Policy",
            Self::LogGroup => "AWS::Logs::LogGroup",
            Self::Cluster => "AWS::ECS::Cluster",
            Self::TaskDefinition => "AWS::ECS::TaskDefinition",
            Self::Service => "AWS::ECS::Service",
            Self::LoadBalancer => "AWS::ElasticLoadBalancingV2::LoadBalancer",
            Self::TargetGroup => "AWS::ElasticLoadBalancingV2::TargetGroup",
            Self::Listener => "AWS::ElasticLoadBalancingV2::Listener",
            Self::TargetRegistration => "Custom::ServiceTargetRegistration",
            Self::HostedZone => "AWS::Route53::HostedZone",
            Self::Certificate => "AWS::CertificateManager::Certificate",
            Self::ValidationRecord => "AWS::Route53::RecordSet",
            Self::AliasRecord => "AWS::Route53::RecordSet",
            Self::Distribution => "AWS::CloudFront::Distribution",
            Self::ScalableTarget => "AWS::ApplicationAutoScaling::ScalableTarget",
            Self::ScalingPolicy => "AWS::ApplicationAutoScaling::ScalingPolicy",
        }
    }

    /// Human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Vpc => "VPC",
            Self::Subnet => "Subnet",
            Self::InternetGateway => "Internet Gateway",
            Self::ElasticIp => "Elastic IP",
            Self::NatGateway => "NAT Gateway",
            Self::RouteTable => "Route Table",
            Self::SecurityGroup => "Security Group",
            Self::Role => "IAM Role",
            Self::Policy => "IAM Policy",
            Self::LogGroup => "Log Group",
            Self::Cluster => "Container Cluster",
            Self::TaskDefinition => "Task Definition",
            Self::Service => "Container Service",
            Self::LoadBalancer => "Load Balancer",
            Self::TargetGroup => "Target Group",
            Self::Listener => "Listener",
            Self::TargetRegistration => "Target Registration",
            Self::HostedZone => "Hosted Zone",
            Self::Certificate => "TLS Certificate",
            Self::ValidationRecord => "Certificate Validation Record",
            Self::AliasRecord => "DNS Alias Record",
            Self::Distribution => "CDN Distribution",
            Self::ScalableTarget => "Scalable Target",
            Self::ScalingPolicy => "Scaling Policy",
        }
    }

    /// Category this kind belongs to
    pub fn category(&self) -> ResourceCategory {
        match self {
            Self::Vpc
            | Self::Subnet
            | Self::InternetGateway
            | Self::ElasticIp
            | Self::NatGateway
            | Self::RouteTable => ResourceCategory::Network,
            Self::SecurityGroup => ResourceCategory::Security,
            Self::Role | Self::Policy => ResourceCategory::Identity,
            Self::LogGroup => ResourceCategory::Observability,
            Self::Cluster | Self::TaskDefinition | Self::Service => ResourceCategory::Compute,
            Self::LoadBalancer | Self::TargetGroup | Self::Listener | Self::TargetRegistration => {
                ResourceCategory::Routing
            }
            Self::Certificate | Self::ValidationRecord => ResourceCategory::Certificate,
            Self::HostedZone | Self::AliasRecord => ResourceCategory::Dns,
            Self::Distribution => ResourceCategory::Edge,
            Self::ScalableTarget | Self::ScalingPolicy => ResourceCategory::Scaling,
        }
    }

    /// Whether the node refers to an existing resource found by lookup rather
    /// than one the deployment creates
    pub fn is_imported(&self) -> bool {
        matches!(self, Self::HostedZone)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Resource category for grouping related kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    Network,
    Security,
    Identity,
    Observability,
    Compute,
    Routing,
    Certificate,
    Dns,
    Edge,
    Scaling,
}

impl ResourceCategory {
    /// Whether resources in this category only exist in the full topology
    pub fn is_edge_only(&self) -> bool {
        matches!(self, Self::Certificate | Self::Dns | Self::Edge)
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Network => "Network",
            Self::Security => "Security",
            Self::Identity => "Identity",
            Self::Observability => "Observability",
            Self::Compute => "Compute",
            Self::Routing => "Routing",
            Self::Certificate => "Certificate",
            Self::Dns => "DNS",
            Self::Edge => "Edge",
            Self::Scaling => "Scaling",
        };
        write!(f, "{name}")
    }
}
