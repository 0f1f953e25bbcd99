// Copyright (c) 2025 - Cowboy AI, Inc.

//! Network topology
//!
//! A fixed two-AZ network: one public and one private `/24` per zone, an
//! internet gateway for the public tier and a single NAT gateway shared by
//! both private subnets. A zone outage degrades egress but never blocks
//! ingress.
//!
//! ```text
//!                 10.0.0.0/16
//!   ┌──────────────────┴──────────────────┐
//!   PublicSubnet1 10.0.0.0/24   PublicSubnet2 10.0.1.0/24   ◀── IGW
//!        │ NAT
//!   PrivateSubnet1 10.0.2.0/24  PrivateSubnet2 10.0.3.0/24
//! ```
//!
//! Two security groups separate public traffic from container traffic. The
//! edge group admits the listener ports from anywhere; the service group
//! admits only the edge group, only on the container port.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{attribute, logical_id, reference};
use crate::config::StackConfiguration;
use crate::domain::{CidrBlock, IngressRule, IngressSource, Port, ResourceKind};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::graph::{LogicalId, ResourceGraph, ResourceNode};

/// Address space of the network
pub const VPC_CIDR: &str = "10.0.0.0/16";

/// Prefix length of every subnet
pub const SUBNET_PREFIX: u8 = 24;

/// Zone suffixes appended to the region
pub const AVAILABILITY_ZONE_SUFFIXES: [char; 2] = ['a', 'b'];

/// Subnet tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SubnetTier {
    Public,
    Private,
}

impl SubnetTier {
    fn id_prefix(&self) -> &'static str {
        match self {
            Self::Public => "PublicSubnet",
            Self::Private => "PrivateSubnet",
        }
    }

    /// Index of the first `/24` this tier occupies inside the VPC block
    fn first_block(&self) -> u32 {
        match self {
            Self::Public => 0,
            Self::Private => AVAILABILITY_ZONE_SUFFIXES.len() as u32,
        }
    }
}

/// One subnet in one availability zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subnet {
    pub id: LogicalId,
    pub tier: SubnetTier,
    pub availability_zone: String,
    pub cidr: CidrBlock,
}

/// Which side of the two-tier ingress policy a group is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SecurityGroupRole {
    /// Faces the internet, attached to the load balancer
    Edge,
    /// Faces the edge group, attached to the service
    Service,
}

/// A security group and its ingress rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityGroupPolicy {
    pub id: LogicalId,
    pub role: SecurityGroupRole,
    pub ingress: Vec<IngressRule>,
    pub allow_all_outbound: bool,
}

impl SecurityGroupPolicy {
    /// Ingress rules in manifest form
    fn ingress_property(&self) -> Value {
        let rules: Vec<Value> = self
            .ingress
            .iter()
            .map(|rule| {
                let mut entry = json!({
                    "IpProtocol": "tcp",
                    "FromPort": rule.port.value(),
                    "ToPort": rule.port.value(),
                    "Description": rule.description,
                });
                match &rule.source {
                    IngressSource::AnyIpv4 => entry["CidrIp"] = json!("0.0.0.0/0"),
                    IngressSource::SecurityGroup(group) => {
                        entry["SourceSecurityGroupId"] = attribute(group, "GroupId")
                    }
                }
                entry
            })
            .collect();
        Value::Array(rules)
    }

    fn egress_property(&self) -> Value {
        if self.allow_all_outbound {
            json!([{ "IpProtocol": "-1", "CidrIp": "0.0.0.0/0" }])
        } else {
            json!([])
        }
    }
}

/// Handles produced by [`build_network`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkTopology {
    pub vpc: LogicalId,
    pub cidr: CidrBlock,
    pub internet_gateway: LogicalId,
    pub public_subnets: Vec<Subnet>,
    pub private_subnets: Vec<Subnet>,
    pub public_route_table: LogicalId,
    pub private_route_table: LogicalId,
    pub nat_gateway: LogicalId,
    pub edge_security_group: SecurityGroupPolicy,
    pub service_security_group: SecurityGroupPolicy,
}

impl NetworkTopology {
    pub fn public_subnet_ids(&self) -> Vec<&LogicalId> {
        self.public_subnets.iter().map(|s| &s.id).collect()
    }

    pub fn private_subnet_ids(&self) -> Vec<&LogicalId> {
        self.private_subnets.iter().map(|s| &s.id).collect()
    }

    /// Number of availability zones the network spans
    pub fn availability_zones(&self) -> usize {
        self.public_subnets.len()
    }
}

/// Build the network and append its nodes to `graph`
pub fn build_network(
    graph: &mut ResourceGraph,
    config: &StackConfiguration,
) -> SynthesisResult<NetworkTopology> {
    let cidr = CidrBlock::new(VPC_CIDR)
        .map_err(|e| SynthesisError::configuration("PortfolioVPC", e.to_string()))?;
    let name = config.resource_name();

    let vpc = graph.add(
        ResourceNode::new(logical_id("PortfolioVPC")?, ResourceKind::Vpc)
            .property("CidrBlock", cidr.to_string())
            .property("EnableDnsHostnames", true)
            .property("EnableDnsSupport", true)
            .property("Tags", json!([{ "Key": "Name", "Value": format!("{name}-vpc") }])),
    )?;

    let internet_gateway = graph.add(
        ResourceNode::new(
            logical_id("PortfolioInternetGateway")?,
            ResourceKind::InternetGateway,
        )
        .property("VpcId", reference(&vpc))
        .depends_on(&vpc),
    )?;

    let public_subnets = add_subnets(graph, config, &vpc, &cidr, SubnetTier::Public)?;

    let public_route_table = graph.add(
        ResourceNode::new(logical_id("PublicRouteTable")?, ResourceKind::RouteTable)
            .property("VpcId", reference(&vpc))
            .property(
                "Routes",
                json!([{
                    "DestinationCidrBlock": "0.0.0.0/0",
                    "GatewayId": reference(&internet_gateway),
                }]),
            )
            .property("SubnetIds", subnet_refs(&public_subnets))
            .depends_on(&vpc)
            .depends_on(&internet_gateway)
            .depends_on_all(public_subnets.iter().map(|s| &s.id)),
    )?;

    let elastic_ip = graph.add(
        ResourceNode::new(logical_id("PortfolioNatEIP")?, ResourceKind::ElasticIp)
            .property("Domain", "vpc")
            .depends_on(&internet_gateway),
    )?;

    // One shared NAT gateway, placed in the first public subnet
    let nat_subnet = public_subnets
        .first()
        .map(|s| s.id.clone())
        .ok_or_else(|| SynthesisError::configuration("PortfolioNatGateway", "no public subnet"))?;
    let nat_gateway = graph.add(
        ResourceNode::new(logical_id("PortfolioNatGateway")?, ResourceKind::NatGateway)
            .property("SubnetId", reference(&nat_subnet))
            .property("AllocationId", attribute(&elastic_ip, "AllocationId"))
            .depends_on(&nat_subnet)
            .depends_on(&elastic_ip),
    )?;

    let private_subnets = add_subnets(graph, config, &vpc, &cidr, SubnetTier::Private)?;

    let private_route_table = graph.add(
        ResourceNode::new(logical_id("PrivateRouteTable")?, ResourceKind::RouteTable)
            .property("VpcId", reference(&vpc))
            .property(
                "Routes",
                json!([{
                    "DestinationCidrBlock": "0.0.0.0/0",
                    "NatGatewayId": reference(&nat_gateway),
                }]),
            )
            .property("SubnetIds", subnet_refs(&private_subnets))
            .depends_on(&vpc)
            .depends_on(&nat_gateway)
            .depends_on_all(private_subnets.iter().map(|s| &s.id)),
    )?;

    let edge_id = logical_id("ALBSecurityGroup")?;
    let edge_security_group = SecurityGroupPolicy {
        ingress: config
            .topology()
            .listener_ports()
            .iter()
            .map(|port| IngressRule::from_anywhere(*port, listener_rule_description(*port)))
            .collect(),
        id: edge_id,
        role: SecurityGroupRole::Edge,
        allow_all_outbound: true,
    };
    add_security_group(
        graph,
        &vpc,
        &edge_security_group,
        "Security group for Application Load Balancer",
    )?;

    let service_security_group = SecurityGroupPolicy {
        id: logical_id("ECSSecurityGroup")?,
        role: SecurityGroupRole::Service,
        ingress: vec![IngressRule::from_group(
            &edge_security_group.id,
            Port::CONTAINER,
            "Allow traffic from ALB",
        )],
        allow_all_outbound: true,
    };
    add_security_group(
        graph,
        &vpc,
        &service_security_group,
        "Security group for ECS service",
    )?;

    debug!(
        vpc = %vpc,
        zones = public_subnets.len(),
        edge_ports = edge_security_group.ingress.len(),
        "Built network topology"
    );

    Ok(NetworkTopology {
        vpc,
        cidr,
        internet_gateway,
        public_subnets,
        private_subnets,
        public_route_table,
        private_route_table,
        nat_gateway,
        edge_security_group,
        service_security_group,
    })
}

fn listener_rule_description(port: Port) -> String {
    match port {
        Port::HTTP => "Allow HTTP traffic".to_string(),
        Port::HTTPS => "Allow HTTPS traffic".to_string(),
        other => format!("Allow traffic on port {other}"),
    }
}

fn add_subnets(
    graph: &mut ResourceGraph,
    config: &StackConfiguration,
    vpc: &LogicalId,
    cidr: &CidrBlock,
    tier: SubnetTier,
) -> SynthesisResult<Vec<Subnet>> {
    let mut subnets = Vec::with_capacity(AVAILABILITY_ZONE_SUFFIXES.len());

    for (index, suffix) in AVAILABILITY_ZONE_SUFFIXES.iter().enumerate() {
        let block = cidr
            .subnet(SUBNET_PREFIX, tier.first_block() + index as u32)
            .map_err(|e| SynthesisError::configuration(tier.id_prefix(), e.to_string()))?;
        let subnet = Subnet {
            id: logical_id(tier.id_prefix())?.with_suffix(index + 1)?,
            tier,
            availability_zone: format!("{}{suffix}", config.region()),
            cidr: block,
        };

        graph.add(
            ResourceNode::new(subnet.id.clone(), ResourceKind::Subnet)
                .property("VpcId", reference(vpc))
                .property("CidrBlock", subnet.cidr.to_string())
                .property("AvailabilityZone", subnet.availability_zone.clone())
                .property("MapPublicIpOnLaunch", tier == SubnetTier::Public)
                .depends_on(vpc),
        )?;
        subnets.push(subnet);
    }

    Ok(subnets)
}

fn subnet_refs(subnets: &[Subnet]) -> Value {
    Value::Array(subnets.iter().map(|s| reference(&s.id)).collect())
}

fn add_security_group(
    graph: &mut ResourceGraph,
    vpc: &LogicalId,
    policy: &SecurityGroupPolicy,
    description: &str,
) -> SynthesisResult<LogicalId> {
    let sources = policy.ingress.iter().filter_map(|rule| match &rule.source {
        IngressSource::SecurityGroup(group) => Some(group),
        IngressSource::AnyIpv4 => None,
    });

    let node = ResourceNode::new(policy.id.clone(), ResourceKind::SecurityGroup)
        .property("GroupDescription", description)
        .property("VpcId", reference(vpc))
        .property("SecurityGroupIngress", policy.ingress_property())
        .property("SecurityGroupEgress", policy.egress_property())
        .depends_on(vpc)
        .depends_on_all(sources);

    Ok(graph.add(node)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AmbientEnvironment, DeploymentSettings, EnvironmentResolver};
    use crate::domain::{invariants, Environment, TopologyVariant};

    fn config(variant: TopologyVariant) -> StackConfiguration {
        EnvironmentResolver::resolve(
            Environment::Dev,
            &AmbientEnvironment::default().with_region("eu-west-1"),
            &DeploymentSettings::default()
                .with_domain_name("example.com")
                .with_docker_image("example/site:latest")
                .with_topology(variant),
        )
        .unwrap()
    }

    #[test]
    fn test_subnet_layout() {
        let mut graph = ResourceGraph::new();
        let network = build_network(&mut graph, &config(TopologyVariant::Simple)).unwrap();

        let public: Vec<String> = network.public_subnets.iter().map(|s| s.cidr.to_string()).collect();
        let private: Vec<String> = network.private_subnets.iter().map(|s| s.cidr.to_string()).collect();
        assert_eq!(public, vec!["10.0.0.0/24", "10.0.1.0/24"]);
        assert_eq!(private, vec!["10.0.2.0/24", "10.0.3.0/24"]);
        assert_eq!(network.public_subnets[1].availability_zone, "eu-west-1b");
        assert_eq!(network.availability_zones(), 2);

        assert_eq!(graph.count_of_kind(ResourceKind::Subnet), 4);
        assert_eq!(graph.count_of_kind(ResourceKind::NatGateway), 1);
        assert_eq!(graph.count_of_kind(ResourceKind::SecurityGroup), 2);
    }

    #[test]
    fn test_nat_in_first_public_subnet() {
        let mut graph = ResourceGraph::new();
        let network = build_network(&mut graph, &config(TopologyVariant::Simple)).unwrap();

        let nat = graph.node(&network.nat_gateway).unwrap();
        assert!(nat.depends_on_node(&network.public_subnets[0].id));
        let route_table = graph.node(&network.private_route_table).unwrap();
        assert!(route_table.depends_on_node(&network.nat_gateway));
    }

    #[test]
    fn test_security_group_policies() {
        for variant in [TopologyVariant::Simple, TopologyVariant::Full] {
            let mut graph = ResourceGraph::new();
            let network = build_network(&mut graph, &config(variant)).unwrap();

            invariants::validate_service_ingress(
                &network.service_security_group.ingress,
                &network.edge_security_group.id,
                Port::CONTAINER,
            )
            .unwrap();
            invariants::validate_edge_ingress(
                &network.edge_security_group.ingress,
                variant.listener_ports(),
            )
            .unwrap();

            let service = graph.node(&network.service_security_group.id).unwrap();
            assert!(service.depends_on_node(&network.edge_security_group.id));
        }
    }

    #[test]
    fn test_security_group_descriptions() {
        let mut graph = ResourceGraph::new();
        let network = build_network(&mut graph, &config(TopologyVariant::Simple)).unwrap();

        let description = |id: &LogicalId| {
            graph
                .node(id)
                .and_then(|n| n.property_value("GroupDescription"))
                .cloned()
        };
        assert_eq!(
            description(&network.edge_security_group.id),
            Some(json!("Security group for Application Load Balancer"))
        );
        assert_eq!(
            description(&network.service_security_group.id),
            Some(json!("Security group for ECS service"))
        );
    }

    #[test]
    fn test_edge_ports_follow_variant() {
        let mut graph = ResourceGraph::new();
        let network = build_network(&mut graph, &config(TopologyVariant::Full)).unwrap();
        let ports: Vec<Port> = network.edge_security_group.ingress.iter().map(|r| r.port).collect();
        assert_eq!(ports, vec![Port::HTTP, Port::HTTPS]);

        let node = graph.node(&network.edge_security_group.id).unwrap();
        assert_eq!(
            node.property_value("SecurityGroupIngress").unwrap()[1]["FromPort"],
            json!(443)
        );
    }

    #[test]
    fn test_building_twice_into_one_graph_fails() {
        let mut graph = ResourceGraph::new();
        let config = config(TopologyVariant::Simple);
        build_network(&mut graph, &config).unwrap();
        assert!(matches!(
            build_network(&mut graph, &config),
            Err(SynthesisError::Graph(_))
        ));
    }
}
