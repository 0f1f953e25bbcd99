// Copyright (c) 2025 - Cowboy AI, Inc.

//! Topology synthesis
//!
//! Each builder is a plain function that takes the handles it needs, appends
//! its nodes to an explicitly passed [`ResourceGraph`] and returns new
//! handles. [`synthesize`] runs them in dependency order:
//!
//! ```text
//! StackConfiguration
//!   └─▶ build_network ─▶ build_compute ─┬─────────────────────────────▶ build_routing ─▶ attach_autoscaling   (simple)
//!                                       └─▶ issue_certificates ─▶ build_routing ─▶ build_distribution
//!                                                                               ─▶ attach_autoscaling  (full)
//!                                                                                     └─▶ export_outputs
//! ```
//!
//! The edge layer is split in two: the TLS listener needs the regional
//! certificate before routing exists, while the distribution needs the load
//! balancer afterwards.
//!
//! The result is either a complete, validated graph or an error naming the
//! resource that could not be built. No partial graph escapes.

pub mod compute;
pub mod edge;
pub mod network;
pub mod outputs;
pub mod routing;
pub mod scaling;

use serde_json::{json, Value};
use tracing::info;

use crate::adapters::Collaborators;
use crate::config::{AmbientEnvironment, DeploymentSettings, EnvironmentResolver, StackConfiguration};
use crate::domain::{invariants, Environment, Port, TopologyVariant};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::graph::{LogicalId, ResourceGraph};

pub use compute::{build_compute, ComputeSpec};
pub use edge::{build_distribution, issue_certificates, EdgeCertificates, EdgePlan};
pub use network::{build_network, NetworkTopology, SecurityGroupPolicy, SecurityGroupRole};
pub use outputs::{export_outputs, AttributeSource, OutputValue, StackOutputs, StaticAttributes};
pub use routing::{build_routing, ListenerSet, TrafficPlan};
pub use scaling::{attach_autoscaling, ConflictResolution, ScalingPlan, ScalingPolicy};

pub(crate) fn logical_id(name: &str) -> SynthesisResult<LogicalId> {
    Ok(LogicalId::new(name)?)
}

/// `{ "Ref": id }`
pub(crate) fn reference(id: &LogicalId) -> Value {
    json!({ "Ref": id.as_str() })
}

/// `{ "Fn::GetAtt": [id, name] }`
pub(crate) fn attribute(id: &LogicalId, name: &str) -> Value {
    json!({ "Fn::GetAtt": [id.as_str(), name] })
}

/// HTTP-only topology reached through the load balancer's DNS name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleTopology {
    pub network: NetworkTopology,
    pub compute: ComputeSpec,
    pub traffic: TrafficPlan,
    pub scaling: ScalingPlan,
}

/// TLS, CDN and DNS in front of the same core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullTopology {
    pub network: NetworkTopology,
    pub compute: ComputeSpec,
    pub traffic: TrafficPlan,
    pub edge: EdgePlan,
    pub scaling: ScalingPlan,
}

/// Handles of a finished topology
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyPlan {
    Simple(SimpleTopology),
    Full(FullTopology),
}

impl TopologyPlan {
    pub fn variant(&self) -> TopologyVariant {
        match self {
            Self::Simple(_) => TopologyVariant::Simple,
            Self::Full(_) => TopologyVariant::Full,
        }
    }

    pub fn network(&self) -> &NetworkTopology {
        match self {
            Self::Simple(plan) => &plan.network,
            Self::Full(plan) => &plan.network,
        }
    }

    pub fn compute(&self) -> &ComputeSpec {
        match self {
            Self::Simple(plan) => &plan.compute,
            Self::Full(plan) => &plan.compute,
        }
    }

    pub fn traffic(&self) -> &TrafficPlan {
        match self {
            Self::Simple(plan) => &plan.traffic,
            Self::Full(plan) => &plan.traffic,
        }
    }

    pub fn scaling(&self) -> &ScalingPlan {
        match self {
            Self::Simple(plan) => &plan.scaling,
            Self::Full(plan) => &plan.scaling,
        }
    }

    pub fn edge(&self) -> Option<&EdgePlan> {
        match self {
            Self::Simple(_) => None,
            Self::Full(plan) => Some(&plan.edge),
        }
    }
}

/// A synthesized stack: configuration, graph, handles and outputs
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedStack {
    pub configuration: StackConfiguration,
    pub graph: ResourceGraph,
    pub plan: TopologyPlan,
    pub outputs: StackOutputs,
}

impl SynthesizedStack {
    pub fn stack_name(&self) -> String {
        self.configuration.stack_name()
    }

    /// Full manifest: description, tags, resources and outputs
    pub fn to_manifest(&self) -> Value {
        json!({
            "Description": self.configuration.description(),
            "Tags": self.configuration.tags().to_map(),
            "Resources": self.graph.resources_manifest(),
            "Outputs": self.outputs.to_manifest(),
        })
    }

    /// Pretty-printed manifest
    pub fn to_manifest_string(&self) -> SynthesisResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_manifest())?)
    }
}

/// Build the complete resource graph for one configuration
pub fn synthesize(
    config: &StackConfiguration,
    collaborators: &Collaborators<'_>,
) -> SynthesisResult<SynthesizedStack> {
    info!(
        stack = %config.stack_name(),
        environment = %config.environment(),
        topology = %config.topology(),
        "Synthesizing stack"
    );

    let mut graph = ResourceGraph::new();
    let network = build_network(&mut graph, config)?;
    let compute = build_compute(&mut graph, config, &network, collaborators)?;

    let plan = match config.topology() {
        TopologyVariant::Simple => {
            let traffic = build_routing(&mut graph, config, &network, &compute, None)?;
            let scaling = attach_autoscaling(&mut graph, config, &compute)?;
            TopologyPlan::Simple(SimpleTopology {
                network,
                compute,
                traffic,
                scaling,
            })
        }
        TopologyVariant::Full => {
            let certificates = issue_certificates(&mut graph, config, collaborators)?;
            let traffic = build_routing(
                &mut graph,
                config,
                &network,
                &compute,
                Some(&certificates.regional),
            )?;
            let edge = build_distribution(&mut graph, config, certificates, &traffic)?;
            let scaling = attach_autoscaling(&mut graph, config, &compute)?;
            TopologyPlan::Full(FullTopology {
                network,
                compute,
                traffic,
                edge,
                scaling,
            })
        }
    };

    graph.validate()?;
    check_invariants(&graph, &plan, config)?;

    let outputs = export_outputs(&plan, config);

    info!(
        stack = %config.stack_name(),
        resources = graph.len(),
        edges = graph.edge_count(),
        outputs = outputs.len(),
        "Synthesized stack"
    );

    Ok(SynthesizedStack {
        configuration: config.clone(),
        graph,
        plan,
        outputs,
    })
}

/// Synthesize the dev, staging and prod stacks from one settings object
pub fn synthesize_app(
    ambient: &AmbientEnvironment,
    settings: &DeploymentSettings,
    collaborators: &Collaborators<'_>,
) -> SynthesisResult<Vec<SynthesizedStack>> {
    Environment::ALL
        .iter()
        .map(|environment| {
            let config = EnvironmentResolver::resolve(*environment, ambient, settings)?;
            synthesize(&config, collaborators)
        })
        .collect()
}

fn check_invariants(
    graph: &ResourceGraph,
    plan: &TopologyPlan,
    config: &StackConfiguration,
) -> SynthesisResult<()> {
    let network = plan.network();
    let traffic = plan.traffic();
    let compute = plan.compute();
    let variant = plan.variant();
    let violation = |resource: &LogicalId| {
        let resource = resource.as_str().to_string();
        move |e| SynthesisError::invariant(resource, e)
    };

    invariants::validate_service_ingress(
        &network.service_security_group.ingress,
        &network.edge_security_group.id,
        Port::CONTAINER,
    )
    .map_err(violation(&network.service_security_group.id))?;
    invariants::validate_edge_ingress(
        &network.edge_security_group.ingress,
        variant.listener_ports(),
    )
    .map_err(violation(&network.edge_security_group.id))?;

    let listener_owner = &traffic.load_balancer;
    invariants::validate_listener_set(
        &traffic.listeners.descriptors(),
        traffic.listeners.certificate(),
    )
    .map_err(violation(listener_owner))?;
    invariants::validate_health_check_path(variant, &traffic.target_group.health_check.path)
        .map_err(violation(&traffic.target_group.id))?;

    invariants::validate_capacity(
        config.environment(),
        compute.service.desired_count,
        plan.scaling().target.bounds,
    )
    .map_err(violation(&plan.scaling().target.id))?;
    for policy in plan.scaling().policies() {
        invariants::validate_scaling_cooldowns(policy.scale_in_cooldown, policy.scale_out_cooldown)
            .map_err(violation(&policy.id))?;
    }

    for node in graph.nodes() {
        invariants::validate_edge_resource(variant, node.kind()).map_err(violation(node.id()))?;
    }

    if let Some(edge) = plan.edge() {
        let certificates = &edge.certificates;
        invariants::validate_certificate_region(&certificates.regional.region, config.region())
            .map_err(violation(&certificates.regional.id))?;
        invariants::validate_certificate_region(
            &certificates.distribution.region,
            edge::EDGE_CERTIFICATE_REGION,
        )
        .map_err(violation(&certificates.distribution.id))?;

        let distribution = &edge.distribution.id;
        let validation = &certificates.distribution.validation;
        if !graph.depends_transitively(distribution, validation) {
            return Err(SynthesisError::dependency(
                distribution.as_str(),
                validation.as_str(),
            ));
        }
        for record in &edge.alias_records {
            if !graph.depends_transitively(&record.id, distribution) {
                return Err(SynthesisError::dependency(
                    record.id.as_str(),
                    distribution.as_str(),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{StaticHostedZones, StaticSecretCatalog};
    use crate::domain::{DomainName, ResourceKind};

    fn settings(variant: TopologyVariant) -> DeploymentSettings {
        DeploymentSettings::default()
            .with_domain_name("example.com")
            .with_docker_image("example/site:latest")
            .with_topology(variant)
    }

    fn zones() -> StaticHostedZones {
        StaticHostedZones::new().with_zone(DomainName::new("example.com").unwrap(), "Z123")
    }

    #[test]
    fn test_simple_plan_has_no_edge() {
        let secrets = StaticSecretCatalog::new();
        let zones = zones();
        let config = EnvironmentResolver::resolve(
            Environment::Dev,
            &AmbientEnvironment::default(),
            &settings(TopologyVariant::Simple),
        )
        .unwrap();

        let stack = synthesize(&config, &Collaborators::new(&secrets, &zones)).unwrap();
        assert!(stack.plan.edge().is_none());
        assert_eq!(stack.plan.variant(), TopologyVariant::Simple);
        assert_eq!(stack.graph.count_of_kind(ResourceKind::Distribution), 0);
    }

    #[test]
    fn test_full_plan_orders_edge() {
        let secrets = StaticSecretCatalog::new();
        let zones = zones();
        let config = EnvironmentResolver::resolve(
            Environment::Prod,
            &AmbientEnvironment::default(),
            &settings(TopologyVariant::Full),
        )
        .unwrap();

        let stack = synthesize(&config, &Collaborators::new(&secrets, &zones)).unwrap();
        let edge = stack.plan.edge().unwrap();
        for record in &edge.alias_records {
            assert_eq!(record.target, edge.distribution.id);
        }
        assert!(stack
            .graph
            .depends_transitively(&edge.distribution.id, &edge.certificates.distribution.validation));
    }

    #[test]
    fn test_simple_plan_rejects_edge_nodes() {
        let secrets = StaticSecretCatalog::new();
        let zones = zones();
        let config = EnvironmentResolver::resolve(
            Environment::Dev,
            &AmbientEnvironment::default(),
            &settings(TopologyVariant::Simple),
        )
        .unwrap();
        let stack = synthesize(&config, &Collaborators::new(&secrets, &zones)).unwrap();

        let mut graph = stack.graph.clone();
        let stray = LogicalId::new("StrayCertificate").unwrap();
        graph
            .add(crate::graph::ResourceNode::new(stray, ResourceKind::Certificate))
            .unwrap();

        let err = check_invariants(&graph, &stack.plan, &config).unwrap_err();
        assert_eq!(err.resource(), Some("StrayCertificate"));
        assert!(matches!(
            err,
            SynthesisError::InvariantViolation {
                violation: invariants::ValidationError::EdgeResource { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_manifest_sections() {
        let secrets = StaticSecretCatalog::new();
        let zones = zones();
        let config = EnvironmentResolver::resolve(
            Environment::Staging,
            &AmbientEnvironment::default(),
            &settings(TopologyVariant::Simple),
        )
        .unwrap();

        let stack = synthesize(&config, &Collaborators::new(&secrets, &zones)).unwrap();
        let manifest = stack.to_manifest();
        assert_eq!(manifest["Description"], json!("Portfolio Staging Infrastructure"));
        assert_eq!(manifest["Tags"]["CostCenter"], json!("staging"));
        assert_eq!(
            manifest["Resources"]["PortfolioVPC"]["Type"],
            json!("AWS::EC2::VPC")
        );
        assert!(manifest["Outputs"]["WebsiteURL"]["Value"].is_object());
        assert!(stack.to_manifest_string().unwrap().contains("PortfolioService"));
    }
}
