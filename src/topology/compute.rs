// Copyright (c) 2025 - Cowboy AI, Inc.

//! Container compute
//!
//! Cluster, log sink, identities, task definition and the long-running
//! service, added in that dependency order. The container contract is fixed:
//! it listens on port 3000 on all interfaces, runs in production mode and is
//! probed through a loopback `curl` against the variant's health path.
//!
//! Secret bindings are resolved by name before any node is added, so an
//! unknown secret fails synthesis without touching the graph.

use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use super::network::NetworkTopology;
use super::{attribute, logical_id, reference};
use crate::adapters::{Collaborators, SecretReference};
use crate::config::StackConfiguration;
use crate::domain::{invariants, CapacityBounds, ImageReference, Port, ResourceKind};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::graph::{DeletionPolicy, LogicalId, ResourceGraph, ResourceNode};

/// Task CPU units
pub const TASK_CPU: u32 = 512;

/// Task memory in MiB
pub const TASK_MEMORY_MIB: u32 = 1024;

/// Log retention in days
pub const LOG_RETENTION_DAYS: u32 = 30;

/// Prefix of every container log stream
pub const LOG_STREAM_PREFIX: &str = "ecs";

/// Managed policy granting image pull and log delivery
pub const EXECUTION_ROLE_POLICY: &str =
    "arn:aws:iam::aws:policy/service-role/AmazonECSTaskExecutionRolePolicy";

/// Principal that assumes both task roles
pub const TASK_PRINCIPAL: &str = "ecs-tasks.amazonaws.com";

/// Name of the single container in the task
pub const CONTAINER_NAME: &str = "PortfolioContainer";

/// Command-based container health probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHealthCheck {
    pub command: Vec<String>,
    pub interval: Duration,
    pub timeout: Duration,
    pub retries: u32,
    pub start_period: Duration,
}

impl ContainerHealthCheck {
    /// Loopback probe of `path` on the container port
    pub fn for_path(path: &str) -> Self {
        Self {
            command: vec![
                "CMD-SHELL".to_string(),
                format!(
                    "curl -f http://localhost:{}{path} || exit 1",
                    Port::CONTAINER
                ),
            ],
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(5),
            retries: 3,
            start_period: Duration::from_secs(60),
        }
    }

    fn to_manifest(&self) -> Value {
        json!({
            "Command": self.command,
            "Interval": self.interval.as_secs(),
            "Timeout": self.timeout.as_secs(),
            "Retries": self.retries,
            "StartPeriod": self.start_period.as_secs(),
        })
    }
}

/// A secret exposed to the container as an environment variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSecret {
    pub variable: String,
    pub reference: SecretReference,
}

/// The single container in the task definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: ImageReference,
    pub port: Port,
    pub environment: BTreeMap<String, String>,
    pub secrets: Vec<BoundSecret>,
    pub health_check: ContainerHealthCheck,
    pub log_stream_prefix: String,
}

impl ContainerSpec {
    fn to_manifest(&self, log_group: &LogicalId, region: &str) -> Value {
        let environment: Vec<Value> = self
            .environment
            .iter()
            .map(|(name, value)| json!({ "Name": name, "Value": value }))
            .collect();
        let secrets: Vec<Value> = self
            .secrets
            .iter()
            .map(|s| json!({ "Name": s.variable, "ValueFrom": s.reference.arn }))
            .collect();

        json!({
            "Name": self.name,
            "Image": self.image.as_str(),
            "Essential": true,
            "PortMappings": [{ "ContainerPort": self.port.value(), "Protocol": "tcp" }],
            "Environment": environment,
            "Secrets": secrets,
            "HealthCheck": self.health_check.to_manifest(),
            "LogConfiguration": {
                "LogDriver": "awslogs",
                "Options": {
                    "awslogs-group": reference(log_group),
                    "awslogs-region": region,
                    "awslogs-stream-prefix": self.log_stream_prefix,
                },
            },
        })
    }
}

/// How many replicas may be in service while a rollout replaces tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentWindow {
    pub minimum_healthy_percent: u32,
    pub maximum_percent: u32,
}

impl Default for DeploymentWindow {
    fn default() -> Self {
        Self {
            minimum_healthy_percent: 50,
            maximum_percent: 200,
        }
    }
}

/// The running service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub id: LogicalId,
    pub name: String,
    pub desired_count: u32,
    pub capacity: CapacityBounds,
    pub deployment: DeploymentWindow,
    pub subnets: Vec<LogicalId>,
    pub security_group: LogicalId,
    pub assign_public_ip: bool,
    pub enable_execute_command: bool,
}

/// Handles produced by [`build_compute`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeSpec {
    pub cluster: LogicalId,
    pub cluster_name: String,
    pub container_insights: bool,
    pub log_group: LogicalId,
    pub log_group_name: String,
    pub execution_role: LogicalId,
    pub secrets_policy: Option<LogicalId>,
    pub task_role: LogicalId,
    pub task_definition: LogicalId,
    pub container: ContainerSpec,
    pub service: ServiceSpec,
}

fn assume_role_policy() -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "Service": TASK_PRINCIPAL },
            "Action": "sts:AssumeRole",
        }],
    })
}

fn resolve_secrets(
    config: &StackConfiguration,
    collaborators: &Collaborators<'_>,
) -> SynthesisResult<Vec<BoundSecret>> {
    config
        .secrets()
        .iter()
        .map(|binding| {
            let reference = collaborators
                .secrets
                .resolve(&binding.secret_name)
                .ok_or_else(|| {
                    SynthesisError::configuration(
                        format!("ContainerSecret<{}>", binding.variable),
                        format!(
                            "secret {:?} not found in {}",
                            binding.secret_name,
                            collaborators.secrets.name()
                        ),
                    )
                })?;
            Ok(BoundSecret {
                variable: binding.variable.clone(),
                reference,
            })
        })
        .collect()
}

/// Build the compute layer on top of `network`
///
/// # Errors
/// [`SynthesisError::Configuration`] naming `ContainerSecret<VARIABLE>` when a
/// bound secret is not in the store.
pub fn build_compute(
    graph: &mut ResourceGraph,
    config: &StackConfiguration,
    network: &NetworkTopology,
    collaborators: &Collaborators<'_>,
) -> SynthesisResult<ComputeSpec> {
    let secrets = resolve_secrets(config, collaborators)?;
    let name = config.resource_name();
    let container_insights = config.topology().has_edge();

    let cluster = graph.add(
        ResourceNode::new(logical_id("PortfolioCluster")?, ResourceKind::Cluster)
            .property("ClusterName", name.clone())
            .property("CapacityProviders", json!(["FARGATE", "FARGATE_SPOT"]))
            .property(
                "ClusterSettings",
                json!([{
                    "Name": "containerInsights",
                    "Value": if container_insights { "enabled" } else { "disabled" },
                }]),
            ),
    )?;

    let log_group_name = format!("/ecs/{name}");
    let log_group = graph.add(
        ResourceNode::new(logical_id("PortfolioLogGroup")?, ResourceKind::LogGroup)
            .property("LogGroupName", log_group_name.clone())
            .property("RetentionInDays", LOG_RETENTION_DAYS)
            .deletion_policy(DeletionPolicy::Delete),
    )?;

    let execution_role = graph.add(
        ResourceNode::new(logical_id("TaskExecutionRole")?, ResourceKind::Role)
            .property("AssumeRolePolicyDocument", assume_role_policy())
            .property("ManagedPolicyArns", json!([EXECUTION_ROLE_POLICY])),
    )?;

    let secrets_policy = if secrets.is_empty() {
        None
    } else {
        let arns: Vec<&str> = secrets.iter().map(|s| s.reference.arn.as_str()).collect();
        Some(graph.add(
            ResourceNode::new(
                logical_id("TaskExecutionRoleSecretsPolicy")?,
                ResourceKind::Policy,
            )
            .property(
                "PolicyDocument",
                json!({
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Effect": "Allow",
                        "Action": ["secretsmanager:GetSecretValue", "secretsmanager:DescribeSecret"],
                        "Resource": arns,
                    }],
                }),
            )
            .property("Roles", json!([reference(&execution_role)]))
            .depends_on(&execution_role),
        )?)
    };

    let task_role = graph.add(
        ResourceNode::new(logical_id("TaskRole")?, ResourceKind::Role)
            .property("AssumeRolePolicyDocument", assume_role_policy()),
    )?;

    let container = ContainerSpec {
        name: CONTAINER_NAME.to_string(),
        image: config.image().clone(),
        port: Port::CONTAINER,
        environment: BTreeMap::from([
            ("NODE_ENV".to_string(), "production".to_string()),
            ("PORT".to_string(), Port::CONTAINER.to_string()),
            ("HOSTNAME".to_string(), "0.0.0.0".to_string()),
        ]),
        secrets,
        health_check: ContainerHealthCheck::for_path(config.topology().health_check_path()),
        log_stream_prefix: LOG_STREAM_PREFIX.to_string(),
    };

    let task_definition = graph.add(
        ResourceNode::new(
            logical_id("PortfolioTaskDefinition")?,
            ResourceKind::TaskDefinition,
        )
        .property("Family", name.clone())
        .property("Cpu", TASK_CPU.to_string())
        .property("Memory", TASK_MEMORY_MIB.to_string())
        .property("NetworkMode", "awsvpc")
        .property("RequiresCompatibilities", json!(["FARGATE"]))
        .property("ExecutionRoleArn", attribute(&execution_role, "Arn"))
        .property("TaskRoleArn", attribute(&task_role, "Arn"))
        .property(
            "ContainerDefinitions",
            json!([container.to_manifest(&log_group, config.region())]),
        )
        .depends_on(&execution_role)
        .depends_on(&task_role)
        .depends_on(&log_group)
        .depends_on_all(secrets_policy.iter()),
    )?;

    let environment = config.environment();
    let service = ServiceSpec {
        id: logical_id("PortfolioService")?,
        name: name.clone(),
        desired_count: environment.desired_count(),
        capacity: environment.capacity_bounds(),
        deployment: DeploymentWindow::default(),
        subnets: network.private_subnet_ids().into_iter().cloned().collect(),
        security_group: network.service_security_group.id.clone(),
        assign_public_ip: false,
        enable_execute_command: true,
    };

    invariants::validate_capacity(environment, service.desired_count, service.capacity)
        .map_err(|e| SynthesisError::invariant(service.id.as_str(), e))?;
    invariants::validate_deployment_window(
        service.deployment.minimum_healthy_percent,
        service.deployment.maximum_percent,
    )
    .map_err(|e| SynthesisError::invariant(service.id.as_str(), e))?;

    let subnet_refs: Vec<Value> = service.subnets.iter().map(reference).collect();
    graph.add(
        ResourceNode::new(service.id.clone(), ResourceKind::Service)
            .property("ServiceName", service.name.clone())
            .property("Cluster", reference(&cluster))
            .property("TaskDefinition", reference(&task_definition))
            .property("DesiredCount", service.desired_count)
            .property("LaunchType", "FARGATE")
            .property("PlatformVersion", "LATEST")
            .property("EnableExecuteCommand", service.enable_execute_command)
            .property(
                "DeploymentConfiguration",
                json!({
                    "MinimumHealthyPercent": service.deployment.minimum_healthy_percent,
                    "MaximumPercent": service.deployment.maximum_percent,
                }),
            )
            .property(
                "NetworkConfiguration",
                json!({
                    "AwsvpcConfiguration": {
                        "AssignPublicIp": if service.assign_public_ip { "ENABLED" } else { "DISABLED" },
                        "SecurityGroups": [attribute(&service.security_group, "GroupId")],
                        "Subnets": subnet_refs,
                    },
                }),
            )
            .depends_on(&cluster)
            .depends_on(&task_definition)
            .depends_on(&service.security_group)
            .depends_on(&network.private_route_table)
            .depends_on_all(service.subnets.iter()),
    )?;

    debug!(
        cluster = %name,
        desired_count = service.desired_count,
        secrets = container.secrets.len(),
        health_path = config.topology().health_check_path(),
        "Built compute cluster"
    );

    Ok(ComputeSpec {
        cluster,
        cluster_name: name,
        container_insights,
        log_group,
        log_group_name,
        execution_role,
        secrets_policy,
        task_role,
        task_definition,
        container,
        service,
    })
}
