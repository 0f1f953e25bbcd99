// Copyright (c) 2025 - Cowboy AI, Inc.

//! Autoscaling
//!
//! Two independent target-tracking loops, CPU and memory, act on the same
//! service within the environment's capacity bounds. The loops themselves run
//! in the platform; the graph only records their thresholds and cooldowns.
//!
//! When both loops want to act at once the platform applies the proposal with
//! the largest capacity, which [`ConflictResolution::resolve`] states as a
//! pure function.

use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::compute::ComputeSpec;
use super::{logical_id, reference};
use crate::config::StackConfiguration;
use crate::domain::{invariants, CapacityBounds, ResourceKind, ValidationError};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::graph::{LogicalId, ResourceGraph, ResourceNode};

/// Wait before removing capacity
pub const SCALE_IN_COOLDOWN: Duration = Duration::from_secs(300);

/// Wait before adding more capacity
pub const SCALE_OUT_COOLDOWN: Duration = Duration::from_secs(120);

/// Metric a policy tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalingMetric {
    Cpu,
    Memory,
}

impl ScalingMetric {
    /// Provider metric name
    pub fn predefined_metric(&self) -> &'static str {
        match self {
            Self::Cpu => "ECSServiceAverageCPUUtilization",
            Self::Memory => "ECSServiceAverageMemoryUtilization",
        }
    }

    /// Default target utilization in percent
    pub fn default_target(&self) -> u32 {
        match self {
            Self::Cpu => 70,
            Self::Memory => 80,
        }
    }
}

/// How simultaneous scaling proposals are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConflictResolution {
    /// The proposal with the largest capacity wins
    #[default]
    HighestCapacity,
}

impl ConflictResolution {
    /// Pick the winning capacity delta, `None` when nobody proposes
    pub fn resolve(&self, proposals: &[i32]) -> Option<i32> {
        match self {
            Self::HighestCapacity => proposals.iter().copied().max(),
        }
    }
}

/// One target-tracking control loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalingPolicy {
    pub id: LogicalId,
    pub metric: ScalingMetric,
    pub target_utilization: u32,
    pub scale_in_cooldown: Duration,
    pub scale_out_cooldown: Duration,
}

impl ScalingPolicy {
    /// Create a policy, enforcing 1..=100 targets and scale-in > scale-out
    pub fn new(
        id: LogicalId,
        metric: ScalingMetric,
        target_utilization: u32,
        scale_in_cooldown: Duration,
        scale_out_cooldown: Duration,
    ) -> Result<Self, ValidationError> {
        invariants::validate_target_utilization(target_utilization)?;
        invariants::validate_scaling_cooldowns(scale_in_cooldown, scale_out_cooldown)?;
        Ok(Self {
            id,
            metric,
            target_utilization,
            scale_in_cooldown,
            scale_out_cooldown,
        })
    }
}

/// Capacity bounds shared by both policies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalableTargetSpec {
    pub id: LogicalId,
    pub bounds: CapacityBounds,
    pub conflict_resolution: ConflictResolution,
}

/// Handles produced by [`attach_autoscaling`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalingPlan {
    pub target: ScalableTargetSpec,
    pub cpu: ScalingPolicy,
    pub memory: ScalingPolicy,
}

impl ScalingPlan {
    pub fn policies(&self) -> [&ScalingPolicy; 2] {
        [&self.cpu, &self.memory]
    }
}

fn policy(name: &str, metric: ScalingMetric) -> SynthesisResult<ScalingPolicy> {
    ScalingPolicy::new(
        logical_id(name)?,
        metric,
        metric.default_target(),
        SCALE_IN_COOLDOWN,
        SCALE_OUT_COOLDOWN,
    )
    .map_err(|e| SynthesisError::invariant(name, e))
}

/// Attach the scalable target and both policies to the service
pub fn attach_autoscaling(
    graph: &mut ResourceGraph,
    config: &StackConfiguration,
    compute: &ComputeSpec,
) -> SynthesisResult<ScalingPlan> {
    let bounds = config.environment().capacity_bounds();
    let target_id = graph.add(
        ResourceNode::new(
            logical_id("PortfolioScalableTarget")?,
            ResourceKind::ScalableTarget,
        )
        .property("MinCapacity", bounds.min)
        .property("MaxCapacity", bounds.max)
        .property(
            "ResourceId",
            format!("service/{}/{}", compute.cluster_name, compute.service.name),
        )
        .property("ScalableDimension", "ecs:service:DesiredCount")
        .property("ServiceNamespace", "ecs")
        .depends_on(&compute.service.id),
    )?;

    let cpu = policy("CPUScaling", ScalingMetric::Cpu)?;
    let memory = policy("MemoryScaling", ScalingMetric::Memory)?;

    for policy in [&cpu, &memory] {
        graph.add(
            ResourceNode::new(policy.id.clone(), ResourceKind::ScalingPolicy)
                .property("PolicyName", policy.id.as_str())
                .property("PolicyType", "TargetTrackingScaling")
                .property("ScalingTargetId", reference(&target_id))
                .property(
                    "TargetTrackingScalingPolicyConfiguration",
                    json!({
                        "TargetValue": f64::from(policy.target_utilization),
                        "PredefinedMetricSpecification": {
                            "PredefinedMetricType": policy.metric.predefined_metric(),
                        },
                        "ScaleInCooldown": policy.scale_in_cooldown.as_secs(),
                        "ScaleOutCooldown": policy.scale_out_cooldown.as_secs(),
                    }),
                )
                .depends_on(&target_id),
        )?;
    }

    debug!(
        min = bounds.min,
        max = bounds.max,
        cpu_target = cpu.target_utilization,
        memory_target = memory.target_utilization,
        "Attached autoscaling"
    );

    Ok(ScalingPlan {
        target: ScalableTargetSpec {
            id: target_id,
            bounds,
            conflict_resolution: ConflictResolution::HighestCapacity,
        },
        cpu,
        memory,
    })
}
