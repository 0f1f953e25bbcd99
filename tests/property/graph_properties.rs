// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Resource Graphs
//!
//! Random dependency graphs must stay acyclic and be exported in an order
//! that respects every edge. Synthesized stacks must satisfy the topology
//! invariants for every environment and variant.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use portfolio_infrastructure::domain::{
    CidrBlock, Environment, IngressSource, Port, ResourceKind, TopologyVariant,
};
use portfolio_infrastructure::graph::{GraphError, LogicalId, ResourceGraph, ResourceNode};
use proptest::prelude::*;

use crate::fixtures::synthesize_for;

// ============================================================================
// Strategies
// ============================================================================

fn environment() -> impl Strategy<Value = Environment> {
    prop_oneof![
        Just(Environment::Dev),
        Just(Environment::Staging),
        Just(Environment::Prod),
    ]
}

fn variant() -> impl Strategy<Value = TopologyVariant> {
    prop_oneof![Just(TopologyVariant::Simple), Just(TopologyVariant::Full)]
}

/// For each node, the indices of earlier nodes it depends on
fn dag_shape() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..24).prop_flat_map(|size| {
        (0..size)
            .map(|index| {
                if index == 0 {
                    Just(Vec::new()).boxed()
                } else {
                    prop::collection::vec(0..index, 0..4).boxed()
                }
            })
            .collect::<Vec<_>>()
    })
}

fn node_id(index: usize) -> LogicalId {
    LogicalId::new(format!("Node{index}")).expect("generated ids are alphanumeric")
}

fn build_graph(shape: &[Vec<usize>]) -> ResourceGraph {
    let mut graph = ResourceGraph::new();
    for (index, deps) in shape.iter().enumerate() {
        let deps: Vec<LogicalId> = deps.iter().map(|d| node_id(*d)).collect();
        graph
            .add(ResourceNode::new(node_id(index), ResourceKind::Subnet).depends_on_all(&deps))
            .expect("dependencies precede dependents");
    }
    graph
}

// ============================================================================
// Graph Properties
// ============================================================================

proptest! {
    /// Graphs built by insertion are acyclic and fully resolved
    #[test]
    fn prop_inserted_graph_is_valid_dag(shape in dag_shape()) {
        let graph = build_graph(&shape);

        prop_assert_eq!(graph.len(), shape.len());
        prop_assert!(graph.validate().is_ok());
        for (from, to) in graph.edges() {
            prop_assert!(graph.contains(&from));
            prop_assert!(graph.contains(&to));
        }
    }

    /// Every dependency comes before its dependent in the export order
    #[test]
    fn prop_topological_order_respects_edges(shape in dag_shape()) {
        let graph = build_graph(&shape);
        let order = graph.topological_order().expect("acyclic");

        let position: HashMap<&LogicalId, usize> =
            order.iter().enumerate().map(|(i, id)| (id, i)).collect();
        prop_assert_eq!(position.len(), graph.len());
        for node in graph.nodes() {
            for dependency in node.dependencies() {
                prop_assert!(position[dependency] < position[node.id()]);
            }
        }
    }

    /// A dependency on an absent node is rejected and leaves the graph untouched
    #[test]
    fn prop_dangling_dependency_rejected(shape in dag_shape()) {
        let mut graph = build_graph(&shape);
        let before = graph.len();
        let missing = node_id(shape.len() + 100);

        let result = graph.add(
            ResourceNode::new(node_id(shape.len()), ResourceKind::Subnet).depends_on(&missing),
        );
        let is_dangling = matches!(result, Err(GraphError::DanglingDependency { .. }));
        prop_assert!(is_dangling);
        prop_assert_eq!(graph.len(), before);
    }

    /// Carving a block into subnets yields disjoint, contained children
    #[test]
    fn prop_subnets_are_contained(
        octets in any::<[u8; 2]>(),
        prefix in 8u8..=24,
        extra in 1u8..=6,
    ) {
        let raw = u32::from(Ipv4Addr::new(10, octets[0], octets[1], 0));
        let network = Ipv4Addr::from(raw & (u32::MAX << (32 - u32::from(prefix))));
        let parent = CidrBlock::from_parts(network, prefix).expect("host bits cleared");
        let new_prefix = prefix + extra;
        let first = parent.subnet(new_prefix, 0).expect("first subnet exists");
        let second = parent.subnet(new_prefix, 1).expect("second subnet exists");

        prop_assert!(parent.contains(&first));
        prop_assert!(parent.contains(&second));
        prop_assert!(!first.contains(&second));
        prop_assert_eq!(first.prefix_length(), new_prefix);
    }
}

// ============================================================================
// Topology Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Replica counts always sit inside the scaling bounds
    #[test]
    fn prop_capacity_policy(env in environment(), variant in variant()) {
        let stack = synthesize_for(env, variant).expect("fixture synthesizes");
        let desired = stack.plan.compute().service.desired_count;
        let bounds = stack.plan.scaling().target.bounds;

        prop_assert!(bounds.min >= 1);
        prop_assert!(bounds.contains(desired));
        prop_assert_eq!(desired, if env.is_production() { 2 } else { 1 });
        prop_assert_eq!(bounds.max, if env.is_production() { 10 } else { 3 });
        for policy in stack.plan.scaling().policies() {
            prop_assert!(policy.scale_in_cooldown > policy.scale_out_cooldown);
        }
    }

    /// The service group only admits the load balancer group on the container port
    #[test]
    fn prop_service_ingress_only_from_edge(env in environment(), variant in variant()) {
        let stack = synthesize_for(env, variant).expect("fixture synthesizes");
        let network = stack.plan.network();

        prop_assert!(!network.service_security_group.ingress.is_empty());
        for rule in &network.service_security_group.ingress {
            prop_assert_eq!(
                &rule.source,
                &IngressSource::SecurityGroup(network.edge_security_group.id.clone())
            );
            prop_assert_eq!(rule.port, Port::CONTAINER);
        }
    }

    /// Edge resources exist exactly when the full topology is selected
    #[test]
    fn prop_edge_only_in_full(env in environment(), variant in variant()) {
        let stack = synthesize_for(env, variant).expect("fixture synthesizes");
        let graph = &stack.graph;
        let full = variant == TopologyVariant::Full;

        prop_assert_eq!(stack.plan.edge().is_some(), full);
        prop_assert_eq!(graph.count_of_kind(ResourceKind::HostedZone), usize::from(full));
        prop_assert_eq!(graph.count_of_kind(ResourceKind::Distribution), usize::from(full));
        prop_assert_eq!(graph.count_of_kind(ResourceKind::Certificate), if full { 2 } else { 0 });
        prop_assert_eq!(graph.count_of_kind(ResourceKind::AliasRecord), if full { 2 } else { 0 });
        prop_assert_eq!(graph.count_of_kind(ResourceKind::Listener), if full { 2 } else { 1 });
    }

    /// Both health probes target the variant's path
    #[test]
    fn prop_health_path_follows_variant(env in environment(), variant in variant()) {
        let stack = synthesize_for(env, variant).expect("fixture synthesizes");
        let path = variant.health_check_path();

        prop_assert_eq!(stack.plan.traffic().target_group.health_check.path.as_str(), path);
        prop_assert!(stack.plan.compute().container.health_check.command[1].contains(path));
    }

    /// Synthesis is a pure function of its inputs
    #[test]
    fn prop_synthesis_is_idempotent(env in environment(), variant in variant()) {
        let first = synthesize_for(env, variant).expect("fixture synthesizes");
        let second = synthesize_for(env, variant).expect("fixture synthesizes");

        prop_assert_eq!(&first.graph, &second.graph);
        prop_assert_eq!(first.to_manifest(), second.to_manifest());
        prop_assert_eq!(
            first.graph.topological_order().expect("acyclic"),
            second.graph.topological_order().expect("acyclic")
        );
    }
}
