// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Graph
//!
//! The declarative output of synthesis: one [`ResourceNode`] per provisioned
//! resource plus the dependency edges between them.
//!
//! # Construction
//!
//! Builders receive the graph explicitly as `&mut ResourceGraph` and append
//! nodes with [`ResourceGraph::add`]. A node may only depend on nodes that are
//! already present, so insertion order is always a valid topological order
//! and the graph cannot contain a cycle or a dangling edge by construction.
//! [`ResourceGraph::validate`] re-checks both properties independently.
//!
//! ```text
//! PortfolioVPC ──▶ PublicSubnet1 ──▶ PortfolioNatGateway ──▶ PrivateSubnet1
//!      │                                                         │
//!      └──▶ ALBSecurityGroup ──▶ ECSSecurityGroup ──▶ PortfolioService
//! ```
//!
//! Edges point from a dependency to its dependent in the petgraph view; a
//! node's `depends_on` set lists the resources that must be ready first.
//!
//! Nodes of an imported kind (see [`ResourceKind::is_imported`]) stand for
//! existing resources found by lookup. They order their dependents inside the
//! graph but never appear in the manifest.

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::domain::ResourceKind;

/// Structural graph errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Invalid logical id {0:?}: must be 1-255 ASCII alphanumeric characters")]
    InvalidLogicalId(String),

    #[error("Duplicate logical id: {0}")]
    DuplicateNode(LogicalId),

    #[error("{node} depends on {dependency}, which is not in the graph")]
    DanglingDependency {
        node: LogicalId,
        dependency: LogicalId,
    },

    #[error("{0} depends on itself")]
    SelfDependency(LogicalId),

    #[error("Dependency cycle detected at {0}")]
    Cycle(LogicalId),
}

impl GraphError {
    /// Logical resource the error is attributed to
    pub fn resource(&self) -> Option<&str> {
        match self {
            Self::InvalidLogicalId(_) => None,
            Self::DuplicateNode(id) | Self::SelfDependency(id) | Self::Cycle(id) => {
                Some(id.as_str())
            }
            Self::DanglingDependency { node, .. } => Some(node.as_str()),
        }
    }
}

/// Stable logical name of a resource
///
/// Logical ids are the identity of a node across synthesis runs: the same
/// configuration always yields the same ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogicalId(String);

impl LogicalId {
    /// Maximum logical id length
    pub const MAX_LENGTH: usize = 255;

    /// Create a logical id, rejecting empty or non-alphanumeric names
    pub fn new(id: impl Into<String>) -> Result<Self, GraphError> {
        let id = id.into();
        if id.is_empty()
            || id.len() > Self::MAX_LENGTH
            || !id.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(GraphError::InvalidLogicalId(id));
        }
        Ok(Self(id))
    }

    /// Derive a sibling id such as `PublicSubnet` → `PublicSubnet2`
    pub fn with_suffix(&self, suffix: impl fmt::Display) -> Result<Self, GraphError> {
        Self::new(format!("{}{}", self.0, suffix))
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for LogicalId {
    type Error = GraphError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LogicalId> for String {
    fn from(value: LogicalId) -> Self {
        value.0
    }
}

/// One provisioned resource
///
/// Built fluently:
///
/// ```rust
/// use portfolio_infrastructure::domain::ResourceKind;
/// use portfolio_infrastructure::graph::{LogicalId, ResourceNode};
///
/// let vpc = LogicalId::new("PortfolioVPC").unwrap();
/// let subnet = ResourceNode::new(LogicalId::new("PublicSubnet1").unwrap(), ResourceKind::Subnet)
///     .property("CidrBlock", "10.0.0.0/24")
///     .depends_on(&vpc);
/// assert!(subnet.depends_on_node(&vpc));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNode {
    id: LogicalId,
    kind: ResourceKind,
    properties: BTreeMap<String, Value>,
    depends_on: BTreeSet<LogicalId>,
    deletion_policy: Option<DeletionPolicy>,
}

/// What happens to the real resource when its node leaves the graph
///
/// Nodes without an explicit policy keep the orchestrator's default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeletionPolicy {
    Delete,
}

impl DeletionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "Delete",
        }
    }
}

impl ResourceNode {
    /// Create a node with no properties or dependencies
    pub fn new(id: LogicalId, kind: ResourceKind) -> Self {
        Self {
            id,
            kind,
            properties: BTreeMap::new(),
            depends_on: BTreeSet::new(),
            deletion_policy: None,
        }
    }

    /// Set a configuration attribute
    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Add a dependency edge
    pub fn depends_on(mut self, id: &LogicalId) -> Self {
        self.depends_on.insert(id.clone());
        self
    }

    /// Add several dependency edges
    pub fn depends_on_all<'a>(mut self, ids: impl IntoIterator<Item = &'a LogicalId>) -> Self {
        self.depends_on.extend(ids.into_iter().cloned());
        self
    }

    /// Set the deletion policy
    pub fn deletion_policy(mut self, policy: DeletionPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self
    }

    pub fn id(&self) -> &LogicalId {
        &self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    /// Look up one configuration attribute
    pub fn property_value(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn dependencies(&self) -> &BTreeSet<LogicalId> {
        &self.depends_on
    }

    /// Whether this node directly depends on `id`
    pub fn depends_on_node(&self, id: &LogicalId) -> bool {
        self.depends_on.contains(id)
    }

    pub fn deletion(&self) -> Option<DeletionPolicy> {
        self.deletion_policy
    }

    /// Whether the node refers to an existing resource rather than one to create
    pub fn is_imported(&self) -> bool {
        self.kind.is_imported()
    }

    /// Manifest entry: `{ "Type", "Properties", "DependsOn", "DeletionPolicy" }`
    pub fn to_manifest_entry(&self) -> Value {
        self.manifest_entry(|_| true)
    }

    fn manifest_entry(&self, provisioned: impl Fn(&LogicalId) -> bool) -> Value {
        let mut entry = Map::new();
        entry.insert("Type".to_string(), json!(self.kind.provider_type()));
        if let Some(policy) = self.deletion_policy {
            entry.insert("DeletionPolicy".to_string(), json!(policy.as_str()));
        }
        entry.insert(
            "Properties".to_string(),
            Value::Object(self.properties.clone().into_iter().collect()),
        );
        let deps: Vec<&str> = self
            .depends_on
            .iter()
            .filter(|dep| provisioned(dep))
            .map(LogicalId::as_str)
            .collect();
        if !deps.is_empty() {
            entry.insert("DependsOn".to_string(), json!(deps));
        }
        Value::Object(entry)
    }
}

/// Accumulator every builder appends to
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceGraph {
    nodes: BTreeMap<LogicalId, ResourceNode>,
    insertion_order: Vec<LogicalId>,
}

impl ResourceGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node
    ///
    /// # Errors
    /// - [`GraphError::DuplicateNode`] if the logical id is taken
    /// - [`GraphError::SelfDependency`] if the node lists itself
    /// - [`GraphError::DanglingDependency`] if a dependency is not yet present
    pub fn add(&mut self, node: ResourceNode) -> Result<LogicalId, GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        if node.depends_on.contains(&node.id) {
            return Err(GraphError::SelfDependency(node.id));
        }
        if let Some(missing) = node
            .depends_on
            .iter()
            .find(|dep| !self.nodes.contains_key(*dep))
        {
            return Err(GraphError::DanglingDependency {
                node: node.id.clone(),
                dependency: missing.clone(),
            });
        }

        debug!(
            id = %node.id,
            kind = node.kind.as_str(),
            dependencies = node.depends_on.len(),
            "Added resource node"
        );

        let id = node.id.clone();
        self.insertion_order.push(id.clone());
        self.nodes.insert(id.clone(), node);
        Ok(id)
    }

    pub fn contains(&self, id: &LogicalId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &LogicalId) -> Option<&ResourceNode> {
        self.nodes.get(id)
    }

    /// Look up a node by its logical name
    pub fn node_named(&self, name: &str) -> Option<&ResourceNode> {
        self.nodes.iter().find(|(id, _)| id.as_str() == name).map(|(_, node)| node)
    }

    /// All nodes, ordered by logical id
    pub fn nodes(&self) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.values()
    }

    /// All logical ids, ordered
    pub fn logical_ids(&self) -> BTreeSet<LogicalId> {
        self.nodes.keys().cloned().collect()
    }

    pub fn nodes_of_kind(&self, kind: ResourceKind) -> Vec<&ResourceNode> {
        self.nodes.values().filter(|n| n.kind == kind).collect()
    }

    pub fn count_of_kind(&self, kind: ResourceKind) -> usize {
        self.nodes.values().filter(|n| n.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every `(dependent, dependency)` pair
    pub fn edges(&self) -> BTreeSet<(LogicalId, LogicalId)> {
        self.nodes
            .values()
            .flat_map(|node| {
                node.depends_on
                    .iter()
                    .map(move |dep| (node.id.clone(), dep.clone()))
            })
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.depends_on.len()).sum()
    }

    /// Nodes that directly depend on `id`
    pub fn dependents_of(&self, id: &LogicalId) -> Vec<&LogicalId> {
        self.nodes
            .values()
            .filter(|n| n.depends_on.contains(id))
            .map(|n| &n.id)
            .collect()
    }

    /// Whether `node` depends on `dependency`, directly or transitively
    pub fn depends_transitively(&self, node: &LogicalId, dependency: &LogicalId) -> bool {
        let mut stack: Vec<&LogicalId> = vec![node];
        let mut seen: BTreeSet<&LogicalId> = BTreeSet::new();

        while let Some(current) = stack.pop() {
            let Some(current_node) = self.nodes.get(current) else {
                continue;
            };
            for dep in &current_node.depends_on {
                if dep == dependency {
                    return true;
                }
                if seen.insert(dep) {
                    stack.push(dep);
                }
            }
        }
        false
    }

    fn as_petgraph(&self) -> DiGraphMap<&str, ()> {
        let mut graph = DiGraphMap::new();
        for id in &self.insertion_order {
            graph.add_node(id.as_str());
        }
        for node in self.nodes.values() {
            for dep in &node.depends_on {
                graph.add_edge(dep.as_str(), node.id.as_str(), ());
            }
        }
        graph
    }

    /// Check the graph is a DAG with no dangling edges
    pub fn validate(&self) -> Result<(), GraphError> {
        for node in self.nodes.values() {
            for dep in &node.depends_on {
                if dep == &node.id {
                    return Err(GraphError::SelfDependency(node.id.clone()));
                }
                if !self.nodes.contains_key(dep) {
                    return Err(GraphError::DanglingDependency {
                        node: node.id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        self.topological_order().map(|_| ())
    }

    /// Nodes ordered so every dependency precedes its dependents
    pub fn topological_order(&self) -> Result<Vec<LogicalId>, GraphError> {
        let graph = self.as_petgraph();
        let order = toposort(&graph, None)
            .map_err(|cycle| GraphError::Cycle(LogicalId(cycle.node_id().to_string())))?;
        Ok(order.into_iter().map(|id| LogicalId(id.to_string())).collect())
    }

    /// `{ "Resources": { <id>: <entry> } }`
    pub fn to_manifest(&self) -> Value {
        json!({ "Resources": self.resources_manifest() })
    }

    /// Manifest entries keyed by logical id
    ///
    /// Imported nodes are left out, and so are dependencies on them.
    pub fn resources_manifest(&self) -> Map<String, Value> {
        let provisioned = |id: &LogicalId| self.nodes.get(id).is_some_and(|n| !n.is_imported());
        self.nodes
            .iter()
            .filter(|(_, node)| !node.is_imported())
            .map(|(id, node)| (id.as_str().to_string(), node.manifest_entry(&provisioned)))
            .collect()
    }
}
