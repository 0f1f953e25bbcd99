// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for topology synthesis
//!
//! Synthesis either produces a complete, internally consistent graph or fails
//! outright. Every variant carries the logical resource that could not be
//! built so callers never see a bare "construction failed".

use thiserror::Error;

use crate::domain::ValidationError;
use crate::graph::GraphError;

/// Errors that abort graph construction
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    /// Missing or invalid input field, or an unresolvable secret reference
    #[error("Configuration error in {resource}: {reason}")]
    Configuration { resource: String, reason: String },

    /// An external lookup needed to complete the graph could not be satisfied
    #[error("Dependency resolution error: {resource} requires {dependency}, which could not be resolved")]
    DependencyResolution { resource: String, dependency: String },

    /// A finished plan broke one of the topology invariants
    #[error("Invariant violated by {resource}: {violation}")]
    InvariantViolation {
        resource: String,
        violation: ValidationError,
    },

    /// Structural graph error (duplicate id, cycle, malformed id)
    #[error("Graph error: {0}")]
    Graph(GraphError),

    /// Node properties could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for synthesis operations
pub type SynthesisResult<T> = Result<T, SynthesisError>;

impl SynthesisError {
    /// Build a configuration error for the named resource
    pub fn configuration(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    /// Build a dependency-resolution error for the named resource
    pub fn dependency(resource: impl Into<String>, dependency: impl Into<String>) -> Self {
        Self::DependencyResolution {
            resource: resource.into(),
            dependency: dependency.into(),
        }
    }

    /// Build an invariant violation for the named resource
    pub fn invariant(resource: impl Into<String>, violation: ValidationError) -> Self {
        Self::InvariantViolation {
            resource: resource.into(),
            violation,
        }
    }

    /// Logical resource this error is attributed to, when there is one
    pub fn resource(&self) -> Option<&str> {
        match self {
            Self::Configuration { resource, .. }
            | Self::DependencyResolution { resource, .. }
            | Self::InvariantViolation { resource, .. } => Some(resource),
            Self::Graph(err) => err.resource(),
            Self::Serialization(_) => None,
        }
    }
}

impl From<GraphError> for SynthesisError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::DanglingDependency { node, dependency } => {
                Self::dependency(node.as_str(), dependency.as_str())
            }
            other => Self::Graph(other),
        }
    }
}

impl From<serde_json::Error> for SynthesisError {
    fn from(err: serde_json::Error) -> Self {
        SynthesisError::Serialization(err.to_string())
    }
}
