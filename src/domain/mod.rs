// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment Domain Models
//!
//! Value objects and invariants shared by every topology builder.
//!
//! # Value Objects with Invariants
//!
//! - [`DomainName`] - RFC 1123 validated public domain
//! - [`ImageReference`] - container registry reference
//! - [`CidrBlock`] - IPv4 address space with subnet carving
//! - [`Port`] - TCP port
//! - [`Environment`] - `dev` / `staging` / `prod` with replica policy
//! - [`TopologyVariant`] - `simple` (HTTP only) or `full` (TLS, CDN, DNS)
//! - [`ResourceKind`] - taxonomy of graph nodes
//!
//! # Invariants
//!
//! The [`invariants`] module holds the pure rules a finished topology must
//! satisfy; synthesis runs them before returning a graph.

pub mod domain_name;
pub mod environment;
pub mod invariants;
pub mod network;
pub mod resource_kind;

pub use domain_name::{DomainName, DomainNameError, ImageReference, ImageReferenceError};
pub use environment::{CapacityBounds, Environment, EnvironmentError, TopologyVariant};
pub use invariants::{ValidationError, ValidationResult};
pub use network::{
    CidrBlock, IngressRule, IngressSource, ListenerAction, ListenerDescriptor, NetworkError, Port,
    Protocol,
};
pub use resource_kind::{ResourceCategory, ResourceKind};
