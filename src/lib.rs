// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment topology for the portfolio site
//!
//! Given an environment tag, ambient account/region values and a small
//! settings object, this crate builds the complete declarative resource graph
//! the site is deployed from: network isolation, container compute, load
//! balancing, optional CDN/TLS/DNS, autoscaling and the stack outputs.
//!
//! Synthesis is pure. External lookups (secret names, the hosted zone) go
//! through the traits in [`adapters`]; no cloud API is called.
//!
//! ```rust
//! use portfolio_infrastructure::adapters::{Collaborators, StaticHostedZones, StaticSecretCatalog};
//! use portfolio_infrastructure::config::{AmbientEnvironment, DeploymentSettings, EnvironmentResolver};
//! use portfolio_infrastructure::domain::{DomainName, Environment, TopologyVariant};
//! use portfolio_infrastructure::topology::synthesize;
//!
//! let settings = DeploymentSettings::default()
//!     .with_domain_name("example.com")
//!     .with_docker_image("example/site:latest")
//!     .with_topology(TopologyVariant::Full);
//! let config = EnvironmentResolver::resolve(Environment::Prod, &AmbientEnvironment::default(), &settings)?;
//!
//! let secrets = StaticSecretCatalog::new();
//! let zones = StaticHostedZones::new().with_zone(DomainName::new("example.com")?, "Z123");
//! let stack = synthesize(&config, &Collaborators::new(&secrets, &zones))?;
//!
//! let url = stack.outputs.get("WebsiteURL").and_then(|o| o.value.as_literal());
//! assert_eq!(url.as_deref(), Some("https://example.com"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod graph;
pub mod topology;

// Re-export commonly used types
pub use adapters::{Collaborators, HostedZoneLookup, SecretStore};
pub use config::{AmbientEnvironment, DeploymentSettings, EnvironmentResolver, StackConfiguration};
pub use errors::{SynthesisError, SynthesisResult};
pub use graph::{LogicalId, ResourceGraph, ResourceNode};
pub use topology::{synthesize, synthesize_app, SynthesizedStack, TopologyPlan};
