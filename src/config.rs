// Copyright (c) 2025 - Cowboy AI, Inc.

//! Deployment configuration
//!
//! Turns an environment tag, the ambient account/region of the invoking
//! process and a small settings object into an immutable
//! [`StackConfiguration`]. Every builder reads from that one value.
//!
//! # Example
//!
//! ```rust
//! use portfolio_infrastructure::config::{AmbientEnvironment, DeploymentSettings, EnvironmentResolver};
//! use portfolio_infrastructure::domain::Environment;
//!
//! let settings = DeploymentSettings::default()
//!     .with_domain_name("example.com")
//!     .with_docker_image("example/site:latest");
//!
//! let config = EnvironmentResolver::resolve(
//!     Environment::Prod,
//!     &AmbientEnvironment::default(),
//!     &settings,
//! )
//! .unwrap();
//!
//! assert_eq!(config.region(), "us-east-1");
//! assert_eq!(config.resource_name(), "portfolio-prod");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

use crate::domain::{DomainName, Environment, ImageReference, TopologyVariant};
use crate::errors::{SynthesisError, SynthesisResult};

/// Region used when the invoking process does not name one
pub const DEFAULT_REGION: &str = "us-east-1";

/// Account and region taken from the invoking process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbientEnvironment {
    pub account: Option<String>,
    pub region: Option<String>,
}

impl AmbientEnvironment {
    /// Variable holding the target account
    pub const ACCOUNT_VAR: &'static str = "CDK_DEFAULT_ACCOUNT";

    /// Variable holding the target region
    pub const REGION_VAR: &'static str = "CDK_DEFAULT_REGION";

    /// Create from explicit values; empty strings count as absent
    pub fn new(account: Option<String>, region: Option<String>) -> Self {
        Self {
            account: account.filter(|a| !a.trim().is_empty()),
            region: region.filter(|r| !r.trim().is_empty()),
        }
    }

    /// Read account and region from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read account and region through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self::new(lookup(Self::ACCOUNT_VAR), lookup(Self::REGION_VAR))
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

/// Binds a container environment variable to a secret in the external store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretBinding {
    /// Environment variable the container sees
    pub variable: String,
    /// Name of the secret in the store
    pub secret_name: String,
}

impl SecretBinding {
    pub fn new(variable: impl Into<String>, secret_name: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            secret_name: secret_name.into(),
        }
    }
}

/// User-supplied deployment settings
///
/// Deserializable from JSON; missing fields take their [`Default`] values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeploymentSettings {
    /// Project slug used in resource names and tags
    pub project: String,

    /// Public domain the site is served under
    pub domain_name: String,

    /// Container image reference
    pub docker_image: String,

    /// Which topology to build
    pub topology: TopologyVariant,

    /// Value of the `Owner` tag
    pub owner: Option<String>,

    /// Secrets exposed to the container as environment variables
    pub secrets: Vec<SecretBinding>,
}

impl Default for DeploymentSettings {
    fn default() -> Self {
        Self {
            project: "portfolio".to_string(),
            domain_name: String::new(),
            docker_image: String::new(),
            topology: TopologyVariant::default(),
            owner: None,
            secrets: Vec::new(),
        }
    }
}

impl DeploymentSettings {
    /// Settings the portfolio site is deployed with
    pub fn portfolio() -> Self {
        Self {
            project: "lks0426-portfolio".to_string(),
            domain_name: "lks0426.com".to_string(),
            docker_image: "lks0426/lks0426-portfolio:latest".to_string(),
            topology: TopologyVariant::Full,
            owner: Some("lks0426".to_string()),
            secrets: vec![
                SecretBinding::new("NEXT_PUBLIC_SUPABASE_URL", "lks0426-portfolio/supabase-url"),
                SecretBinding::new(
                    "NEXT_PUBLIC_SUPABASE_ANON_KEY",
                    "lks0426-portfolio/supabase-anon-key",
                ),
            ],
        }
    }

    /// Parse settings from a JSON document
    pub fn from_json(json: &str) -> SynthesisResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    pub fn with_domain_name(mut self, domain_name: impl Into<String>) -> Self {
        self.domain_name = domain_name.into();
        self
    }

    pub fn with_docker_image(mut self, docker_image: impl Into<String>) -> Self {
        self.docker_image = docker_image.into();
        self
    }

    pub fn with_topology(mut self, topology: TopologyVariant) -> Self {
        self.topology = topology;
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Add a secret binding
    pub fn with_secret(
        mut self,
        variable: impl Into<String>,
        secret_name: impl Into<String>,
    ) -> Self {
        self.secrets.push(SecretBinding::new(variable, secret_name));
        self
    }
}

/// Tags applied to every resource in a stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackTags {
    pub environment: Environment,
    pub project: String,
    pub owner: Option<String>,
    pub cost_center: String,
}

impl StackTags {
    /// Tags as provider key/value pairs
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::new();
        tags.insert("Environment".to_string(), self.environment.to_string());
        tags.insert("Project".to_string(), self.project.clone());
        tags.insert("CostCenter".to_string(), self.cost_center.clone());
        if let Some(owner) = &self.owner {
            tags.insert("Owner".to_string(), owner.clone());
        }
        tags
    }
}

/// Immutable description of one deployment target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackConfiguration {
    project: String,
    domain_name: DomainName,
    image: ImageReference,
    environment: Environment,
    topology: TopologyVariant,
    account: Option<String>,
    region: String,
    secrets: Vec<SecretBinding>,
    tags: StackTags,
}

impl StackConfiguration {
    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn domain_name(&self) -> &DomainName {
        &self.domain_name
    }

    pub fn image(&self) -> &ImageReference {
        &self.image
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn topology(&self) -> TopologyVariant {
        self.topology
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn secrets(&self) -> &[SecretBinding] {
        &self.secrets
    }

    pub fn tags(&self) -> &StackTags {
        &self.tags
    }

    /// `{project}-{environment}`, shared by cluster, service, load balancer,
    /// task family and log group
    pub fn resource_name(&self) -> String {
        format!("{}-{}", self.project, self.environment)
    }

    /// Deployable stack name, e.g. `Lks0426-Portfolio-Prod`
    pub fn stack_name(&self) -> String {
        let mut segments: Vec<String> = self.project.split('-').map(capitalize).collect();
        segments.push(self.environment.display_name().to_string());
        segments.join("-")
    }

    /// Human-readable stack description
    pub fn description(&self) -> String {
        let project: Vec<String> = self.project.split('-').map(capitalize).collect();
        format!(
            "{} {} Infrastructure",
            project.join(" "),
            capitalize(self.environment.cost_center())
        )
    }
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Builds a [`StackConfiguration`] from its raw inputs
pub struct EnvironmentResolver;

impl EnvironmentResolver {
    /// Resource name used in configuration errors
    pub const RESOURCE: &'static str = "StackConfiguration";

    /// Resolve a configuration for `environment`
    ///
    /// # Errors
    /// [`SynthesisError::Configuration`] when the domain is missing or invalid,
    /// the image reference is unusable, the project slug is malformed, or two
    /// secret bindings target the same variable.
    pub fn resolve(
        environment: Environment,
        ambient: &AmbientEnvironment,
        settings: &DeploymentSettings,
    ) -> SynthesisResult<StackConfiguration> {
        let project = settings.project.trim().to_ascii_lowercase();
        if project.is_empty()
            || !project.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            || project.starts_with('-')
            || project.ends_with('-')
        {
            return Err(SynthesisError::configuration(
                Self::RESOURCE,
                format!("invalid project slug {:?}", settings.project),
            ));
        }

        if settings.domain_name.trim().is_empty() {
            return Err(SynthesisError::configuration(
                Self::RESOURCE,
                "domain name is required",
            ));
        }
        let domain_name = DomainName::new(&settings.domain_name).map_err(|e| {
            SynthesisError::configuration(Self::RESOURCE, format!("invalid domain name: {e}"))
        })?;

        if settings.topology.has_edge() {
            DomainName::new(domain_name.www()).map_err(|e| {
                SynthesisError::configuration(Self::RESOURCE, format!("invalid www alias: {e}"))
            })?;
        }

        let image = ImageReference::new(&settings.docker_image)
            .map_err(|e| SynthesisError::configuration(Self::RESOURCE, e.to_string()))?;

        let mut variables = BTreeSet::new();
        for binding in &settings.secrets {
            if binding.variable.trim().is_empty() || binding.secret_name.trim().is_empty() {
                return Err(SynthesisError::configuration(
                    Self::RESOURCE,
                    "secret bindings need both a variable and a secret name",
                ));
            }
            if !variables.insert(binding.variable.as_str()) {
                return Err(SynthesisError::configuration(
                    Self::RESOURCE,
                    format!("secret variable {} is bound twice", binding.variable),
                ));
            }
        }

        let region = match &ambient.region {
            Some(region) => region.clone(),
            None => {
                warn!(
                    environment = %environment,
                    default = DEFAULT_REGION,
                    "No region in ambient environment, using default"
                );
                DEFAULT_REGION.to_string()
            }
        };

        let tags = StackTags {
            environment,
            project: project.clone(),
            owner: settings.owner.clone(),
            cost_center: environment.cost_center().to_string(),
        };

        let config = StackConfiguration {
            project,
            domain_name,
            image,
            environment,
            topology: settings.topology,
            account: ambient.account.clone(),
            region,
            secrets: settings.secrets.clone(),
            tags,
        };

        info!(
            stack = %config.stack_name(),
            region = %config.region,
            topology = %config.topology,
            "Resolved stack configuration"
        );

        Ok(config)
    }

    /// Resolve from a textual environment tag such as `prod`
    pub fn resolve_tag(
        tag: &str,
        ambient: &AmbientEnvironment,
        settings: &DeploymentSettings,
    ) -> SynthesisResult<StackConfiguration> {
        let environment: Environment = tag
            .parse()
            .map_err(|e: crate::domain::EnvironmentError| {
                SynthesisError::configuration("environment", e.to_string())
            })?;
        Self::resolve(environment, ambient, settings)
    }
}
