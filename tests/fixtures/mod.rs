// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for portfolio-infrastructure
//!
//! Deterministic inputs shared by the integration suites: one domain, one
//! hosted zone, one account and a secret catalog holding the portfolio's
//! bound secrets.
//!
//! # Design Principles
//! - Fixtures are the only place that builds settings and collaborators
//! - Nothing reads the real process environment

#![allow(dead_code)]

use portfolio_infrastructure::adapters::{Collaborators, StaticHostedZones, StaticSecretCatalog};
use portfolio_infrastructure::config::{
    AmbientEnvironment, DeploymentSettings, EnvironmentResolver, StackConfiguration,
};
use portfolio_infrastructure::domain::{DomainName, Environment, TopologyVariant};
use portfolio_infrastructure::topology::{synthesize, SynthesizedStack};
use portfolio_infrastructure::SynthesisResult;

pub const TEST_DOMAIN: &str = "example.com";
pub const TEST_ZONE_ID: &str = "Z0123456789EXAMPLE";
pub const TEST_IMAGE: &str = "example/portfolio:1.0.0";
pub const TEST_ACCOUNT: &str = "123456789012";
pub const TEST_ALB_DNS: &str = "abc.elb.amazonaws.com";

pub const PORTFOLIO_ZONE_ID: &str = "Z0PORTFOLIO";

/// Route test logs through the test writer; `RUST_LOG=debug` shows builder output
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn ambient() -> AmbientEnvironment {
    AmbientEnvironment::default().with_account(TEST_ACCOUNT)
}

pub fn settings(variant: TopologyVariant) -> DeploymentSettings {
    DeploymentSettings::default()
        .with_domain_name(TEST_DOMAIN)
        .with_docker_image(TEST_IMAGE)
        .with_topology(variant)
}

pub fn resolve(environment: Environment, variant: TopologyVariant) -> StackConfiguration {
    EnvironmentResolver::resolve(environment, &ambient(), &settings(variant))
        .expect("fixture settings resolve")
}

fn secret_arn(name: &str) -> String {
    format!("arn:aws:secretsmanager:us-east-1:{TEST_ACCOUNT}:secret:{name}")
}

/// Catalog holding the portfolio's two bound secrets
pub fn secret_catalog() -> StaticSecretCatalog {
    StaticSecretCatalog::new()
        .with_secret(
            "lks0426-portfolio/supabase-url",
            secret_arn("lks0426-portfolio/supabase-url"),
        )
        .with_secret(
            "lks0426-portfolio/supabase-anon-key",
            secret_arn("lks0426-portfolio/supabase-anon-key"),
        )
}

/// Zones for the test domain and the portfolio domain
pub fn hosted_zones() -> StaticHostedZones {
    StaticHostedZones::new()
        .with_zone(
            DomainName::new(TEST_DOMAIN).expect("valid fixture domain"),
            TEST_ZONE_ID,
        )
        .with_zone(
            DomainName::new("lks0426.com").expect("valid fixture domain"),
            PORTFOLIO_ZONE_ID,
        )
}

/// Owned collaborators that hand out borrowed [`Collaborators`]
pub struct TestCollaborators {
    pub secrets: StaticSecretCatalog,
    pub zones: StaticHostedZones,
}

impl TestCollaborators {
    pub fn new() -> Self {
        Self {
            secrets: secret_catalog(),
            zones: hosted_zones(),
        }
    }

    pub fn empty() -> Self {
        Self {
            secrets: StaticSecretCatalog::new(),
            zones: StaticHostedZones::new(),
        }
    }

    pub fn collaborators(&self) -> Collaborators<'_> {
        Collaborators::new(&self.secrets, &self.zones)
    }
}

/// Synthesize the fixture configuration for one environment and variant
pub fn synthesize_for(
    environment: Environment,
    variant: TopologyVariant,
) -> SynthesisResult<SynthesizedStack> {
    let collaborators = TestCollaborators::new();
    synthesize(&resolve(environment, variant), &collaborators.collaborators())
}
