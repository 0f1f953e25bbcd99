// Copyright (c) 2025 - Cowboy AI, Inc.
//! Synthesis Error Tests
//!
//! Every failure names the resource that could not be built, and no partial
//! stack is returned.

mod fixtures;

use pretty_assertions::assert_eq;
use test_case::test_case;

use fixtures::*;
use portfolio_infrastructure::adapters::StaticSecretCatalog;
use portfolio_infrastructure::config::{
    AmbientEnvironment, DeploymentSettings, EnvironmentResolver,
};
use portfolio_infrastructure::domain::{Environment, TopologyVariant};
use portfolio_infrastructure::topology::{synthesize, synthesize_app, StaticAttributes};
use portfolio_infrastructure::{Collaborators, SynthesisError};

#[test]
fn test_missing_hosted_zone_is_dependency_error() {
    init_tracing();
    let collaborators = TestCollaborators::empty();
    let config = resolve(Environment::Prod, TopologyVariant::Full);

    let err = synthesize(&config, &collaborators.collaborators()).unwrap_err();
    assert_eq!(
        err,
        SynthesisError::dependency("HostedZone", TEST_DOMAIN)
    );
    assert_eq!(err.resource(), Some("HostedZone"));
}

#[test]
fn test_simple_topology_needs_no_hosted_zone() {
    let collaborators = TestCollaborators::empty();
    let config = resolve(Environment::Dev, TopologyVariant::Simple);

    assert!(synthesize(&config, &collaborators.collaborators()).is_ok());
}

#[test]
fn test_unknown_secret_names_container_secret() {
    let settings = settings(TopologyVariant::Simple)
        .with_secret("NEXT_PUBLIC_SUPABASE_URL", "missing/secret");
    let config = EnvironmentResolver::resolve(Environment::Staging, &ambient(), &settings)
        .expect("settings resolve");
    let zones = hosted_zones();
    let secrets = secret_catalog();

    let err = synthesize(&config, &Collaborators::new(&secrets, &zones)).unwrap_err();
    assert_eq!(err.resource(), Some("ContainerSecret<NEXT_PUBLIC_SUPABASE_URL>"));
    assert!(matches!(err, SynthesisError::Configuration { .. }));
    assert!(err.to_string().contains("missing/secret"));
}

#[test_case("" ; "empty domain")]
#[test_case("   " ; "blank domain")]
fn test_missing_domain_is_configuration_error(domain: &str) {
    let settings = settings(TopologyVariant::Simple).with_domain_name(domain);

    let err = EnvironmentResolver::resolve(Environment::Dev, &ambient(), &settings).unwrap_err();
    assert_eq!(
        err,
        SynthesisError::configuration(EnvironmentResolver::RESOURCE, "domain name is required")
    );
}

#[test_case("not a domain" ; "whitespace inside")]
#[test_case("-example.com" ; "leading hyphen label")]
fn test_invalid_domain_is_configuration_error(domain: &str) {
    let settings = settings(TopologyVariant::Simple).with_domain_name(domain);

    let err = EnvironmentResolver::resolve(Environment::Dev, &ambient(), &settings).unwrap_err();
    assert_eq!(err.resource(), Some(EnvironmentResolver::RESOURCE));
}

#[test]
fn test_unknown_environment_tag() {
    let err = EnvironmentResolver::resolve_tag(
        "qa",
        &AmbientEnvironment::default(),
        &settings(TopologyVariant::Simple),
    )
    .unwrap_err();
    assert_eq!(err.resource(), Some("environment"));
}

#[test]
fn test_duplicate_secret_variable() {
    let settings = settings(TopologyVariant::Simple)
        .with_secret("API_URL", "one")
        .with_secret("API_URL", "two");

    let err = EnvironmentResolver::resolve(Environment::Dev, &ambient(), &settings).unwrap_err();
    assert!(matches!(err, SynthesisError::Configuration { .. }));
}

#[test]
fn test_synthesize_app_propagates_first_failure() {
    let secrets = StaticSecretCatalog::new();
    let zones = hosted_zones();

    let err = synthesize_app(
        &ambient(),
        &DeploymentSettings::portfolio(),
        &Collaborators::new(&secrets, &zones),
    )
    .unwrap_err();
    assert_eq!(err.resource(), Some("ContainerSecret<NEXT_PUBLIC_SUPABASE_URL>"));
}

#[test]
fn test_unresolved_output_attribute() {
    let stack = synthesize_for(Environment::Dev, TopologyVariant::Simple)
        .expect("fixture stack synthesizes");

    let err = stack.outputs.resolve(&StaticAttributes::new()).unwrap_err();
    assert_eq!(
        err,
        SynthesisError::dependency("PortfolioALB", "PortfolioALB.DNSName")
    );
}

#[test]
fn test_errors_display_resource() {
    let err = SynthesisError::dependency("HostedZone", "example.com");
    assert_eq!(
        err.to_string(),
        "Dependency resolution error: HostedZone requires example.com, which could not be resolved"
    );
}
