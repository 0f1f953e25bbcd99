// Copyright (c) 2025 - Cowboy AI, Inc.

//! External collaborator adapters
//!
//! Synthesis needs two facts it cannot compute itself: the identity of a
//! secret in the external secret store and the managed DNS zone that owns the
//! site's domain. Both are reached only through the traits below, so graph
//! construction stays free of I/O.
//!
//! # Architecture
//!
//! ```text
//! synthesize ──▶ Collaborators ──┬──▶ dyn SecretStore       (by-name lookup)
//!                                └──▶ dyn HostedZoneLookup  (zone for domain)
//! ```
//!
//! The static implementations hold pre-resolved answers. Callers that talk to
//! a real provider resolve lookups up front and hand the results in.

pub mod dns;
pub mod secrets;

pub use dns::{HostedZone, HostedZoneLookup, StaticHostedZones};
pub use secrets::{SecretReference, SecretStore, StaticSecretCatalog};

/// Borrowed handles to every collaborator synthesis may consult
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub secrets: &'a dyn SecretStore,
    pub zones: &'a dyn HostedZoneLookup,
}

impl<'a> Collaborators<'a> {
    pub fn new(secrets: &'a dyn SecretStore, zones: &'a dyn HostedZoneLookup) -> Self {
        Self { secrets, zones }
    }
}

impl std::fmt::Debug for Collaborators<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("secrets", &self.secrets.name())
            .field("zones", &self.zones.name())
            .finish()
    }
}
