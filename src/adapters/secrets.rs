// Copyright (c) 2025 - Cowboy AI, Inc.

//! Secret store lookup
//!
//! Secrets are bound to the container by reference. The store answers "does a
//! secret with this name exist, and what is its identifier"; plaintext values
//! never cross this boundary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a secret in the external store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretReference {
    /// Logical secret name, e.g. `lks0426-portfolio/supabase-url`
    pub name: String,
    /// Provider identifier the container runtime resolves at start-up
    pub arn: String,
}

/// By-name secret lookup
pub trait SecretStore {
    /// Resolve a secret by name, `None` if the store has no such secret
    fn resolve(&self, name: &str) -> Option<SecretReference>;

    /// Adapter name for diagnostics
    fn name(&self) -> &str {
        "secret-store"
    }
}

/// In-memory catalog of known secrets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticSecretCatalog {
    secrets: BTreeMap<String, String>,
}

impl StaticSecretCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a secret name and its identifier
    pub fn with_secret(mut self, name: impl Into<String>, arn: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), arn.into());
        self
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

impl SecretStore for StaticSecretCatalog {
    fn resolve(&self, name: &str) -> Option<SecretReference> {
        self.secrets.get(name).map(|arn| SecretReference {
            name: name.to_string(),
            arn: arn.clone(),
        })
    }

    fn name(&self) -> &str {
        "static-secret-catalog"
    }
}
