//! Environment data model
//!
//! - `EnvName`: a validated environment name
//! - `Target`: the identity the store deletes by, only handed out by the store
//! - `EnvironmentInfo`: a loaded environment plus its optional resource snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::store::{EnvironmentStore, StoreError};

const MAX_NAME_LEN: usize = 100;

/// A validated environment name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnvName(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("name is empty")]
    Empty,
    #[error("name is longer than {MAX_NAME_LEN} characters")]
    TooLong,
    #[error("name may not start with '.'")]
    LeadingDot,
    #[error("character '{0}' is not allowed; use letters, digits, '-', '_' or '.'")]
    InvalidChar(char),
}

impl EnvName {
    pub fn parse(name: &str) -> Result<Self, NameError> {
        if name.is_empty() {
            return Err(NameError::Empty);
        }
        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(NameError::InvalidChar(c));
        }
        // ASCII only from here, so bytes and characters agree
        if name.len() > MAX_NAME_LEN {
            return Err(NameError::TooLong);
        }
        if name.starts_with('.') {
            return Err(NameError::LeadingDot);
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnvName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable identity of a stored environment.
///
/// Built only by a store for an environment it has loaded, so a `Target`
/// always names something that existed at resolution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    name: EnvName,
}

impl Target {
    pub(crate) fn new(name: EnvName) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &EnvName {
        &self.name
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.name, f)
    }
}

/// A deployed resource as recorded in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub urn: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

/// Point-in-time record of an environment's resources, in dependency order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "Utc::now")]
    pub taken_at: DateTime<Utc>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("resource #{0} has an empty URN")]
    EmptyUrn(usize),
    #[error("duplicate resource URN '{0}'")]
    DuplicateUrn(String),
    #[error("resource '{urn}' depends on '{dependency}', which is not recorded before it")]
    DanglingDependency { urn: String, dependency: String },
}

impl Snapshot {
    #[cfg(test)]
    pub fn new(resources: Vec<Resource>) -> Self {
        Self {
            taken_at: Utc::now(),
            resources,
        }
    }

    /// Check that URNs are unique and that every dependency points at an
    /// earlier resource.
    pub fn verify(&self) -> Result<(), SnapshotError> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(self.resources.len());
        for (index, resource) in self.resources.iter().enumerate() {
            if resource.urn.is_empty() {
                return Err(SnapshotError::EmptyUrn(index));
            }
            for dependency in &resource.dependencies {
                if !seen.contains(dependency.as_str()) {
                    return Err(SnapshotError::DanglingDependency {
                        urn: resource.urn.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
            if !seen.insert(&resource.urn) {
                return Err(SnapshotError::DuplicateUrn(resource.urn.clone()));
            }
        }
        Ok(())
    }
}

/// An environment as loaded from the store
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentInfo {
    pub target: Target,
    pub created_at: DateTime<Utc>,
    /// `None` when nothing was ever deployed, or everything was destroyed
    pub snapshot: Option<Snapshot>,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid environment name '{name}'")]
    InvalidName {
        name: String,
        #[source]
        source: NameError,
    },
    #[error("environment '{0}' not found")]
    NotFound(EnvName),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EnvironmentInfo {
    /// Validate `name` and load the matching environment from `store`.
    pub fn resolve<S>(store: &S, name: &str) -> Result<Self, ResolveError>
    where
        S: EnvironmentStore + ?Sized,
    {
        let env_name = EnvName::parse(name).map_err(|source| ResolveError::InvalidName {
            name: name.to_string(),
            source,
        })?;

        tracing::debug!(environment = %env_name, "resolving environment");

        store
            .load_environment(&env_name)?
            .ok_or(ResolveError::NotFound(env_name))
    }

    pub fn name(&self) -> &EnvName {
        self.target.name()
    }

    pub fn resource_count(&self) -> usize {
        self.snapshot.as_ref().map_or(0, |s| s.resources.len())
    }

    /// True only for a present snapshot with at least one resource.
    pub fn has_resources(&self) -> bool {
        self.resource_count() > 0
    }
}
