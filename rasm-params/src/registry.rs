//! Parameter spec registry - read-only table of specs keyed by id

use crate::spec::{ParameterId, ParameterSpec};
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

/// Errors that can occur when building or querying the registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no parameter spec registered for '{0}'")]
    NotFound(ParameterId),
    #[error("parameter spec '{0}' is already registered")]
    Duplicate(ParameterId),
}

/// Immutable table of parameter specs
///
/// Built once at configuration load and then shared behind an `Arc`;
/// lookups never mutate state.
#[derive(Debug, Default, Clone)]
pub struct ParameterRegistry {
    specs: Vec<ParameterSpec>,
    index: HashMap<ParameterId, usize>,
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry, keeping the first spec for every id
    pub fn from_specs(specs: impl IntoIterator<Item = ParameterSpec>) -> Self {
        let mut registry = Self::new();
        for spec in specs {
            if let Err(err) = registry.insert(spec) {
                warn!(error = %err, "ignoring duplicate parameter spec");
            }
        }
        registry
    }

    /// Add a spec
    pub fn insert(&mut self, spec: ParameterSpec) -> Result<(), RegistryError> {
        if self.index.contains_key(spec.id()) {
            return Err(RegistryError::Duplicate(spec.id().clone()));
        }
        self.index.insert(spec.id().clone(), self.specs.len());
        self.specs.push(spec);
        Ok(())
    }

    /// Look up a spec by id
    pub fn lookup(&self, id: &ParameterId) -> Result<&ParameterSpec, RegistryError> {
        self.get(id).ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    pub fn get(&self, id: &ParameterId) -> Option<&ParameterSpec> {
        self.index.get(id).map(|&i| &self.specs[i])
    }

    pub fn contains(&self, id: &ParameterId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Specs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.specs.iter()
    }
}
