//! Read-only project registry
//!
//! Built once from [`AppConfig`] and shared behind an `Arc`; nothing mutates it
//! after construction, so lookups need no locking.

use std::collections::BTreeMap;

use crate::configure::{AppConfig, ProjectConfig};
use crate::models::TransferError;

#[derive(Debug, Clone, Default)]
pub struct ProjectRegistry {
    projects: BTreeMap<String, ProjectConfig>,
}

impl ProjectRegistry {
    pub fn new(projects: impl IntoIterator<Item = (String, ProjectConfig)>) -> Self {
        Self {
            projects: projects.into_iter().collect(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.registered_projects.clone())
    }

    pub fn get(&self, name: &str) -> Option<&ProjectConfig> {
        self.projects.get(name)
    }

    /// Look up a project, failing with `Forbidden` when it is not registered.
    pub fn resolve(&self, name: &str) -> Result<&ProjectConfig, TransferError> {
        self.get(name)
            .ok_or_else(|| TransferError::Forbidden(name.to_string()))
    }

    /// Registered project names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.projects.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}
