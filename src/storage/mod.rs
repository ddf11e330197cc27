//! Cluster-state store contract.
//!
//! The controller only needs a handful of operations against the store:
//! read the provider config, get/create/delete secrets, and read/write
//! endpoints. "Not found" and "already exists" are distinct outcomes so the
//! layers above can tell an absent secret from a broken store.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::models::{Endpoint, EndpointStatus, ProviderConfig, Secret};

/// Namespace used when a reference leaves it empty.
pub const DEFAULT_NAMESPACE: &str = "default";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("invalid name {0:?}: names must be a single path segment")]
    InvalidName(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn not_found(kind: &'static str, namespace: &str, name: &str) -> Self {
        StoreError::NotFound {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub fn already_exists(kind: &'static str, namespace: &str, name: &str) -> Self {
        StoreError::AlreadyExists {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }
}

/// Storage for provider configs, endpoints and secrets.
#[async_trait]
pub trait ClusterStore: Send + Sync {
    // Provider configs (cluster scoped)
    async fn get_provider_config(&self, name: &str) -> Result<ProviderConfig, StoreError>;

    // Secrets (namespaced)
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, StoreError>;

    /// Fails with [`StoreError::AlreadyExists`]; never overwrites.
    async fn create_secret(&self, secret: &Secret) -> Result<(), StoreError>;

    /// Fails with [`StoreError::NotFound`] when there is nothing to delete.
    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<(), StoreError>;

    // Endpoints (cluster scoped)
    async fn list_endpoints(&self) -> Result<Vec<Endpoint>, StoreError>;
    async fn save_endpoint_status(
        &self,
        name: &str,
        status: &EndpointStatus,
    ) -> Result<(), StoreError>;
}

pub(crate) fn namespace_or_default(namespace: &str) -> &str {
    let namespace = namespace.trim();
    if namespace.is_empty() {
        DEFAULT_NAMESPACE
    } else {
        namespace
    }
}

/// A name usable as a single file path segment.
pub(crate) fn is_path_safe(value: &str) -> bool {
    if value.is_empty() || value == "." || value == ".." {
        return false;
    }
    !value.chars().any(|c| c == '/' || c == '\\' || c == '\0')
}
