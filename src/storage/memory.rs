//! In-memory store for tests and embedding.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::models::{Endpoint, EndpointStatus, ProviderConfig, Secret};

use super::{namespace_or_default, ClusterStore, StoreError};

type SecretKey = (String, String);

pub struct MemoryStore {
    provider_configs: Mutex<HashMap<String, ProviderConfig>>,
    endpoints: Mutex<HashMap<String, Endpoint>>,
    secrets: Mutex<HashMap<SecretKey, Secret>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            provider_configs: Mutex::new(HashMap::new()),
            endpoints: Mutex::new(HashMap::new()),
            secrets: Mutex::new(HashMap::new()),
        }
    }

    pub async fn put_provider_config(&self, pc: ProviderConfig) {
        let mut pcs = self.provider_configs.lock().await;
        pcs.insert(pc.metadata.name.clone(), pc);
    }

    pub async fn put_endpoint(&self, endpoint: Endpoint) {
        let mut endpoints = self.endpoints.lock().await;
        endpoints.insert(endpoint.metadata.name.clone(), endpoint);
    }

    /// Insert or replace a secret, bypassing create-only semantics.
    pub async fn put_secret(&self, secret: Secret) {
        let mut secrets = self.secrets.lock().await;
        secrets.insert(secret_key(&secret.metadata.namespace, &secret.metadata.name), secret);
    }

    pub async fn endpoint(&self, name: &str) -> Option<Endpoint> {
        self.endpoints.lock().await.get(name).cloned()
    }

    pub async fn secret_count(&self) -> usize {
        self.secrets.lock().await.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn secret_key(namespace: &str, name: &str) -> SecretKey {
    (namespace_or_default(namespace).to_string(), name.to_string())
}

#[async_trait]
impl ClusterStore for MemoryStore {
    async fn get_provider_config(&self, name: &str) -> Result<ProviderConfig, StoreError> {
        let pcs = self.provider_configs.lock().await;
        pcs.get(name)
            .cloned()
            .ok_or_else(|| StoreError::not_found("providerconfig", "", name))
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, StoreError> {
        let secrets = self.secrets.lock().await;
        secrets
            .get(&secret_key(namespace, name))
            .cloned()
            .ok_or_else(|| StoreError::not_found("secret", namespace, name))
    }

    async fn create_secret(&self, secret: &Secret) -> Result<(), StoreError> {
        let meta = &secret.metadata;
        let mut secrets = self.secrets.lock().await;
        let key = secret_key(&meta.namespace, &meta.name);
        if secrets.contains_key(&key) {
            return Err(StoreError::already_exists("secret", &meta.namespace, &meta.name));
        }
        secrets.insert(key, secret.clone());
        Ok(())
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let mut secrets = self.secrets.lock().await;
        match secrets.remove(&secret_key(namespace, name)) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found("secret", namespace, name)),
        }
    }

    async fn list_endpoints(&self) -> Result<Vec<Endpoint>, StoreError> {
        let endpoints = self.endpoints.lock().await;
        let mut list: Vec<Endpoint> = endpoints.values().cloned().collect();
        list.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
        Ok(list)
    }

    async fn save_endpoint_status(
        &self,
        name: &str,
        status: &EndpointStatus,
    ) -> Result<(), StoreError> {
        let mut endpoints = self.endpoints.lock().await;
        match endpoints.get_mut(name) {
            Some(endpoint) => {
                endpoint.status = status.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("endpoint", "", name)),
        }
    }
}
