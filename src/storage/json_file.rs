use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::models::{Endpoint, EndpointStatus, ProviderConfig, Secret};

use super::{is_path_safe, namespace_or_default, ClusterStore, StoreError};

/// JSON file-based store.
///
/// Directory structure:
/// ```text
/// data/
///   providerconfigs/
///     {name}.json
///   endpoints/
///     {name}.json
///   secrets/
///     {namespace}/
///       {name}.json
/// ```
pub struct JsonFileStore {
    base_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn provider_configs_dir(&self) -> PathBuf {
        self.base_path.join("providerconfigs")
    }

    fn endpoints_dir(&self) -> PathBuf {
        self.base_path.join("endpoints")
    }

    fn secrets_dir(&self) -> PathBuf {
        self.base_path.join("secrets")
    }

    fn provider_config_file(&self, name: &str) -> Result<PathBuf, StoreError> {
        Ok(self.provider_configs_dir().join(json_file_name(name)?))
    }

    fn endpoint_file(&self, name: &str) -> Result<PathBuf, StoreError> {
        Ok(self.endpoints_dir().join(json_file_name(name)?))
    }

    fn secret_file(&self, namespace: &str, name: &str) -> Result<PathBuf, StoreError> {
        let namespace = namespace_or_default(namespace);
        if !is_path_safe(namespace) {
            return Err(StoreError::InvalidName(namespace.to_string()));
        }
        Ok(self.secrets_dir().join(namespace).join(json_file_name(name)?))
    }

    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create directory")?;
        }
        Ok(())
    }

    async fn read_json<T: for<'de> serde::Deserialize<'de>>(
        &self,
        path: &Path,
    ) -> Result<Option<T>> {
        match fs::read_to_string(path).await {
            Ok(content) => {
                let value = serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse JSON from {:?}", path))?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context("Failed to read file"),
        }
    }

    async fn write_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        self.ensure_dir(path).await?;
        let content = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
        fs::write(path, content)
            .await
            .context("Failed to write file")?;
        Ok(())
    }

    /// Write a file only if it does not already exist.
    ///
    /// The content is written to a temporary sibling first and then linked
    /// into place, so `path` is either absent or complete. Returns
    /// `Ok(false)` when the file is already there.
    async fn create_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<bool> {
        self.ensure_dir(path).await?;
        let content = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;

        let tmp = temp_path(path);
        if let Err(e) = fs::write(&tmp, content).await {
            remove_temp(&tmp).await;
            return Err(e).context("Failed to write file");
        }

        let linked = fs::hard_link(&tmp, path).await;
        remove_temp(&tmp).await;

        match linked {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e).context("Failed to create file"),
        }
    }

    async fn list_json_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let mut entries = match fs::read_dir(path).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(e).context("Failed to read directory"),
        };

        while let Some(entry) = entries.next_entry().await.context("Failed to read entry")? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Ok(file_type) = entry.file_type().await {
                if file_type.is_file() {
                    files.push(path);
                }
            }
        }

        files.sort();
        Ok(files)
    }

    /// Seed a provider config file.
    pub async fn save_provider_config(&self, pc: &ProviderConfig) -> Result<(), StoreError> {
        let path = self.provider_config_file(&pc.metadata.name)?;
        Ok(self.write_json(&path, pc).await?)
    }

    /// Seed or replace an endpoint file, status included.
    pub async fn save_endpoint(&self, endpoint: &Endpoint) -> Result<(), StoreError> {
        let path = self.endpoint_file(&endpoint.metadata.name)?;
        Ok(self.write_json(&path, endpoint).await?)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.tmp", Uuid::new_v4()));
    path.with_file_name(name)
}

async fn remove_temp(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove temporary file");
        }
    }
}

fn json_file_name(name: &str) -> Result<String, StoreError> {
    if !is_path_safe(name) {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(format!("{name}.json"))
}

#[async_trait]
impl ClusterStore for JsonFileStore {
    async fn get_provider_config(&self, name: &str) -> Result<ProviderConfig, StoreError> {
        let path = self.provider_config_file(name)?;
        self.read_json(&path)
            .await?
            .ok_or_else(|| StoreError::not_found("providerconfig", "", name))
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, StoreError> {
        let path = self.secret_file(namespace, name)?;
        self.read_json(&path)
            .await?
            .ok_or_else(|| StoreError::not_found("secret", namespace, name))
    }

    async fn create_secret(&self, secret: &Secret) -> Result<(), StoreError> {
        let meta = &secret.metadata;
        let path = self.secret_file(&meta.namespace, &meta.name)?;
        if self.create_json(&path, secret).await? {
            Ok(())
        } else {
            Err(StoreError::already_exists("secret", &meta.namespace, &meta.name))
        }
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let path = self.secret_file(namespace, name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::not_found("secret", namespace, name))
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("Failed to delete secret file {path:?}"))
                .into()),
        }
    }

    async fn list_endpoints(&self) -> Result<Vec<Endpoint>, StoreError> {
        let files = self.list_json_files(&self.endpoints_dir()).await?;
        let mut endpoints = Vec::new();

        for path in files {
            match self.read_json::<Endpoint>(&path).await {
                Ok(Some(endpoint)) => endpoints.push(endpoint),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Skipping unreadable endpoint");
                }
            }
        }

        Ok(endpoints)
    }

    async fn save_endpoint_status(
        &self,
        name: &str,
        status: &EndpointStatus,
    ) -> Result<(), StoreError> {
        let path = self.endpoint_file(name)?;
        let mut endpoint: Endpoint = self
            .read_json(&path)
            .await?
            .ok_or_else(|| StoreError::not_found("endpoint", "", name))?;
        endpoint.status = status.clone();
        Ok(self.write_json(&path, &endpoint).await?)
    }
}
