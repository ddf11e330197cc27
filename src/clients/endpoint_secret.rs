use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};
use crate::models::{Secret, SecretKeySelector};
use crate::storage::ClusterStore;

/// Key holding the minted token, whatever key the reference names.
pub const TOKEN_KEY: &str = "bearer";

/// Key holding the Argo CD server URL the token was minted against.
pub const TARGET_KEY: &str = "target";

const LABELS: [(&str, &str); 5] = [
    ("app.kubernetes.io/created-by", "krateo"),
    ("category", "delivery"),
    ("group", "endpoint"),
    ("icon", "fa-solid_fa-truck"),
    ("type", "argocd"),
];

pub struct CreateSecretOpts<'a> {
    pub token: &'a SecretString,
    pub target_url: &'a str,
    pub secret_ref: Option<&'a SecretKeySelector>,
}

fn require_ref(secret_ref: Option<&SecretKeySelector>) -> Result<&SecretKeySelector> {
    match secret_ref {
        Some(r) if !r.name.trim().is_empty() => Ok(r),
        _ => Err(Error::NoSecretReference),
    }
}

/// Read the stored token. A missing secret yields an empty string.
pub async fn get_endpoint_secret(
    store: &dyn ClusterStore,
    secret_ref: Option<&SecretKeySelector>,
) -> Result<String> {
    let secret_ref = require_ref(secret_ref)?;

    match store.get_secret(&secret_ref.namespace, &secret_ref.name).await {
        Ok(secret) => Ok(secret.get(TOKEN_KEY).unwrap_or_default().to_string()),
        Err(err) if err.is_not_found() => Ok(String::new()),
        Err(source) => Err(Error::SecretFetchFailed {
            namespace: secret_ref.namespace.clone(),
            name: secret_ref.name.clone(),
            source,
        }),
    }
}

/// Create the endpoint secret. Fails if it already exists.
pub async fn create_endpoint_secret(store: &dyn ClusterStore, opts: CreateSecretOpts<'_>) -> Result<()> {
    let secret_ref = require_ref(opts.secret_ref)?;

    let mut secret = Secret::new(&secret_ref.namespace, &secret_ref.name)
        .with_entry(TOKEN_KEY, opts.token.expose_secret())
        .with_entry(TARGET_KEY, opts.target_url);
    for (key, value) in LABELS {
        secret = secret.with_label(key, value);
    }

    store
        .create_secret(&secret)
        .await
        .map_err(|source| Error::SecretCreateFailed {
            namespace: secret_ref.namespace.clone(),
            name: secret_ref.name.clone(),
            source,
        })
}

/// Delete the endpoint secret. Deleting an absent secret surfaces the
/// store's "not found" (see [`Error::is_not_found`]).
pub async fn delete_endpoint_secret(
    store: &dyn ClusterStore,
    secret_ref: Option<&SecretKeySelector>,
) -> Result<()> {
    let secret_ref = require_ref(secret_ref)?;

    store
        .delete_secret(&secret_ref.namespace, &secret_ref.name)
        .await
        .map_err(|source| Error::SecretDeleteFailed {
            namespace: secret_ref.namespace.clone(),
            name: secret_ref.name.clone(),
            source,
        })
}
