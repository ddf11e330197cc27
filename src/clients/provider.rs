use std::time::Duration;

use secrecy::SecretString;

use crate::accounts::{self, Session, TokenProviderOptions, DEFAULT_USER_AGENT};
use crate::error::{Error, Result};
use crate::models::{CredentialsSource, Endpoint, ProviderConfig, SecretKeySelector};
use crate::storage::ClusterStore;

/// Secret the Argo CD installer writes the initial admin password to.
pub const ARGOCD_INITIAL_ADMIN_SECRET: &str = "argocd-initial-admin-secret";

/// Standard key for the password of a basic-auth secret.
pub const BASIC_AUTH_PASSWORD_KEY: &str = "password";

pub const ADMIN_USERNAME: &str = "admin";

/// Resolve the endpoint's provider config into an authenticated session.
pub async fn get_config(
    store: &dyn ClusterStore,
    endpoint: &Endpoint,
    timeout: Option<Duration>,
) -> Result<Session> {
    match &endpoint.spec.provider_config_ref {
        Some(pc_ref) => use_provider_config(store, &pc_ref.name, timeout).await,
        None => Err(Error::NoProviderConfig),
    }
}

/// Fetch the named provider config, read the admin password and log in.
pub async fn use_provider_config(
    store: &dyn ClusterStore,
    name: &str,
    timeout: Option<Duration>,
) -> Result<Session> {
    let pc = store
        .get_provider_config(name)
        .await
        .map_err(|source| Error::ProfileFetchFailed {
            name: name.to_string(),
            source,
        })?;

    let opts = TokenProviderOptions {
        server_url: pc.spec.server_url.clone(),
        user_agent: pc.spec.user_agent.clone(),
        debug_client: pc.debug_client(),
        timeout,
    };

    let password = get_initial_admin_password(store, &pc).await?;
    let token = accounts::login(&opts, ADMIN_USERNAME, &password).await?;

    let user_agent = opts
        .user_agent
        .filter(|ua| !ua.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

    Ok(Session {
        server_url: opts.server_url,
        user_agent,
        token,
        debug_client: opts.debug_client,
        timeout,
    })
}

/// Where the admin password lives for this provider config.
///
/// Starts from the bootstrap secret and standard password key; non-blank
/// fields of the config's secret reference replace them one by one.
pub fn admin_password_ref(pc: &ProviderConfig) -> Result<SecretKeySelector> {
    let mut selector = SecretKeySelector {
        name: ARGOCD_INITIAL_ADMIN_SECRET.to_string(),
        namespace: String::new(),
        key: BASIC_AUTH_PASSWORD_KEY.to_string(),
    };

    let Some(credentials) = &pc.spec.credentials else {
        return Ok(selector);
    };

    match credentials.source {
        CredentialsSource::Secret => {}
        source @ (CredentialsSource::None | CredentialsSource::Environment) => {
            return Err(Error::UnsupportedCredentialSource(source));
        }
    }

    if let Some(overrides) = &credentials.secret_ref {
        override_if_set(&mut selector.name, &overrides.name);
        override_if_set(&mut selector.namespace, &overrides.namespace);
        override_if_set(&mut selector.key, &overrides.key);
    }

    Ok(selector)
}

fn override_if_set(field: &mut String, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        *field = value.to_string();
    }
}

/// Read the Argo CD admin password.
///
/// A failed secret fetch is returned unwrapped so a "not found" stays
/// recognisable to the caller.
pub async fn get_initial_admin_password(
    store: &dyn ClusterStore,
    pc: &ProviderConfig,
) -> Result<SecretString> {
    let selector = admin_password_ref(pc)?;
    let secret = store.get_secret(&selector.namespace, &selector.name).await?;

    match secret.get(&selector.key) {
        Some(password) => Ok(SecretString::from(password.to_string())),
        None => {
            tracing::warn!(
                secret = %selector.name,
                namespace = %selector.namespace,
                key = %selector.key,
                "Admin password key missing from secret; logging in with an empty password"
            );
            Ok(SecretString::from(String::new()))
        }
    }
}
