use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ObjectMeta, SecretKeySelector};

/// Where the administrator password for the Argo CD server comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialsSource {
    None,
    Secret,
    Environment,
}

impl fmt::Display for CredentialsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CredentialsSource::None => "None",
            CredentialsSource::Secret => "Secret",
            CredentialsSource::Environment => "Environment",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredentials {
    pub source: CredentialsSource,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretKeySelector>,
}

/// How to reach an Argo CD server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigSpec {
    /// Base URL of the Argo CD instance.
    pub server_url: String,

    /// User-Agent header sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Dump client requests and responses when true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_client: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<ProviderCredentials>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub metadata: ObjectMeta,
    pub spec: ProviderConfigSpec,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, server_url: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::named(name),
            spec: ProviderConfigSpec {
                server_url: server_url.into(),
                ..ProviderConfigSpec::default()
            },
        }
    }

    pub fn with_credentials(mut self, credentials: ProviderCredentials) -> Self {
        self.spec.credentials = Some(credentials);
        self
    }

    pub fn debug_client(&self) -> bool {
        self.spec.debug_client.unwrap_or(false)
    }
}
