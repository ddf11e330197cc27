//! Error taxonomy for the endpoint controller.
//!
//! Every component returns the first error it meets. The controller never
//! inspects the variant itself; [`Error::kind`] exists for the scheduler and
//! for logging.

use reqwest::StatusCode;

use crate::models::CredentialsSource;
use crate::storage::StoreError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why an HTTP exchange with the Argo CD server failed.
#[derive(Debug, thiserror::Error)]
pub enum HttpFailure {
    #[error("server answered {0}")]
    Status(StatusCode),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unspecified server url for Argo CD")]
    MissingServerUrl,

    #[error("providerConfigRef is not given")]
    NoProviderConfig,

    #[error("credentials source {0} is not currently supported")]
    UnsupportedCredentialSource(CredentialsSource),

    #[error("no endpoint secret referenced")]
    NoSecretReference,

    #[error("cannot get referenced provider config {name:?}")]
    ProfileFetchFailed {
        name: String,
        #[source]
        source: StoreError,
    },

    #[error("create argocd session request failed: {0}")]
    AuthFailed(#[source] HttpFailure),

    #[error("create argocd token for account {account:?} failed: {failure}")]
    MintFailed {
        account: String,
        #[source]
        failure: HttpFailure,
    },

    #[error("cannot get {name} secret in namespace {namespace}")]
    SecretFetchFailed {
        namespace: String,
        name: String,
        #[source]
        source: StoreError,
    },

    #[error("cannot create {name} secret in namespace {namespace}")]
    SecretCreateFailed {
        namespace: String,
        name: String,
        #[source]
        source: StoreError,
    },

    #[error("cannot delete {name} secret in namespace {namespace}")]
    SecretDeleteFailed {
        namespace: String,
        name: String,
        #[source]
        source: StoreError,
    },

    /// Store failure passed through without wrapping, so callers can still
    /// see a bare "not found".
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse classification used by the scheduler to decide on retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Needs operator intervention; retrying will not help.
    Config,
    /// Login or mint failed; retry on the normal backoff.
    Auth,
    /// Secret store failure other than not-found.
    Store,
    /// The addressed object does not exist.
    NotFound,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingServerUrl
            | Error::NoProviderConfig
            | Error::UnsupportedCredentialSource(_)
            | Error::NoSecretReference => ErrorKind::Config,
            Error::AuthFailed(_) | Error::MintFailed { .. } => ErrorKind::Auth,
            Error::ProfileFetchFailed { source, .. }
            | Error::SecretFetchFailed { source, .. }
            | Error::SecretCreateFailed { source, .. }
            | Error::SecretDeleteFailed { source, .. }
            | Error::Store(source) => {
                if source.is_not_found() {
                    ErrorKind::NotFound
                } else {
                    ErrorKind::Store
                }
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() != ErrorKind::Config
    }
}
