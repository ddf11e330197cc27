use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::accounts::{self, Session};
use crate::clients::{self, CreateSecretOpts};
use crate::clock::Clock;
use crate::error::Result;
use crate::events::{reasons, Event, EventRecorder, EventType};
use crate::models::{Condition, Endpoint};
use crate::storage::ClusterStore;

use super::{ExternalClient, ExternalConnecter, ExternalCreation, ExternalObservation, ExternalUpdate};

/// `expiresIn` sent when minting: the token never expires.
pub const NO_EXPIRATION: i64 = 0;

/// Resolves a fresh Argo CD session for every pass.
pub struct EndpointConnecter {
    store: Arc<dyn ClusterStore>,
    recorder: Arc<dyn EventRecorder>,
    clock: Arc<dyn Clock>,
    timeout: Option<Duration>,
}

impl EndpointConnecter {
    pub fn new(
        store: Arc<dyn ClusterStore>,
        recorder: Arc<dyn EventRecorder>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            recorder,
            clock,
            timeout: None,
        }
    }

    /// Per-request timeout for calls to the Argo CD server.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl ExternalConnecter for EndpointConnecter {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn ExternalClient>> {
        let session = clients::get_config(self.store.as_ref(), endpoint, self.timeout).await?;
        tracing::debug!(server = %session.server_url, "Created session");

        Ok(Box::new(EndpointExternal {
            store: self.store.clone(),
            recorder: self.recorder.clone(),
            clock: self.clock.clone(),
            session,
        }))
    }
}

/// Pass-local client holding the session obtained at connect time.
pub struct EndpointExternal {
    store: Arc<dyn ClusterStore>,
    recorder: Arc<dyn EventRecorder>,
    clock: Arc<dyn Clock>,
    session: Session,
}

impl EndpointExternal {
    fn event(&self, endpoint: &Endpoint, event_type: EventType, reason: &'static str, message: String) {
        self.recorder.record(Event {
            object: endpoint.name().to_string(),
            event_type,
            reason,
            message,
        });
    }
}

#[async_trait]
impl ExternalClient for EndpointExternal {
    async fn observe(&self, endpoint: &mut Endpoint) -> Result<ExternalObservation> {
        let token = clients::get_endpoint_secret(self.store.as_ref(), endpoint.secret_ref()).await?;

        if token.is_empty() {
            return Ok(ExternalObservation {
                resource_exists: false,
                resource_up_to_date: true,
            });
        }

        // The stored token is trusted as-is; it is not re-validated remotely.
        endpoint.set_condition(Condition::available(self.clock.now()));
        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: true,
        })
    }

    async fn create(&self, endpoint: &mut Endpoint) -> Result<ExternalCreation> {
        endpoint.set_condition(Condition::creating(self.clock.now()));

        let account = endpoint.account().to_string();
        let secret_ref = endpoint.secret_ref().cloned();
        let secret_name = secret_ref.as_ref().map(|r| r.name.clone()).unwrap_or_default();

        // Tokens already held remotely under this account are not looked up.
        tracing::debug!(account = %account, "Minting token without checking existing remote tokens");
        let token = accounts::generate_token(&self.session, &account, NO_EXPIRATION).await?;
        tracing::debug!(account = %account, "Generated argocd token");
        self.event(
            endpoint,
            EventType::Normal,
            reasons::TOKEN_CREATED,
            format!("Generated argocd token for account: {account}"),
        );

        let saved = clients::create_endpoint_secret(
            self.store.as_ref(),
            CreateSecretOpts {
                token: &token,
                target_url: &self.session.server_url,
                secret_ref: secret_ref.as_ref(),
            },
        )
        .await;

        if let Err(err) = saved {
            tracing::warn!(
                account = %account,
                secret = %secret_name,
                error = %err,
                "Minted argocd token could not be saved; the remote token is orphaned"
            );
            self.event(
                endpoint,
                EventType::Warning,
                reasons::TOKEN_ORPHANED,
                format!("Generated argocd token for account '{account}' was not saved: {err}"),
            );
            return Err(err);
        }

        tracing::debug!(account = %account, secret = %secret_name, "Saved argocd token as secret");
        self.event(
            endpoint,
            EventType::Normal,
            reasons::TOKEN_SAVED,
            format!("Saved argocd token for account '{account}' into '{secret_name}' secret"),
        );

        Ok(ExternalCreation)
    }

    async fn update(&self, _endpoint: &mut Endpoint) -> Result<ExternalUpdate> {
        Ok(ExternalUpdate)
    }

    async fn delete(&self, endpoint: &mut Endpoint) -> Result<()> {
        endpoint.set_condition(Condition::deleting(self.clock.now()));

        let account = endpoint.account().to_string();
        let secret_name = endpoint.secret_ref().map(|r| r.name.clone()).unwrap_or_default();
        tracing::debug!(account = %account, secret = %secret_name, "Deleting argocd token secret");

        match clients::delete_endpoint_secret(self.store.as_ref(), endpoint.secret_ref()).await {
            Ok(()) => {
                self.event(
                    endpoint,
                    EventType::Normal,
                    reasons::TOKEN_DELETED,
                    format!("Deleted argocd token secret '{secret_name}' of account '{account}'"),
                );
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                tracing::debug!(secret = %secret_name, "Token secret already absent");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
