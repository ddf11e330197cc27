//! Endpoint lifecycle controller.
//!
//! A pass over one endpoint is Connect, then Observe, then at most one of
//! Create, Update or Delete. The secret named by the endpoint is the only
//! record of whether the external resource exists.

mod external;
mod reconciler;

pub use external::{EndpointConnecter, EndpointExternal, NO_EXPIRATION};
pub use reconciler::{ReconcileOutcome, Reconciler, SweepSummary};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Endpoint;

/// What Observe found out about the external resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExternalObservation {
    pub resource_exists: bool,
    pub resource_up_to_date: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalCreation;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalUpdate;

/// Observes, then creates, updates or deletes the external resource behind
/// an endpoint. Methods may set status conditions on the endpoint.
#[async_trait]
pub trait ExternalClient: Send + Sync {
    async fn observe(&self, endpoint: &mut Endpoint) -> Result<ExternalObservation>;
    async fn create(&self, endpoint: &mut Endpoint) -> Result<ExternalCreation>;
    async fn update(&self, endpoint: &mut Endpoint) -> Result<ExternalUpdate>;
    async fn delete(&self, endpoint: &mut Endpoint) -> Result<()>;
}

/// Produces an [`ExternalClient`] for a single reconciliation pass.
#[async_trait]
pub trait ExternalConnecter: Send + Sync {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn ExternalClient>>;
}
