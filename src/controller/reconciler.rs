use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::Instrument;

use crate::error::{Error, Result};
use crate::models::Endpoint;
use crate::storage::ClusterStore;

use super::ExternalConnecter;

/// What a single pass ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created,
    Updated,
    Deleted,
    /// The secret exists and nothing needed doing.
    UpToDate,
    /// The endpoint is being deleted and its secret is already gone.
    Absent,
}

/// Result of reconciling every stored endpoint once.
#[derive(Debug, Default)]
pub struct SweepSummary {
    pub succeeded: Vec<(String, ReconcileOutcome)>,
    pub failed: Vec<(String, Error)>,
}

impl SweepSummary {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives passes over endpoints. Holds no state between passes.
pub struct Reconciler {
    store: Arc<dyn ClusterStore>,
    connecter: Arc<dyn ExternalConnecter>,
    max_concurrent: usize,
}

impl Reconciler {
    pub fn new(store: Arc<dyn ClusterStore>, connecter: Arc<dyn ExternalConnecter>) -> Self {
        Self {
            store,
            connecter,
            max_concurrent: 1,
        }
    }

    /// Upper bound on passes running at once across different endpoints.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Run one pass over `endpoint` and persist its status.
    ///
    /// Status is written even when the pass fails, so a condition set before
    /// the failure is not lost.
    pub async fn reconcile(&self, endpoint: &mut Endpoint) -> Result<ReconcileOutcome> {
        let span = tracing::info_span!(
            "reconcile",
            endpoint = %endpoint.name(),
            id = %endpoint.spec.for_provider.id_or_generate(),
        );

        async {
            let result = self.run_pass(endpoint).await;

            let saved = self
                .store
                .save_endpoint_status(endpoint.name(), &endpoint.status)
                .await;

            match (result, saved) {
                (Ok(outcome), Ok(())) => {
                    tracing::debug!(?outcome, "Reconciled endpoint");
                    Ok(outcome)
                }
                (Ok(_), Err(err)) => Err(Error::Store(err)),
                (Err(err), saved) => {
                    if let Err(save_err) = saved {
                        tracing::warn!(error = %save_err, "Failed to save endpoint status");
                    }
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_pass(&self, endpoint: &mut Endpoint) -> Result<ReconcileOutcome> {
        let external = self.connecter.connect(endpoint).await?;
        let observation = external.observe(endpoint).await?;

        if endpoint.is_being_deleted() {
            if !observation.resource_exists {
                return Ok(ReconcileOutcome::Absent);
            }
            external.delete(endpoint).await?;
            return Ok(ReconcileOutcome::Deleted);
        }

        if !observation.resource_exists {
            external.create(endpoint).await?;
            return Ok(ReconcileOutcome::Created);
        }

        if !observation.resource_up_to_date {
            external.update(endpoint).await?;
            return Ok(ReconcileOutcome::Updated);
        }

        Ok(ReconcileOutcome::UpToDate)
    }

    /// Reconcile every stored endpoint once. A failing endpoint does not
    /// stop the others.
    pub async fn reconcile_all(&self) -> Result<SweepSummary> {
        let endpoints = self.store.list_endpoints().await?;

        let results: Vec<(String, Result<ReconcileOutcome>)> = stream::iter(endpoints)
            .map(move |mut endpoint| async move {
                let result = self.reconcile(&mut endpoint).await;
                (endpoint.metadata.name, result)
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let mut summary = SweepSummary::default();
        for (name, result) in results {
            match result {
                Ok(outcome) => summary.succeeded.push((name, outcome)),
                Err(err) => {
                    tracing::warn!(
                        endpoint = %name,
                        kind = ?err.kind(),
                        retryable = err.is_retryable(),
                        error = %err,
                        "Reconcile failed"
                    );
                    summary.failed.push((name, err));
                }
            }
        }

        summary.succeeded.sort_by(|a, b| a.0.cmp(&b.0));
        summary.failed.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(summary)
    }
}
