//! Resilient store adapter: circuit breaker + retry around a backend.
//!
//! The adapter is the only component that performs blocking external
//! calls. Every attempt runs under a bounded timeout, retries back off
//! exponentially while the circuit is closed or half-open, and an open
//! circuit fails fast without contacting the backend. A timed-out
//! attempt is dropped, not awaited.

mod breaker;


pub use breaker::{CircuitState, HealthReport};

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use essence_grid_core::config::{BreakerSettings, RetrySettings};
use essence_grid_core::error::BackendError;
use essence_grid_core::Essence;

use crate::backend::{BackendHit, VectorBackend};
use breaker::CircuitBreaker;

/// Fault-tolerant wrapper around one [`VectorBackend`].
pub struct ResilientStore {
    backend: Arc<dyn VectorBackend>,
    breaker: CircuitBreaker,
    retry: RetrySettings,
}

impl std::fmt::Debug for ResilientStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientStore")
            .field("backend", &self.backend.name())
            .field("circuit_state", &self.breaker.state())
            .finish()
    }
}

impl ResilientStore {
    /// Wrap `backend` with the given breaker and retry settings.
    pub fn new(
        backend: Arc<dyn VectorBackend>,
        breaker: &BreakerSettings,
        retry: &RetrySettings,
    ) -> Self {
        Self {
            backend,
            breaker: CircuitBreaker::new(breaker),
            retry: retry.clone(),
        }
    }

    /// Insert or replace a record on the backend.
    pub async fn upsert(&self, essence: Essence) -> Result<(), BackendError> {
        let backend = Arc::clone(&self.backend);
        self.execute("upsert", move || {
            let backend = Arc::clone(&backend);
            let essence = essence.clone();
            async move { backend.upsert(essence).await }
        })
        .await
    }

    /// Rank backend records by similarity to `query`.
    pub async fn search(
        &self,
        query: &[f32],
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<BackendHit>, BackendError> {
        let backend = Arc::clone(&self.backend);
        let query: Arc<[f32]> = Arc::from(query);
        self.execute("search", move || {
            let backend = Arc::clone(&backend);
            let query = Arc::clone(&query);
            async move { backend.search(&query, top_k, threshold).await }
        })
        .await
    }

    /// Remove a record from the backend.
    pub async fn remove(&self, id: &str) -> Result<bool, BackendError> {
        let backend = Arc::clone(&self.backend);
        let id = id.to_string();
        self.execute("remove", move || {
            let backend = Arc::clone(&backend);
            let id = id.clone();
            async move { backend.remove(&id).await }
        })
        .await
    }

    /// Number of records on the backend.
    pub async fn count(&self) -> Result<usize, BackendError> {
        let backend = Arc::clone(&self.backend);
        self.execute("count", move || {
            let backend = Arc::clone(&backend);
            async move { backend.count().await }
        })
        .await
    }

    /// Current breaker position.
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Health view for the monitoring layer; read-only.
    pub fn health_report(&self) -> HealthReport {
        self.breaker.report(self.backend.name())
    }

    /// Run `call` with breaker gating, bounded per-attempt timeout and
    /// exponential-backoff retries.
    ///
    /// Calls rejected by an open circuit are not retried. Structural
    /// request faults (dimension mismatch) propagate immediately without
    /// counting against the breaker.
    async fn execute<T, F, Fut>(&self, op: &str, mut call: F) -> Result<T, BackendError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let max_attempts = self.retry.max_retries;
        let mut delay = self.retry.initial_delay();
        let mut last: Option<BackendError> = None;

        for attempt in 1..=max_attempts {
            self.breaker.preflight()?;

            let timeout = self.retry.attempt_timeout();
            match tokio::time::timeout(timeout, call()).await {
                Ok(Ok(value)) => {
                    self.breaker.record_success();
                    return Ok(value);
                }
                Ok(Err(err @ BackendError::DimensionMismatch { .. })) => {
                    return Err(err);
                }
                Ok(Err(err)) => {
                    self.breaker.record_failure();
                    warn!(op, attempt, error = %err, "backend attempt failed");
                    last = Some(err);
                }
                Err(_) => {
                    // The attempt's future is dropped here; a late reply
                    // is abandoned, never awaited.
                    self.breaker.record_failure();
                    let err = BackendError::Timeout {
                        timeout_ms: timeout.as_millis() as u64,
                    };
                    warn!(op, attempt, "backend attempt timed out");
                    last = Some(err);
                }
            }

            if attempt < max_attempts {
                debug!(op, attempt, delay_ms = delay.as_millis() as u64, "backing off");
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(self.retry.max_delay());
            }
        }

        Err(BackendError::RetriesExhausted {
            attempts: max_attempts,
            last: last
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt executed".to_string()),
        })
    }
}
