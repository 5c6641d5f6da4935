//! Circuit breaker state machine.

use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use essence_grid_core::config::BreakerSettings;
use essence_grid_core::error::BackendError;

/// Breaker position for one backend connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    /// Calls pass through; failures are counted.
    Closed,
    /// Calls fail fast without contacting the backend.
    Open,
    /// Trial calls probe whether the backend recovered.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Read-only health view consumed by the monitoring layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Name of the wrapped backend.
    pub backend: String,
    /// Current breaker position.
    pub circuit_state: CircuitState,
    /// Consecutive failures observed in the current closed period.
    pub failure_count: u32,
    /// When the most recent failure happened.
    pub last_failure_time: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    half_open_successes: u32,
    opened_at: Option<Instant>,
    last_failure: Option<DateTime<Utc>>,
}

/// Failure-isolation state machine for one backend connection.
///
/// Every observation and transition happens under one mutex, so
/// concurrent calls cannot race the counters past a threshold without
/// exactly one transition firing.
#[derive(Debug)]
pub(super) struct CircuitBreaker {
    settings: BreakerSettings,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub(super) fn new(settings: &BreakerSettings) -> Self {
        Self {
            settings: settings.clone(),
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                half_open_successes: 0,
                opened_at: None,
                last_failure: None,
            }),
        }
    }

    /// Gate a call about to run.
    ///
    /// While open, fails fast until the recovery timeout elapses, at
    /// which point the breaker moves to half-open and lets the call
    /// probe the backend.
    pub(super) fn preflight(&self) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => Ok(()),
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|at| at.elapsed())
                    .unwrap_or_default();
                let timeout = self.settings.recovery_timeout();
                if elapsed >= timeout {
                    inner.state = CircuitState::HalfOpen;
                    inner.half_open_successes = 0;
                    info!("circuit half-open: probing backend after recovery timeout");
                    Ok(())
                } else {
                    Err(BackendError::CircuitOpen {
                        remaining_ms: (timeout - elapsed).as_millis() as u64,
                    })
                }
            }
        }
    }

    pub(super) fn record_success(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                inner.half_open_successes += 1;
                if inner.half_open_successes >= self.settings.success_threshold {
                    inner.state = CircuitState::Closed;
                    inner.consecutive_failures = 0;
                    inner.half_open_successes = 0;
                    inner.opened_at = None;
                    info!("circuit closed: backend recovered");
                }
            }
            // A success can land here when a call that started before the
            // transition finishes late; it changes nothing.
            CircuitState::Open => {}
        }
    }

    pub(super) fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.last_failure = Some(Utc::now());
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.settings.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    warn!(
                        failures = inner.consecutive_failures,
                        "circuit opened: backend failing"
                    );
                }
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                inner.half_open_successes = 0;
                warn!("circuit re-opened: probe failed");
            }
            CircuitState::Open => {}
        }
    }

    pub(super) fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub(super) fn report(&self, backend: &str) -> HealthReport {
        let inner = self.inner.lock();
        HealthReport {
            backend: backend.to_string(),
            circuit_state: inner.state,
            failure_count: inner.consecutive_failures,
            last_failure_time: inner.last_failure,
        }
    }
}
