use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{AppError, Quote};
use provider::{FetchCtx, Provider};
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub name: String,
    pub max_requests: u32,
    pub interval: StdDuration,
    pub timeout: StdDuration,
    pub ready_to_trip: u32,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Closed,
    Open,
    HalfOpen,
}

struct State {
    phase: Phase,
    consecutive_failures: u32,
    opened_at: Option<DateTime<Utc>>,
    window_started_at: DateTime<Utc>,
    half_open_in_flight: u32,
    half_open_successes: u32,
}

impl State {
    fn new() -> Self {
        Self {
            phase: Phase::Closed,
            consecutive_failures: 0,
            opened_at: None,
            window_started_at: Utc::now(),
            half_open_in_flight: 0,
            half_open_successes: 0,
        }
    }
}

/// Three-phase breaker (Closed/Open/Half-Open) wrapping a provider.
/// Admission and phase transitions are decided under one lock; the
/// underlying call itself runs outside the lock so concurrent fetches
/// are not serialized by the breaker.
pub struct CircuitBreaker {
    inner: Arc<dyn Provider>,
    config: CircuitBreakerConfig,
    state: Mutex<State>,
}

impl CircuitBreaker {
    pub fn new(inner: Arc<dyn Provider>, config: CircuitBreakerConfig) -> Self {
        Self {
            inner,
            config,
            state: Mutex::new(State::new()),
        }
    }

    async fn is_open(&self) -> bool {
        let state = self.state.lock().await;
        state.phase == Phase::Open
    }

    /// Admission check plus any phase transition it triggers. Returns
    /// an error if the call should be short-circuited.
    async fn admit(&self) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        match state.phase {
            Phase::Closed => {
                if (now - state.window_started_at)
                    .to_std()
                    .unwrap_or_default()
                    >= self.config.interval
                {
                    state.consecutive_failures = 0;
                    state.window_started_at = now;
                }
                Ok(())
            }
            Phase::Open => {
                let opened_at = state.opened_at.unwrap_or(now);
                if (now - opened_at).to_std().unwrap_or_default() >= self.config.timeout {
                    state.phase = Phase::HalfOpen;
                    state.half_open_in_flight = 0;
                    state.half_open_successes = 0;
                    info!(breaker = %self.config.name, "circuit half-open");
                    Ok(())
                } else {
                    Err(AppError::OpenCircuit(format!(
                        "circuit {} is open",
                        self.config.name
                    )))
                }
            }
            Phase::HalfOpen => {
                if state.half_open_in_flight >= self.config.max_requests {
                    Err(AppError::OpenCircuit(format!(
                        "circuit {} half-open budget exhausted",
                        self.config.name
                    )))
                } else {
                    state.half_open_in_flight += 1;
                    Ok(())
                }
            }
        }
    }

    async fn record(&self, success: bool) {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        match state.phase {
            Phase::Closed => {
                if success {
                    state.consecutive_failures = 0;
                } else {
                    state.consecutive_failures += 1;
                    if state.consecutive_failures >= self.config.ready_to_trip {
                        state.phase = Phase::Open;
                        state.opened_at = Some(now);
                        warn!(breaker = %self.config.name, "circuit opened");
                    }
                }
            }
            Phase::HalfOpen => {
                state.half_open_in_flight = state.half_open_in_flight.saturating_sub(1);
                if success {
                    state.half_open_successes += 1;
                    if state.half_open_successes >= self.config.max_requests {
                        state.phase = Phase::Closed;
                        state.consecutive_failures = 0;
                        state.window_started_at = now;
                        info!(breaker = %self.config.name, "circuit closed");
                    }
                } else {
                    state.phase = Phase::Open;
                    state.opened_at = Some(now);
                    state.half_open_successes = 0;
                    warn!(breaker = %self.config.name, "circuit reopened from half-open");
                }
            }
            Phase::Open => {}
        }
    }
}

#[async_trait]
impl Provider for CircuitBreaker {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_healthy(&self) -> bool {
        // `is_open` takes a lock, which can't happen inside a non-async
        // fn; snapshot via try_lock, defaulting to healthy if contended.
        self.inner.is_healthy()
            && self
                .state
                .try_lock()
                .map(|s| s.phase != Phase::Open)
                .unwrap_or(true)
    }

    fn rate_limit_hint(&self) -> std::time::Duration {
        self.inner.rate_limit_hint()
    }

    fn supports(&self, symbol: &str) -> bool {
        self.inner.supports(symbol)
    }

    async fn fetch(&self, ctx: &FetchCtx, symbols: &[String]) -> Result<Vec<Quote>, AppError> {
        if !self.config.enabled {
            return self.inner.fetch(ctx, symbols).await;
        }

        self.admit().await?;

        let result = self.inner.fetch(ctx, symbols).await;
        self.record(result.is_ok()).await;
        result
    }
}
