use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use core_types::ErrorLevel;
use market::MarketClock;

use crate::classifier::{classify, schedule_retry};
use crate::fingerprint;

const MAX_RETRIES: u32 = 3;
const STABILITY_THRESHOLD: u32 = 5;

/// Per-batch state owned exclusively by the gate that created it.
#[derive(Debug, Clone, Default)]
pub struct BatchCtx {
    pub symbols: Vec<String>,
    pub retry_count: u32,
    pub consecutive_same: u32,
    pub last_fingerprint: Option<String>,
    pub force_stop: bool,
    pub force_stop_reason: Option<String>,
    pub total_requests: u64,
    pub total_errors: u64,
    pub last_request_at: Option<DateTime<Utc>>,
    initialized: bool,
}

/// Outcome of [`IntelligentGate::record_result`]: whether the caller
/// should stop the batch, how long to wait before the next attempt, and
/// the final error to surface if stopping.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    pub should_stop: bool,
    pub wait: Duration,
    pub final_err: Option<String>,
}

/// Admission decision from [`IntelligentGate::should_proceed`].
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    pub allowed: bool,
    pub reason: Option<String>,
}

/// Shared error-branch logic for [`IntelligentGate::record_result`] and
/// [`IntelligentGate::record_error_level`]: given an already-classified
/// `level`, latch `force_stop` on Fatal, consult the retry schedule on
/// Network, or stop immediately on Invalid/Unknown.
fn apply_error_level(
    ctx: &mut BatchCtx,
    clock: &MarketClock,
    level: ErrorLevel,
    message: &str,
) -> RecordOutcome {
    match level {
        ErrorLevel::Fatal => {
            ctx.force_stop = true;
            ctx.force_stop_reason = Some(message.to_string());
            RecordOutcome {
                should_stop: true,
                wait: Duration::zero(),
                final_err: Some(message.to_string()),
            }
        }
        ErrorLevel::Network => {
            let attempt = ctx.retry_count;
            ctx.retry_count += 1;
            let (should_retry, wait) = schedule_retry(clock, level, attempt);
            if should_retry {
                RecordOutcome {
                    should_stop: false,
                    wait,
                    final_err: None,
                }
            } else {
                ctx.force_stop_reason = Some(message.to_string());
                RecordOutcome {
                    should_stop: true,
                    wait: Duration::zero(),
                    final_err: Some(message.to_string()),
                }
            }
        }
        ErrorLevel::Invalid | ErrorLevel::Unknown => RecordOutcome {
            should_stop: true,
            wait: Duration::zero(),
            final_err: Some(message.to_string()),
        },
    }
}

/// The intelligent rate-limiter / market-aware gate: admits or denies
/// calls for a batch, tracks retries, and detects payload stability
/// after close so a frequency-controlled provider knows when to stop
/// polling a market that has gone quiet.
///
/// All field mutations are serialized behind one mutex; `get_status`
/// takes the same lock for a consistent snapshot (there is no separate
/// reader lock — batches are low-frequency enough that a single mutex
/// does not contend).
pub struct IntelligentGate {
    state: Mutex<BatchCtx>,
}

impl Default for IntelligentGate {
    fn default() -> Self {
        Self::new()
    }
}

impl IntelligentGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BatchCtx::default()),
        }
    }

    /// Reset all fields for a new batch. If the market is not currently
    /// in a trading session, latches `force_stop` immediately.
    pub fn initialize_batch(&self, clock: &MarketClock, symbols: Vec<String>) {
        let mut ctx = self.state.lock().unwrap();
        *ctx = BatchCtx {
            symbols,
            initialized: true,
            ..Default::default()
        };
        if !clock.is_trading_time() {
            ctx.force_stop = true;
            ctx.force_stop_reason = Some("outside trading session".to_string());
        }
    }

    /// Admission check. Denies if the batch was never initialized, if
    /// `force_stop` has latched, if the market is no longer in a trading
    /// session, or if retries have been exhausted against a live error.
    pub fn should_proceed(&self, clock: &MarketClock) -> Admission {
        let ctx = self.state.lock().unwrap();

        if !ctx.initialized {
            return Admission {
                allowed: false,
                reason: Some("batch not initialized".to_string()),
            };
        }
        if ctx.force_stop {
            return Admission {
                allowed: false,
                reason: ctx.force_stop_reason.clone(),
            };
        }
        if !clock.is_trading_time() {
            return Admission {
                allowed: false,
                reason: Some("outside trading session".to_string()),
            };
        }
        if ctx.retry_count >= MAX_RETRIES && ctx.force_stop_reason.is_some() {
            return Admission {
                allowed: false,
                reason: ctx.force_stop_reason.clone(),
            };
        }

        Admission {
            allowed: true,
            reason: None,
        }
    }

    /// Record the outcome of one provider call. `err` is the upstream
    /// error message, if any; `data_strings` seeds the stability
    /// fingerprint on success.
    pub fn record_result(
        &self,
        clock: &MarketClock,
        err: Option<&str>,
        data_strings: &[String],
    ) -> RecordOutcome {
        let mut ctx = self.state.lock().unwrap();
        ctx.total_requests += 1;
        ctx.last_request_at = Some(clock.now().with_timezone(&Utc));

        match err {
            None => {
                ctx.force_stop_reason = None;
                let fp = fingerprint::compute(data_strings);

                if clock.is_after_close() {
                    match &ctx.last_fingerprint {
                        Some(prev) if *prev == fp => ctx.consecutive_same += 1,
                        _ => ctx.consecutive_same = 0,
                    }
                    if ctx.consecutive_same >= STABILITY_THRESHOLD {
                        ctx.last_fingerprint = Some(fp);
                        ctx.force_stop = true;
                        let reason = "data stabilized after close".to_string();
                        ctx.force_stop_reason = Some(reason.clone());
                        return RecordOutcome {
                            should_stop: true,
                            wait: Duration::zero(),
                            final_err: Some(reason),
                        };
                    }
                }
                ctx.last_fingerprint = Some(fp);

                RecordOutcome {
                    should_stop: false,
                    wait: Duration::zero(),
                    final_err: None,
                }
            }
            Some(message) => {
                ctx.total_errors += 1;
                apply_error_level(&mut ctx, clock, classify(message), message)
            }
        }
    }

    /// Same as [`Self::record_result`]'s error branch, but for a caller
    /// that already knows the [`ErrorLevel`] — e.g. the decorator chain,
    /// which holds a structured `AppError` and can read
    /// `AppError::level()` directly rather than re-deriving it by
    /// substring-matching `message` from scratch. Substring matching on
    /// a Rust error's `Display` text is a poor match for the Go-style
    /// literal patterns §4.2 specifies (a real `reqwest` timeout renders
    /// as "operation timed out", not "timeout"), so a caller holding a
    /// typed error should always prefer this over `record_result`.
    pub fn record_error_level(
        &self,
        clock: &MarketClock,
        level: ErrorLevel,
        message: &str,
    ) -> RecordOutcome {
        let mut ctx = self.state.lock().unwrap();
        ctx.total_requests += 1;
        ctx.total_errors += 1;
        ctx.last_request_at = Some(clock.now().with_timezone(&Utc));
        apply_error_level(&mut ctx, clock, level, message)
    }

    /// Reinitialize counters; intended for tests that want a clean slate
    /// without constructing a new gate.
    pub fn reset(&self) {
        let mut ctx = self.state.lock().unwrap();
        *ctx = BatchCtx::default();
    }

    /// Read-only snapshot of the current batch state.
    pub fn get_status(&self) -> BatchCtx {
        self.state.lock().unwrap().clone()
    }
}
