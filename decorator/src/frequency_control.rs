use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Utc;
use core_types::{AppError, Quote};
use gate::IntelligentGate;
use market::MarketClock;
use provider::{FetchCtx, Provider};
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct FrequencyControlConfig {
    pub min_interval: StdDuration,
    pub max_retries: u32,
    pub enabled: bool,
}

/// One request-pacing / retry wrapper around a provider. Owns an
/// [`IntelligentGate`] so the decision to keep retrying, wait, or give
/// up is market-aware rather than a fixed backoff.
pub struct FrequencyControl {
    inner: Arc<dyn Provider>,
    clock: Arc<MarketClock>,
    gate: IntelligentGate,
    config: FrequencyControlConfig,
    last_request_at: Mutex<Option<chrono::DateTime<Utc>>>,
}

impl FrequencyControl {
    pub fn new(
        inner: Arc<dyn Provider>,
        clock: Arc<MarketClock>,
        config: FrequencyControlConfig,
    ) -> Self {
        Self {
            inner,
            clock,
            gate: IntelligentGate::new(),
            config,
            last_request_at: Mutex::new(None),
        }
    }

    async fn wait_for_interval(&self, ctx: &FetchCtx) {
        let now = Utc::now();
        let wait = {
            let last = self.last_request_at.lock().await;
            match *last {
                Some(prev) => {
                    let elapsed = (now - prev)
                        .to_std()
                        .unwrap_or(StdDuration::from_secs(0));
                    self.config.min_interval.saturating_sub(elapsed)
                }
                None => StdDuration::from_secs(0),
            }
        };
        if wait.is_zero() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = ctx.cancelled() => {}
        }
    }

    async fn sleep_cancellable(&self, wait: chrono::Duration, ctx: &FetchCtx) {
        let Ok(wait) = wait.to_std() else { return };
        if wait.is_zero() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = ctx.cancelled() => {}
        }
    }
}

fn fingerprint_strings(quotes: &[Quote]) -> Vec<String> {
    quotes
        .iter()
        .map(|q| format!("{}:{}:{}", q.symbol, q.price, q.volume))
        .collect()
}

#[async_trait]
impl Provider for FrequencyControl {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_healthy(&self) -> bool {
        self.inner.is_healthy()
    }

    fn rate_limit_hint(&self) -> std::time::Duration {
        self.config.min_interval
    }

    fn supports(&self, symbol: &str) -> bool {
        self.inner.supports(symbol)
    }

    async fn fetch(&self, ctx: &FetchCtx, symbols: &[String]) -> Result<Vec<Quote>, AppError> {
        if !self.config.enabled {
            return self.inner.fetch(ctx, symbols).await;
        }

        self.gate.initialize_batch(&self.clock, symbols.to_vec());

        for attempt in 0..=self.config.max_retries {
            let admission = self.gate.should_proceed(&self.clock);
            if !admission.allowed {
                return Err(AppError::Transient(
                    admission.reason.unwrap_or_else(|| "gate denied".to_string()),
                ));
            }

            self.wait_for_interval(ctx).await;

            let result = self.inner.fetch(ctx, symbols).await;
            {
                let mut last = self.last_request_at.lock().await;
                *last = Some(Utc::now());
            }

            match result {
                Ok(quotes) => {
                    let outcome =
                        self.gate
                            .record_result(&self.clock, None, &fingerprint_strings(&quotes));
                    if !outcome.should_stop {
                        return Ok(quotes);
                    }
                    debug!(provider = %self.name(), attempt, "gate stopped batch after success");
                    return Ok(quotes);
                }
                Err(err) => {
                    let outcome = self.gate.record_error_level(
                        &self.clock,
                        err.level(),
                        &err.to_string(),
                    );
                    if outcome.should_stop {
                        warn!(provider = %self.name(), attempt, %err, "frequency control giving up");
                        return Err(AppError::Transient(
                            outcome.final_err.unwrap_or_else(|| err.to_string()),
                        ));
                    }
                    self.sleep_cancellable(outcome.wait, ctx).await;
                }
            }
        }

        Err(AppError::Transient(format!(
            "max retries ({}) reached for provider {}",
            self.config.max_retries,
            self.name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use market::FixedTimeSource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyProvider {
        calls: AtomicUsize,
        fail_first_n: usize,
    }

    #[async_trait]
    impl Provider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }
        fn is_healthy(&self) -> bool {
            true
        }
        fn rate_limit_hint(&self) -> std::time::Duration {
            std::time::Duration::from_millis(0)
        }
        fn supports(&self, _symbol: &str) -> bool {
            true
        }
        async fn fetch(&self, _ctx: &FetchCtx, symbols: &[String]) -> Result<Vec<Quote>, AppError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first_n {
                return Err(AppError::Transient("i/o timeout".to_string()));
            }
            Ok(symbols
                .iter()
                .map(|s| test_quote(s))
                .collect())
        }
    }

    fn test_quote(symbol: &str) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            name: String::new(),
            price: 1.0,
            prev_close: 1.0,
            change: 0.0,
            change_pct: 0.0,
            volume: 1,
            turnover: 0.0,
            open: 1.0,
            high: 1.0,
            low: 1.0,
            bid: Default::default(),
            ask: Default::default(),
            inner_disc: 0,
            outer_disc: 0,
            pe: 0.0,
            pb: 0.0,
            amplitude: 0.0,
            turnover_rate: 0.0,
            circulation: 0.0,
            market_value: 0.0,
            limit_up: 0.0,
            limit_down: 0.0,
            timestamp: Utc::now(),
        }
    }

    fn clock_during_session() -> Arc<MarketClock> {
        let naive = chrono::NaiveDate::from_ymd_opt(2025, 8, 21)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let local = chrono_tz::Asia::Shanghai
            .from_local_datetime(&naive)
            .single()
            .unwrap();
        Arc::new(MarketClock::new(Arc::new(FixedTimeSource::new(
            local.with_timezone(&Utc),
        ))))
    }

    #[tokio::test]
    async fn disabled_delegates_verbatim() {
        let provider = Arc::new(FlakyProvider {
            calls: AtomicUsize::new(0),
            fail_first_n: 0,
        });
        let fc = FrequencyControl::new(
            provider,
            clock_during_session(),
            FrequencyControlConfig {
                min_interval: StdDuration::from_secs(0),
                max_retries: 0,
                enabled: false,
            },
        );
        let ctx = FetchCtx::new();
        let quotes = fc.fetch(&ctx, &["600000".to_string()]).await.unwrap();
        assert_eq!(quotes.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_underlying_succeeds() {
        let provider = Arc::new(FlakyProvider {
            calls: AtomicUsize::new(0),
            fail_first_n: 2,
        });
        let fc = FrequencyControl::new(
            provider,
            clock_during_session(),
            FrequencyControlConfig {
                min_interval: StdDuration::from_millis(0),
                max_retries: 3,
                enabled: true,
            },
        );
        let ctx = FetchCtx::new();
        let quotes = fc.fetch(&ctx, &["600000".to_string()]).await.unwrap();
        assert_eq!(quotes.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausting_retries_yields_error() {
        let provider = Arc::new(FlakyProvider {
            calls: AtomicUsize::new(0),
            fail_first_n: 100,
        });
        let fc = FrequencyControl::new(
            provider,
            clock_during_session(),
            FrequencyControlConfig {
                min_interval: StdDuration::from_millis(0),
                max_retries: 2,
                enabled: true,
            },
        );
        let ctx = FetchCtx::new();
        let result = fc.fetch(&ctx, &["600000".to_string()]).await;
        assert!(result.is_err());
    }
}
