use std::sync::Arc;
use std::time::Duration;

use provider::Provider;

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::frequency_control::{FrequencyControl, FrequencyControlConfig};
use market::MarketClock;

/// One named entry in a decorator chain config map.
#[derive(Debug, Clone)]
pub enum DecoratorConfig {
    FrequencyControl(FrequencyControlConfig),
    CircuitBreaker(CircuitBreakerConfig),
}

impl DecoratorConfig {
    /// Smaller priority applies closer to the underlying provider
    /// (innermost); frequency control runs before the circuit breaker
    /// sees a call, so it gets priority 1.
    fn priority(&self) -> u8 {
        match self {
            DecoratorConfig::FrequencyControl(_) => 1,
            DecoratorConfig::CircuitBreaker(_) => 2,
        }
    }

    fn enabled(&self) -> bool {
        match self {
            DecoratorConfig::FrequencyControl(c) => c.enabled,
            DecoratorConfig::CircuitBreaker(c) => c.enabled,
        }
    }
}

/// Wrap `provider` with every enabled entry in `configs`, applied in
/// ascending priority order (innermost first). Disabled entries are
/// skipped entirely rather than constructed as no-op wrappers.
pub fn build_chain(
    provider: Arc<dyn Provider>,
    clock: Arc<MarketClock>,
    mut configs: Vec<(String, DecoratorConfig)>,
) -> Arc<dyn Provider> {
    configs.sort_by_key(|(_, c)| c.priority());

    let mut current = provider;
    for (_name, config) in configs {
        if !config.enabled() {
            continue;
        }
        current = match config {
            DecoratorConfig::FrequencyControl(fc_config) => Arc::new(FrequencyControl::new(
                current,
                Arc::clone(&clock),
                fc_config,
            )),
            DecoratorConfig::CircuitBreaker(cb_config) => {
                Arc::new(CircuitBreaker::new(current, cb_config))
            }
        };
    }
    current
}

pub fn default_frequency_control() -> FrequencyControlConfig {
    FrequencyControlConfig {
        min_interval: Duration::from_millis(200),
        max_retries: 3,
        enabled: true,
    }
}

pub fn default_circuit_breaker(name: impl Into<String>) -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        name: name.into(),
        max_requests: 5,
        interval: Duration::from_secs(60),
        timeout: Duration::from_secs(30),
        ready_to_trip: 5,
        enabled: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use core_types::{AppError, Quote};
    use market::FixedTimeSource;
    use provider::FetchCtx;

    struct NoopProvider;

    #[async_trait]
    impl Provider for NoopProvider {
        fn name(&self) -> &str {
            "noop"
        }
        fn is_healthy(&self) -> bool {
            true
        }
        fn rate_limit_hint(&self) -> Duration {
            Duration::from_millis(0)
        }
        fn supports(&self, _symbol: &str) -> bool {
            true
        }
        async fn fetch(&self, _ctx: &FetchCtx, _symbols: &[String]) -> Result<Vec<Quote>, AppError> {
            Ok(vec![])
        }
    }

    #[test]
    fn priority_ordering_sorts_frequency_control_first() {
        let mut configs = vec![
            ("cb".to_string(), DecoratorConfig::CircuitBreaker(default_circuit_breaker("cb"))),
            (
                "fc".to_string(),
                DecoratorConfig::FrequencyControl(default_frequency_control()),
            ),
        ];
        configs.sort_by_key(|(_, c)| c.priority());
        assert_eq!(configs[0].0, "fc");
        assert_eq!(configs[1].0, "cb");
    }

    #[tokio::test]
    async fn disabled_entries_are_skipped() {
        let clock = Arc::new(MarketClock::new(Arc::new(FixedTimeSource::new(
            chrono::Utc::now(),
        ))));
        let configs = vec![(
            "fc".to_string(),
            DecoratorConfig::FrequencyControl(FrequencyControlConfig {
                enabled: false,
                ..default_frequency_control()
            }),
        )];
        let chain = build_chain(Arc::new(NoopProvider), clock, configs);
        assert_eq!(chain.name(), "noop");
    }
}
