use std::time::Duration;

use crate::chain::DecoratorConfig;
use crate::circuit_breaker::CircuitBreakerConfig;
use crate::frequency_control::FrequencyControlConfig;

fn fc(min_interval_ms: u64, max_retries: u32, enabled: bool) -> FrequencyControlConfig {
    FrequencyControlConfig {
        min_interval: Duration::from_millis(min_interval_ms),
        max_retries,
        enabled,
    }
}

fn cb(
    name: &str,
    max_requests: u32,
    interval_secs: u64,
    timeout_secs: u64,
    ready_to_trip: u32,
    enabled: bool,
) -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        name: name.to_string(),
        max_requests,
        interval: Duration::from_secs(interval_secs),
        timeout: Duration::from_secs(timeout_secs),
        ready_to_trip,
        enabled,
    }
}

fn profile(
    breaker_name: &str,
    frequency_control: FrequencyControlConfig,
    circuit_breaker: CircuitBreakerConfig,
) -> Vec<(String, DecoratorConfig)> {
    vec![
        (
            format!("{breaker_name}-frequency-control"),
            DecoratorConfig::FrequencyControl(frequency_control),
        ),
        (
            format!("{breaker_name}-circuit-breaker"),
            DecoratorConfig::CircuitBreaker(circuit_breaker),
        ),
    ]
}

/// FC{200ms, 3 retries, on} + CB{max_req=5, interval=60s, timeout=30s, trip=5}.
pub fn default_profile(breaker_name: &str) -> Vec<(String, DecoratorConfig)> {
    profile(
        breaker_name,
        fc(200, 3, true),
        cb(breaker_name, 5, 60, 30, 5, true),
    )
}

/// FC{5s, 3, on} + CB{max_req=3, interval=120s, timeout=60s, trip=3}.
pub fn production_profile(breaker_name: &str) -> Vec<(String, DecoratorConfig)> {
    profile(
        breaker_name,
        fc(5_000, 3, true),
        cb(breaker_name, 3, 120, 60, 3, true),
    )
}

/// FC{3s, 5, on} + CB{max_req=10, interval=300s, timeout=120s, trip=10}.
pub fn monitoring_profile(breaker_name: &str) -> Vec<(String, DecoratorConfig)> {
    profile(
        breaker_name,
        fc(3_000, 5, true),
        cb(breaker_name, 10, 300, 120, 10, true),
    )
}

/// Both decorators disabled — used in tests that want the bare provider.
pub fn test_profile(breaker_name: &str) -> Vec<(String, DecoratorConfig)> {
    profile(
        breaker_name,
        fc(0, 0, false),
        cb(breaker_name, 0, 0, 0, 0, false),
    )
}
