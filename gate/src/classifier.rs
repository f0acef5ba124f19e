use chrono::Duration;
use core_types::ErrorLevel;
use market::MarketClock;

/// Classify an error message into an [`ErrorLevel`].
///
/// Matching is case-insensitive substring matching, first hit wins, in
/// the priority order Fatal > Network > Invalid > Unknown — same order
/// the patterns are matched in, preserved here because two
/// patterns ("connection reset") appear in both Fatal and Network with
/// different guards and the priority order is what disambiguates them.
pub fn classify(message: &str) -> ErrorLevel {
    let lower = message.to_lowercase();

    if lower.contains("connection refused")
        || lower.contains("no such host")
        || lower.contains("dial tcp")
        || lower.contains("dial udp")
        || (lower.contains("connection reset")
            && !lower.contains("read tcp")
            && !lower.contains("write tcp"))
        || (lower.contains("forbidden") && lower.contains("403"))
    {
        return ErrorLevel::Fatal;
    }

    if lower.contains("timeout")
        || lower.contains("network is unreachable")
        || lower.contains("temporary failure")
        || (lower.contains("read tcp") && lower.contains("connection reset"))
        || lower.contains("write tcp")
    {
        return ErrorLevel::Network;
    }

    if lower.contains("invalid argument")
        || lower.contains("bad request")
        || (lower.contains("not found") && lower.contains("404"))
    {
        return ErrorLevel::Invalid;
    }

    ErrorLevel::Unknown
}

/// Retry schedule for `Network`-level errors: attempts
/// 0, 1, 2 wait 1, 3, 5 minutes; attempt >= 3 rejects. Every other level
/// never retries.
pub fn get_retry(level: ErrorLevel, attempt: u32) -> (bool, Duration) {
    if level != ErrorLevel::Network {
        return (false, Duration::zero());
    }
    match attempt {
        0 => (true, Duration::minutes(1)),
        1 => (true, Duration::minutes(3)),
        2 => (true, Duration::minutes(5)),
        _ => (false, Duration::zero()),
    }
}

/// `get_retry` plus the `trading_end - 30s` guard. A retry is only
/// scheduled if `now + wait` lands at or before that deadline. This
/// guard is deliberately only applied when scheduling *before* close —
/// there is no equivalent guard for retries attempted after close, and
/// this preserves that asymmetry rather than "fixing" it.
pub fn schedule_retry(clock: &MarketClock, level: ErrorLevel, attempt: u32) -> (bool, Duration) {
    let (should_retry, wait) = get_retry(level, attempt);
    if !should_retry {
        return (false, Duration::zero());
    }

    let candidate = clock.now() + wait;
    if candidate > clock.retry_deadline() {
        return (false, Duration::zero());
    }

    (true, wait)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_schedule_for_network_errors() {
        assert_eq!(classify("i/o timeout"), ErrorLevel::Network);
        assert_eq!(get_retry(ErrorLevel::Network, 0), (true, Duration::seconds(60)));
        assert_eq!(get_retry(ErrorLevel::Network, 1), (true, Duration::seconds(180)));
        assert_eq!(get_retry(ErrorLevel::Network, 2), (true, Duration::seconds(300)));
        assert_eq!(get_retry(ErrorLevel::Network, 3), (false, Duration::zero()));
    }

    #[test]
    fn classifier_determinism() {
        for _ in 0..3 {
            assert_eq!(classify("dial tcp: connection refused"), ErrorLevel::Fatal);
        }
    }

    #[test]
    fn fatal_patterns() {
        assert_eq!(classify("dial tcp: connection refused"), ErrorLevel::Fatal);
        assert_eq!(classify("no such host"), ErrorLevel::Fatal);
        assert_eq!(classify("dial udp 1.2.3.4:80: i/o error"), ErrorLevel::Fatal);
        assert_eq!(classify("connection reset by peer"), ErrorLevel::Fatal);
        assert_eq!(classify("403 Forbidden"), ErrorLevel::Fatal);
    }

    #[test]
    fn network_patterns_override_connection_reset_with_tcp_context() {
        assert_eq!(
            classify("read tcp 10.0.0.1:443: connection reset by peer"),
            ErrorLevel::Network
        );
        assert_eq!(classify("write tcp 10.0.0.1:443: broken pipe"), ErrorLevel::Network);
        assert_eq!(classify("network is unreachable"), ErrorLevel::Network);
        assert_eq!(classify("temporary failure in name resolution"), ErrorLevel::Network);
    }

    #[test]
    fn invalid_patterns() {
        assert_eq!(classify("invalid argument: symbols"), ErrorLevel::Invalid);
        assert_eq!(classify("400 Bad Request"), ErrorLevel::Invalid);
        assert_eq!(classify("404 not found"), ErrorLevel::Invalid);
    }

    #[test]
    fn unknown_fallback() {
        assert_eq!(classify("some unrelated upstream message"), ErrorLevel::Unknown);
    }

    #[test]
    fn schedule_retry_rejects_candidate_past_trading_end_minus_30s() {
        use chrono::TimeZone;
        use market::{FixedTimeSource, MarketClock};
        use std::sync::Arc;

        // 14:58:00 local; trading_end - 30s = 14:59:40. A 5-minute wait
        // (attempt 2) would land at 15:03:00, past the deadline.
        let naive = chrono::NaiveDate::from_ymd_opt(2025, 8, 21)
            .unwrap()
            .and_hms_opt(14, 58, 0)
            .unwrap();
        let local = chrono_tz::Asia::Shanghai
            .from_local_datetime(&naive)
            .single()
            .unwrap();
        let utc = local.with_timezone(&chrono::Utc);
        let clock = MarketClock::new(Arc::new(FixedTimeSource::new(utc)));

        let (ok, _) = schedule_retry(&clock, ErrorLevel::Network, 2);
        assert!(!ok);

        let (ok, wait) = schedule_retry(&clock, ErrorLevel::Network, 0);
        assert!(ok);
        assert_eq!(wait, Duration::minutes(1));
    }
}
