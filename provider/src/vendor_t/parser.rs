use chrono::{DateTime, TimeZone, Utc};
use core_types::{BookLevels, Quote};

use super::types::TRecord;

/// Convert one vendor T record into a [`Quote`]. Fields the wire format
/// doesn't carry (`change`, `change_pct`, `amplitude`) are derived here
/// rather than trusted from a vendor-computed column.
pub fn to_quote(record: &TRecord) -> Quote {
    let change = record.price - record.pre_close;
    let change_pct = if record.pre_close != 0.0 {
        change / record.pre_close * 100.0
    } else {
        0.0
    };
    let amplitude = if record.pre_close != 0.0 {
        (record.high - record.low) / record.pre_close * 100.0
    } else {
        0.0
    };
    let timestamp: DateTime<Utc> = Utc
        .timestamp_opt(record.timestamp, 0)
        .single()
        .unwrap_or_else(Utc::now);

    Quote {
        symbol: record.code.clone(),
        name: record.name.clone(),
        price: record.price,
        prev_close: record.pre_close,
        change,
        change_pct,
        volume: record.volume,
        turnover: record.amount,
        open: record.open,
        high: record.high,
        low: record.low,
        bid: BookLevels {
            prices: record.bid_p,
            volumes: record.bid_v,
        },
        ask: BookLevels {
            prices: record.ask_p,
            volumes: record.ask_v,
        },
        inner_disc: record.inner_disc,
        outer_disc: record.outer_disc,
        pe: record.pe,
        pb: record.pb,
        amplitude,
        turnover_rate: record.turnover_rate,
        circulation: record.circulation,
        market_value: record.market_value,
        limit_up: record.limit_up,
        limit_down: record.limit_down,
        timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TRecord {
        TRecord {
            code: "600000".into(),
            name: "浦发银行".into(),
            price: 10.5,
            pre_close: 10.0,
            open: 10.1,
            high: 10.6,
            low: 9.9,
            volume: 1_000_000,
            amount: 10_000_000.0,
            bid_p: [10.4, 10.3, 10.2, 10.1, 10.0],
            bid_v: [100, 200, 300, 400, 500],
            ask_p: [10.5, 10.6, 10.7, 10.8, 10.9],
            ask_v: [100, 200, 300, 400, 500],
            inner_disc: 0,
            outer_disc: 0,
            pe: 6.0,
            pb: 0.9,
            turnover_rate: 1.2,
            circulation: 1.0e9,
            market_value: 1.0e10,
            limit_up: 11.0,
            limit_down: 9.0,
            timestamp: 1_724_200_000,
        }
    }

    #[test]
    fn derives_change_and_change_pct() {
        let q = to_quote(&sample());
        assert!((q.change - 0.5).abs() < 1e-9);
        assert!((q.change_pct - 5.0).abs() < 1e-6);
    }

    #[test]
    fn derives_amplitude_from_high_low_pre_close() {
        let q = to_quote(&sample());
        assert!((q.amplitude - 7.0).abs() < 1e-6);
    }

    #[test]
    fn zero_pre_close_does_not_divide_by_zero() {
        let mut r = sample();
        r.pre_close = 0.0;
        let q = to_quote(&r);
        assert_eq!(q.change_pct, 0.0);
        assert_eq!(q.amplitude, 0.0);
    }
}
