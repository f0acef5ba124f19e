use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Five price/volume levels on one side of the order book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BookLevels {
    pub prices: [f64; 5],
    pub volumes: [u64; 5],
}

/// A single normalised quote for one mainland-China equity.
///
/// Invariants (checked in [`Quote::validate`], not re-checked on every
/// field access): `low <= price <= high`, `volume >= 0`, `timestamp`
/// within 24h of `ingest_at`, `symbol` matches `^[0-9]{6}$`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub prev_close: f64,
    pub change: f64,
    pub change_pct: f64,
    pub volume: u64,
    pub turnover: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub bid: BookLevels,
    pub ask: BookLevels,
    pub inner_disc: u64,
    pub outer_disc: u64,
    pub pe: f64,
    pub pb: f64,
    pub amplitude: f64,
    pub turnover_rate: f64,
    pub circulation: f64,
    pub market_value: f64,
    pub limit_up: f64,
    pub limit_down: f64,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Validate the invariants a `Quote` must satisfy.
    ///
    /// `ingest_at` is passed explicitly (rather than read from the wall
    /// clock) so callers with an injectable `TimeSource` can validate
    /// deterministically in tests.
    pub fn validate(&self, ingest_at: DateTime<Utc>) -> Result<(), ModelError> {
        if !is_valid_symbol(&self.symbol) {
            return Err(ModelError::InvalidSymbol(self.symbol.clone()));
        }
        if self.low > self.price || self.price > self.high {
            return Err(ModelError::PriceOutOfRange {
                low: self.low,
                price: self.price,
                high: self.high,
            });
        }
        if self.high < self.low {
            return Err(ModelError::InvertedRange {
                low: self.low,
                high: self.high,
            });
        }
        let age = ingest_at.signed_duration_since(self.timestamp);
        if age > Duration::hours(24) || age < Duration::hours(-24) {
            return Err(ModelError::StaleTimestamp {
                timestamp: self.timestamp,
                ingest_at,
            });
        }
        Ok(())
    }
}

/// `true` iff `symbol` is exactly six ASCII digits (`^[0-9]{6}$`).
pub fn is_valid_symbol(symbol: &str) -> bool {
    symbol.len() == 6 && symbol.bytes().all(|b| b.is_ascii_digit())
}

/// Exchange a six-digit symbol dispatches to: `6`→sh,
/// `0|3`→sz, `4|8`→bj. Returns `None` for a malformed or unrecognised
/// symbol.
pub fn market_prefix(symbol: &str) -> Option<&'static str> {
    if !is_valid_symbol(symbol) {
        return None;
    }
    match symbol.as_bytes()[0] {
        b'6' => Some("sh"),
        b'0' | b'3' => Some("sz"),
        b'4' | b'8' => Some("bj"),
        _ => None,
    }
}
