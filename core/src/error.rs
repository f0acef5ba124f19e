use chrono::{DateTime, Utc};
use thiserror::Error;

/// Coarse classification a transport error is mapped to by the error
/// classifier. Retry behaviour is keyed off this, not the
/// raw error text, once classification has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorLevel {
    Fatal,
    Network,
    Invalid,
    Unknown,
}

/// Errors surfaced to callers across the pipeline.
///
/// This is the one error type shared by `provider`, `decorator`,
/// `scheduler`, and `executor` so that classification and propagation
/// compose across crate boundaries without re-wrapping at every hop.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("transient/network error: {0}")]
    Transient(String),

    #[error("fatal upstream error: {0}")]
    Fatal(String),

    #[error("circuit open: {0}")]
    OpenCircuit(String),

    #[error("cancelled or timed out")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn level(&self) -> ErrorLevel {
        match self {
            AppError::Fatal(_) => ErrorLevel::Fatal,
            AppError::Transient(_) | AppError::OpenCircuit(_) => ErrorLevel::Network,
            AppError::InvalidArgument(_) | AppError::Config(_) => ErrorLevel::Invalid,
            AppError::Cancelled | AppError::Other(_) => ErrorLevel::Unknown,
        }
    }
}

/// Errors raised by data-model invariant checks.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("invalid symbol: {0:?}, expected 6 ASCII digits")]
    InvalidSymbol(String),

    #[error("price {price} outside [low={low}, high={high}]")]
    PriceOutOfRange { low: f64, price: f64, high: f64 },

    #[error("inverted range: high={high} < low={low}")]
    InvertedRange { low: f64, high: f64 },

    #[error("timestamp {timestamp} is more than 24h from ingest time {ingest_at}")]
    StaleTimestamp {
        timestamp: DateTime<Utc>,
        ingest_at: DateTime<Utc>,
    },
}
