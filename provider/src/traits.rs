use std::time::Duration;

use async_trait::async_trait;
use core_types::{AppError, Quote};

use crate::context::FetchCtx;

/// Contract every data source implements, whether a raw vendor adapter,
/// a decorator wrapping one, or a test double. Decorators (frequency
/// control, circuit breaker) and the registry's smart adapter all speak
/// this same interface so the executor never needs to know which layer
/// it is holding.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable identifier used in logs and registry lookups.
    fn name(&self) -> &str;

    /// Whether this provider is currently able to serve requests.
    /// Decorators fold in their own state (e.g. an open circuit).
    fn is_healthy(&self) -> bool;

    /// Suggested minimum delay between requests to this provider.
    /// Advisory only; frequency control is what actually enforces it.
    fn rate_limit_hint(&self) -> Duration;

    /// Whether `symbol` is one this provider can serve: well-formed and
    /// carrying a market prefix the provider recognizes.
    fn supports(&self, symbol: &str) -> bool;

    /// Fetch quotes for `symbols`, preserving input order and omitting
    /// symbols the upstream source did not return.
    async fn fetch(&self, ctx: &FetchCtx, symbols: &[String]) -> Result<Vec<Quote>, AppError>;

    /// Same as `fetch`, but also returns the verbatim upstream response
    /// body for diagnostics. The default implementation is in terms of
    /// `fetch`, re-serializing the parsed quotes — adapters that talk to
    /// a real upstream should override this to avoid double work and
    /// return the actual wire bytes.
    async fn fetch_raw(
        &self,
        ctx: &FetchCtx,
        symbols: &[String],
    ) -> Result<(Vec<Quote>, String), AppError> {
        let quotes = self.fetch(ctx, symbols).await?;
        let body = serde_json::to_string(&quotes).unwrap_or_default();
        Ok((quotes, body))
    }
}

/// Map a transport-level `reqwest::Error` to the right [`AppError`]
/// variant using its own typed classification (`is_connect`/
/// `is_timeout`) rather than pattern-matching its `Display` text: a
/// real connect failure or a real timeout doesn't render the Go-style
/// literal strings the error classifier's substring patterns (§4.2)
/// were written against, so the vendor adapters classify at the
/// source instead of leaving it to downstream string matching.
pub fn classify_transport_error(err: &reqwest::Error) -> AppError {
    if err.is_connect() {
        AppError::Fatal(err.to_string())
    } else {
        AppError::Transient(err.to_string())
    }
}

pub fn validate_symbols(symbols: &[String]) -> Result<(), AppError> {
    if symbols.is_empty() {
        return Err(AppError::InvalidArgument("symbols must not be empty".into()));
    }
    for s in symbols {
        if !core_types::is_valid_symbol(s) {
            return Err(AppError::InvalidArgument(format!(
                "malformed symbol: {s:?}"
            )));
        }
    }
    Ok(())
}
