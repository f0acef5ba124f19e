mod parser;
mod types;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use core_types::{market_prefix, AppError, Quote};
use reqwest::Client;
use tracing::{debug, instrument};

use crate::context::FetchCtx;
use crate::traits::{classify_transport_error, validate_symbols, Provider};
use types::TResponse;

/// Vendor T: a JSON HTTP quote source, one request per batch of
/// symbols, market-prefixed codes in the URL (`sh600000`, `sz000001`).
pub struct VendorT {
    name: String,
    http: Client,
    base_url: String,
    healthy: AtomicBool,
}

impl VendorT {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;
        Ok(Self {
            name: name.into(),
            http,
            base_url: base_url.into(),
            healthy: AtomicBool::new(true),
        })
    }

    fn prefixed_codes(&self, symbols: &[String]) -> Vec<String> {
        symbols
            .iter()
            .filter_map(|s| market_prefix(s).map(|p| format!("{p}{s}")))
            .collect()
    }
}

#[async_trait]
impl Provider for VendorT {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    fn rate_limit_hint(&self) -> Duration {
        Duration::from_millis(200)
    }

    fn supports(&self, symbol: &str) -> bool {
        market_prefix(symbol).is_some()
    }

    #[instrument(skip(self, _ctx, symbols), fields(provider = %self.name, n = symbols.len()))]
    async fn fetch(&self, _ctx: &FetchCtx, symbols: &[String]) -> Result<Vec<Quote>, AppError> {
        let (quotes, _) = self.fetch_raw(_ctx, symbols).await?;
        Ok(quotes)
    }

    async fn fetch_raw(
        &self,
        _ctx: &FetchCtx,
        symbols: &[String],
    ) -> Result<(Vec<Quote>, String), AppError> {
        validate_symbols(symbols)?;

        let codes = self.prefixed_codes(symbols);
        let url = format!("{}/quote?codes={}", self.base_url, codes.join(","));

        let resp = self.http.get(&url).send().await.map_err(|e| {
            self.healthy.store(false, Ordering::Relaxed);
            classify_transport_error(&e)
        })?;

        let resp = resp.error_for_status().map_err(|e| {
            self.healthy.store(false, Ordering::Relaxed);
            AppError::Fatal(format!("vendor t upstream error: {e}"))
        })?;

        let body = resp
            .text()
            .await
            .map_err(|e| AppError::Transient(e.to_string()))?;

        let parsed: TResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::InvalidArgument(format!("malformed vendor t body: {e}")))?;

        let by_code: std::collections::HashMap<&str, &types::TRecord> = parsed
            .data
            .iter()
            .map(|r| (r.code.as_str(), r))
            .collect();

        let quotes = symbols
            .iter()
            .filter_map(|s| by_code.get(s.as_str()).map(|r| parser::to_quote(r)))
            .collect();

        self.healthy.store(true, Ordering::Relaxed);
        debug!(fetched = %codes.len(), "vendor t batch complete");
        Ok((quotes, body))
    }
}
