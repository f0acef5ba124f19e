mod parser;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use core_types::{market_prefix, AppError, Quote};
use encoding_rs::GBK;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::context::FetchCtx;
use crate::traits::{classify_transport_error, validate_symbols, Provider};

/// Vendor S: a plain-text quote feed, one `var hq_str_<code>="...";`
/// line per symbol, body encoded in GBK rather than UTF-8.
pub struct VendorS {
    name: String,
    http: Client,
    base_url: String,
    healthy: AtomicBool,
}

impl VendorS {
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
impl Provider for VendorS {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    fn rate_limit_hint(&self) -> Duration {
        Duration::from_millis(300)
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
        let url = format!("{}/list={}", self.base_url, codes.join(","));

        let resp = self.http.get(&url).send().await.map_err(|e| {
            self.healthy.store(false, Ordering::Relaxed);
            classify_transport_error(&e)
        })?;

        let resp = resp.error_for_status().map_err(|e| {
            self.healthy.store(false, Ordering::Relaxed);
            AppError::Fatal(format!("vendor s upstream error: {e}"))
        })?;

        let raw = resp
            .bytes()
            .await
            .map_err(|e| AppError::Transient(e.to_string()))?;

        let (decoded, _, had_errors) = GBK.decode(&raw);
        if had_errors {
            warn!(provider = %self.name, "vendor s body had malformed GBK bytes, decoded lossily");
        }
        let body = decoded.into_owned();

        let mut by_code = std::collections::HashMap::new();
        for line in body.lines() {
            if let Some((code, csv)) = parser::split_line(line) {
                by_code.insert(code.to_string(), csv.to_string());
            }
        }

        let mut quotes = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let Some(prefix) = market_prefix(symbol) else {
                continue;
            };
            let code = format!("{prefix}{symbol}");
            if let Some(csv) = by_code.get(&code) {
                quotes.push(parser::parse_record(symbol, csv)?);
            }
        }

        self.healthy.store(true, Ordering::Relaxed);
        debug!(fetched = %quotes.len(), "vendor s batch complete");
        Ok((quotes, body))
    }
}
