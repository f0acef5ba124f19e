use std::time::Duration;

use async_trait::async_trait;
use core_types::{AppError, Quote};

use crate::context::FetchCtx;
use crate::traits::Provider;

/// A simpler provider shape some vendor integrations naturally fall
/// into: no context/cancellation awareness, no separate raw-body
/// variant. [`SmartAdapter`] forwards this to the canonical [`Provider`]
/// contract so the registry only ever has to hold one trait object
/// type.
#[async_trait]
pub trait SimpleProvider: Send + Sync {
    fn name(&self) -> &str;
    fn supports(&self, symbol: &str) -> bool;
    async fn fetch(&self, symbols: &[String]) -> Result<Vec<Quote>, AppError>;
}

pub struct SmartAdapter<P: SimpleProvider> {
    inner: P,
}

impl<P: SimpleProvider> SmartAdapter<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: SimpleProvider> Provider for SmartAdapter<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn rate_limit_hint(&self) -> Duration {
        Duration::from_millis(0)
    }

    fn supports(&self, symbol: &str) -> bool {
        self.inner.supports(symbol)
    }

    async fn fetch(&self, _ctx: &FetchCtx, symbols: &[String]) -> Result<Vec<Quote>, AppError> {
        self.inner.fetch(symbols).await
    }
}
