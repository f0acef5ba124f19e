//! The executor (C7): the glue between a ticked [`Job`] and a
//! published [`CanonicalMessage`].

use std::sync::Arc;

use async_trait::async_trait;
use core_types::{build, AppError, Job};
use market::MarketClock;
use provider::{FetchCtx, ProviderRegistry};
use scheduler::JobExecutor;
use tracing::{info, instrument};

use crate::types::{Bus, ExecutorError};

/// Maps a provider type to the payload type stamped onto the bus.
/// `RealtimeStock` is the only type the spec defines today; anything
/// else falls back to a snake_case rendering of the provider type so a
/// future type still gets a reasonable stream name.
fn payload_type_for(provider_type: &str) -> String {
    match provider_type {
        "RealtimeStock" => "stock_realtime".to_string(),
        other => other
            .chars()
            .fold(String::new(), |mut acc, c| {
                if c.is_uppercase() && !acc.is_empty() {
                    acc.push('_');
                }
                acc.extend(c.to_lowercase());
                acc
            }),
    }
}

const MARKET_TAG: &str = "A-share";

pub struct Executor {
    registry: ProviderRegistry,
    bus: Arc<dyn Bus>,
    clock: MarketClock,
    node_id: String,
}

impl Executor {
    pub fn new(
        registry: ProviderRegistry,
        bus: Arc<dyn Bus>,
        clock: MarketClock,
        node_id: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            bus,
            clock,
            node_id: node_id.into(),
        }
    }
}

#[async_trait]
impl JobExecutor for Executor {
    #[instrument(skip(self, job), fields(job = %job.name))]
    async fn execute(&self, job: &Job) -> Result<(), AppError> {
        let symbols = job
            .symbols()
            .map_err(|e| AppError::from(ExecutorError::BadParams(e)))?;

        let provider = self
            .registry
            .get(&job.provider_ref.provider_type, &job.provider_ref.name)
            .await
            .ok_or_else(|| {
                AppError::from(ExecutorError::ProviderNotFound {
                    provider_type: job.provider_ref.provider_type.clone(),
                    name: job.provider_ref.name.clone(),
                })
            })?;

        let ctx = FetchCtx::new();
        let quotes = provider.fetch(&ctx, &symbols).await?;

        let payload_type = payload_type_for(&job.provider_ref.provider_type);
        let session_tag = self.clock.session_tag();
        let created_at = self.clock.now().with_timezone(&chrono::Utc);

        let message = build(
            self.node_id.clone(),
            provider.name().to_string(),
            payload_type,
            quotes,
            MARKET_TAG,
            session_tag,
            created_at,
        );

        let stream = job
            .output
            .as_ref()
            .and_then(|o| o.stream.clone())
            .unwrap_or_else(|| message.stream_name());

        self.bus
            .publish(&stream, &message)
            .await
            .map_err(AppError::from)?;

        info!(stream, quotes = message.payload.len(), "published job result");
        Ok(())
    }
}
