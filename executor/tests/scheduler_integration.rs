use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::{AppError, JobStatus, Quote, SessionTag};
use executor::{Executor, InMemoryBus};
use market::{FixedTimeSource, MarketClock};
use provider::{FetchCtx, Provider, ProviderRegistry};
use scheduler::{Scheduler, SchedulerConfig};

struct StubProvider;

#[async_trait]
impl Provider for StubProvider {
    fn name(&self) -> &str {
        "vendor-t"
    }
    fn is_healthy(&self) -> bool {
        true
    }
    fn rate_limit_hint(&self) -> Duration {
        Duration::from_millis(0)
    }
    fn supports(&self, _symbol: &str) -> bool {
        true
    }
    async fn fetch(&self, _ctx: &FetchCtx, symbols: &[String]) -> Result<Vec<Quote>, AppError> {
        Ok(symbols
            .iter()
            .map(|s| Quote {
                symbol: s.clone(),
                name: "stub".into(),
                price: 1.0,
                prev_close: 1.0,
                change: 0.0,
                change_pct: 0.0,
                volume: 0,
                turnover: 0.0,
                open: 1.0,
                high: 1.0,
                low: 1.0,
                bid: Default::default(),
                ask: Default::default(),
                inner_disc: 0,
                outer_disc: 0,
                pe: 0.0,
                pb: 0.0,
                amplitude: 0.0,
                turnover_rate: 0.0,
                circulation: 0.0,
                market_value: 0.0,
                limit_up: 1.1,
                limit_down: 0.9,
                timestamp: chrono::Utc::now(),
            })
            .collect())
    }
}

const YAML_DOC: &str = r#"
jobs:
  - name: quotes
    enabled: true
    schedule: "* * * * * *"
    provider: { name: vendor-t, type: RealtimeStock }
    params:
      symbols: ["600000", "000001"]
"#;

fn morning_clock() -> MarketClock {
    let utc = NaiveDate::from_ymd_opt(2025, 8, 21)
        .unwrap()
        .and_hms_opt(2, 0, 0)
        .unwrap()
        .and_utc();
    MarketClock::new(Arc::new(FixedTimeSource::new(utc)))
}

#[tokio::test]
async fn scheduler_driven_run_publishes_through_executor() {
    let registry = ProviderRegistry::new();
    registry
        .register("RealtimeStock", "vendor-t", Arc::new(StubProvider))
        .await
        .unwrap();

    let bus = Arc::new(InMemoryBus::new());
    let executor = Arc::new(Executor::new(
        registry,
        bus.clone(),
        morning_clock(),
        "fetcher-test",
    ));

    let scheduler = Scheduler::new(SchedulerConfig::default());
    scheduler.load_config(YAML_DOC).await.unwrap();
    scheduler.set_executor(executor);

    scheduler.run_job("quotes").await.unwrap();

    let published = bus.published().await;
    assert_eq!(published.len(), 1);
    let (stream, message) = &published[0];
    assert_eq!(stream, "stock:stream:stock_realtime");
    assert_eq!(message.session_tag, SessionTag::Morning);
    assert_eq!(
        message.payload.iter().map(|q| q.symbol.clone()).collect::<Vec<_>>(),
        vec!["600000".to_string(), "000001".to_string()]
    );

    let job = scheduler.get_job("quotes").await.unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.run_count, 1);
    assert_eq!(job.error_count, 0);
}

#[tokio::test]
async fn missing_provider_surfaces_as_job_error_without_crashing_scheduler() {
    let registry = ProviderRegistry::new();
    let bus = Arc::new(InMemoryBus::new());
    let executor = Arc::new(Executor::new(registry, bus.clone(), morning_clock(), "fetcher-test"));

    let scheduler = Scheduler::new(SchedulerConfig::default());
    scheduler.load_config(YAML_DOC).await.unwrap();
    scheduler.set_executor(executor);

    scheduler.run_job("quotes").await.unwrap();

    assert!(bus.published().await.is_empty());
    let job = scheduler.get_job("quotes").await.unwrap();
    assert_eq!(job.status, JobStatus::Error);
    assert_eq!(job.error_count, 1);
}
