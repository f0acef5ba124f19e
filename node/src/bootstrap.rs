//! Bootstrap (C11): wires C1–C10 together, starts the scheduler, and
//! owns the process's shutdown sequence.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use market::{MarketClock, SystemTimeSource};
use provider::{ProviderRegistry, VendorS, VendorT};
use scheduler::{Scheduler, SchedulerConfig};
use tracing::{error, info, warn};

use executor::{Bus, Executor, RedisBus};

use crate::cli::{node_id_or_generate, Cli};

const BUS_PING_TIMEOUT: Duration = Duration::from_secs(5);
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

const VENDOR_T_BASE_URL: &str = "https://vendor-t.example.com";
const VENDOR_S_BASE_URL: &str = "https://vendor-s.example.com";

/// Run the node to completion: construct every component, start the
/// scheduler, and block until a shutdown signal arrives. Returns an
/// error only on fatal init failure (bus unreachable, malformed
/// config) — per-job errors never propagate out of here.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let node_id = node_id_or_generate(cli.node_id.clone());
    info!(node_id, "starting fetcher node");

    let bus_addr = format!("redis://{}", cli.redis);
    let bus: Arc<dyn Bus> = Arc::new(
        RedisBus::connect(&bus_addr, cli.redis_pass.as_deref(), BUS_PING_TIMEOUT)
            .await
            .context("bus connection failed")?,
    );
    info!(bus = %cli.redis, "bus connected");

    let config_doc = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("reading job config at {}", cli.config))?;

    let registry = ProviderRegistry::new();
    let vendor_t = Arc::new(VendorT::new("vendor-t", VENDOR_T_BASE_URL)?);
    let vendor_s = Arc::new(VendorS::new("vendor-s", VENDOR_S_BASE_URL)?);
    let clock = Arc::new(MarketClock::new(Arc::new(SystemTimeSource)));

    registry
        .register(
            "RealtimeStock",
            "vendor-t",
            decorator::build_chain(vendor_t, clock.clone(), decorator::production_profile("vendor-t")),
        )
        .await
        .context("registering vendor-t")?;
    registry
        .register(
            "RealtimeStock",
            "vendor-s",
            decorator::build_chain(vendor_s, clock.clone(), decorator::production_profile("vendor-s")),
        )
        .await
        .context("registering vendor-s")?;

    let scheduler = Scheduler::new(SchedulerConfig::default());
    let registered = scheduler
        .load_config(&config_doc)
        .await
        .map_err(|e| anyhow::anyhow!("job config load failed: {e}"))?;
    info!(registered, "jobs registered from config");

    let executor = Arc::new(Executor::new(
        registry,
        bus.clone(),
        MarketClock::new(Arc::new(SystemTimeSource)),
        node_id.clone(),
    ));
    scheduler.set_executor(executor);
    scheduler
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("scheduler start failed: {e}"))?;

    let heartbeat = tokio::spawn(heartbeat_loop(scheduler.clone(), node_id.clone()));

    wait_for_shutdown_signal().await;
    info!("shutdown signal received");

    heartbeat.abort();
    scheduler.stop().await;
    if let Err(err) = bus.close().await {
        warn!(%err, "bus close failed during shutdown");
    }

    info!(node_id, "fetcher node stopped cleanly");
    Ok(())
}

/// Waits for SIGINT or, on unix, SIGTERM — whichever arrives first.
#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(err) => {
            error!(%err, "failed to install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(err) = res {
                error!(%err, "failed to install SIGINT handler");
            }
        }
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to install signal handler");
    }
}

async fn heartbeat_loop(scheduler: Scheduler, node_id: String) {
    let mut ticker = tokio::time::interval(HEARTBEAT_INTERVAL);
    loop {
        ticker.tick().await;
        let jobs = scheduler.get_all_jobs().await;
        info!(
            node_id,
            job_count = jobs.len(),
            running = jobs.iter().filter(|j| j.status == core_types::JobStatus::Running).count(),
            "heartbeat"
        );
    }
}
