//! The cron scheduler (C6): loads jobs, evaluates their cron
//! expressions with seconds precision, and invokes the installed
//! executor on tick — one independent ticking task per job, each
//! enforcing its own mutual exclusion and execution deadline.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use core_types::{AppError, Job};
use cron::Schedule;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::parse_jobs;
use crate::eligibility::check_job_runnable;
use crate::state::JobStore;
use crate::types::{JobExecutor, SchedulerConfig, SchedulerError};

/// The scheduler engine. Cheap to clone: everything it owns is already
/// behind an `Arc`.
#[derive(Clone)]
pub struct Scheduler {
    store: Arc<JobStore>,
    executor: Arc<RwLock<Option<Arc<dyn JobExecutor>>>>,
    config: SchedulerConfig,
    shutdown: CancellationToken,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            store: Arc::new(JobStore::new()),
            executor: Arc::new(RwLock::new(None)),
            config,
            shutdown: CancellationToken::new(),
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Parse `yaml` and register every job that passes validation.
    /// Invalid entries are dropped with a warning (see
    /// [`crate::config::parse_jobs`]) rather than failing the whole load.
    pub async fn load_config(&self, yaml: &str) -> Result<usize, SchedulerError> {
        let jobs = parse_jobs(yaml).map_err(SchedulerError::Config)?;
        let mut registered = 0;
        for job in jobs {
            let name = job.name.clone();
            if self.store.add_job(job).await.is_ok() {
                registered += 1;
            } else {
                warn!(job = %name, "skipping duplicate job name from config load");
            }
        }
        Ok(registered)
    }

    pub fn set_executor(&self, executor: Arc<dyn JobExecutor>) {
        if let Ok(mut guard) = self.executor.try_write() {
            *guard = Some(executor);
        }
    }

    pub async fn add_job(&self, job: Job) -> Result<(), AppError> {
        self.store.add_job(job).await
    }

    pub async fn remove_job(&self, name: &str) -> bool {
        self.store.remove_job(name).await
    }

    pub async fn get_job(&self, name: &str) -> Option<Job> {
        self.store.get_job(name).await
    }

    pub async fn get_all_jobs(&self) -> Vec<Job> {
        self.store.get_all_jobs().await
    }

    /// Manually fire `name` once, outside its cron schedule. Rejects a
    /// disabled job; still goes through the per-job run-lock so it
    /// cannot race a concurrently ticking execution.
    pub async fn run_job(&self, name: &str) -> Result<(), SchedulerError> {
        let job = self
            .store
            .get_job(name)
            .await
            .ok_or_else(|| SchedulerError::NotFound(name.to_string()))?;
        check_job_runnable(&job)?;
        self.execute_once(name).await
    }

    /// Spawn one ticking task per registered job. Fails if no executor
    /// has been installed.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        if self.executor.read().await.is_none() {
            return Err(SchedulerError::NoExecutor);
        }

        let names = self.store.job_names().await;
        let mut tasks = self.tasks.lock().await;
        for name in names {
            let Some(job) = self.store.get_job(&name).await else {
                continue;
            };
            let Ok(schedule) = Schedule::from_str(&job.cron_spec) else {
                warn!(job = %name, "cron spec failed to re-parse at start, skipping");
                continue;
            };
            let scheduler = self.clone();
            let shutdown = self.shutdown.clone();
            tasks.push(tokio::spawn(async move {
                scheduler.tick_loop(name, schedule, shutdown).await;
            }));
        }
        info!(jobs = tasks.len(), "scheduler started");
        Ok(())
    }

    /// Cancel every ticking task and wait up to `stop_grace_period` for
    /// in-flight executions to finish.
    pub async fn stop(&self) {
        self.shutdown.cancel();
        let mut tasks = self.tasks.lock().await;
        let deadline = tokio::time::sleep(self.config.stop_grace_period);
        tokio::pin!(deadline);
        for task in tasks.drain(..) {
            tokio::select! {
                _ = task => {}
                _ = &mut deadline => {
                    warn!("scheduler stop grace period elapsed with jobs still in flight");
                    break;
                }
            }
        }
        info!("scheduler stopped");
    }

    async fn tick_loop(&self, name: String, schedule: Schedule, shutdown: CancellationToken) {
        loop {
            let now = Utc::now();
            let Some(next) = schedule.after(&now).next() else {
                warn!(job = %name, "cron schedule has no future occurrences, stopping ticker");
                return;
            };
            self.store.set_next_run(&name, next).await;
            let wait = (next - now).to_std().unwrap_or(StdDuration::ZERO);

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shutdown.cancelled() => return,
            }

            if let Err(err) = self.execute_once(&name).await {
                debug!(job = %name, %err, "tick skipped");
            }
        }
    }

    /// Run one execution of `name` under its run-lock, with the
    /// configured execution timeout. Drops (does not queue) a tick that
    /// finds the job already running.
    async fn execute_once(&self, name: &str) -> Result<(), SchedulerError> {
        let job = self
            .store
            .get_job(name)
            .await
            .ok_or_else(|| SchedulerError::NotFound(name.to_string()))?;
        check_job_runnable(&job)?;

        let Some(run_lock) = self.store.run_lock(name).await else {
            return Err(SchedulerError::NotFound(name.to_string()));
        };
        let Ok(_guard) = run_lock.try_lock() else {
            warn!(job = %name, "dropping overlapping tick, previous run still in flight");
            return Ok(());
        };

        let executor = {
            let guard = self.executor.read().await;
            guard.clone().ok_or(SchedulerError::NoExecutor)?
        };

        self.store.mark_running(name).await;
        let job = self.store.get_job(name).await.unwrap_or(job);

        let result = tokio::time::timeout(self.config.execution_timeout, executor.execute(&job)).await;
        match result {
            Ok(Ok(())) => {
                self.store.record_success(name).await;
            }
            Ok(Err(err)) => {
                error!(job = %name, %err, "job execution failed");
                self.store.record_error(name, err.to_string()).await;
            }
            Err(_) => {
                error!(job = %name, "job execution timed out");
                self.store.record_error(name, "execution timed out").await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use core_types::ProviderRef;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc as StdArc;
    use uuid::Uuid;

    fn job(name: &str, cron_spec: &str) -> Job {
        Job {
            id: Uuid::new_v4(),
            name: name.to_string(),
            enabled: true,
            cron_spec: cron_spec.to_string(),
            provider_ref: ProviderRef {
                name: "t".into(),
                provider_type: "RealtimeStock".into(),
            },
            params: HashMap::new(),
            output: None,
            status: core_types::JobStatus::Pending,
            last_run: None,
            next_run: None,
            run_count: 0,
            error_count: 0,
            last_error: None,
        }
    }

    struct CountingExecutor {
        calls: StdArc<AtomicUsize>,
        sleep: StdDuration,
    }

    #[async_trait]
    impl JobExecutor for CountingExecutor {
        async fn execute(&self, _job: &Job) -> Result<(), AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.sleep).await;
            Ok(())
        }
    }

    struct FailingExecutor;

    #[async_trait]
    impl JobExecutor for FailingExecutor {
        async fn execute(&self, _job: &Job) -> Result<(), AppError> {
            Err(AppError::Transient("upstream boom".to_string()))
        }
    }

    #[tokio::test]
    async fn start_without_executor_fails() {
        let scheduler = Scheduler::new(SchedulerConfig::default());
        scheduler.add_job(job("a", "* * * * * *")).await.unwrap();
        assert!(matches!(
            scheduler.start().await,
            Err(SchedulerError::NoExecutor)
        ));
    }

    #[tokio::test]
    async fn run_job_rejects_disabled() {
        let scheduler = Scheduler::new(SchedulerConfig::default());
        let mut j = job("a", "* * * * * *");
        j.enabled = false;
        j.status = core_types::JobStatus::Disabled;
        scheduler.add_job(j).await.unwrap();
        let calls = StdArc::new(AtomicUsize::new(0));
        scheduler.set_executor(StdArc::new(CountingExecutor {
            calls: calls.clone(),
            sleep: StdDuration::ZERO,
        }));
        assert!(matches!(
            scheduler.run_job("a").await,
            Err(SchedulerError::Disabled(_))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn run_job_records_success() {
        let scheduler = Scheduler::new(SchedulerConfig::default());
        scheduler.add_job(job("a", "* * * * * *")).await.unwrap();
        let calls = StdArc::new(AtomicUsize::new(0));
        scheduler.set_executor(StdArc::new(CountingExecutor {
            calls: calls.clone(),
            sleep: StdDuration::ZERO,
        }));
        scheduler.run_job("a").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let snapshot = scheduler.get_job("a").await.unwrap();
        assert_eq!(snapshot.status, core_types::JobStatus::Pending);
        assert_eq!(snapshot.run_count, 1);
    }

    #[tokio::test]
    async fn run_job_records_error_on_failure() {
        let scheduler = Scheduler::new(SchedulerConfig::default());
        scheduler.add_job(job("a", "* * * * * *")).await.unwrap();
        scheduler.set_executor(StdArc::new(FailingExecutor));
        scheduler.run_job("a").await.unwrap();
        let snapshot = scheduler.get_job("a").await.unwrap();
        assert_eq!(snapshot.status, core_types::JobStatus::Error);
        assert_eq!(snapshot.error_count, 1);
        assert!(snapshot.last_error.unwrap().contains("boom"));
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_execute_once_is_dropped_not_queued() {
        let scheduler = Scheduler::new(SchedulerConfig::default());
        scheduler.add_job(job("a", "* * * * * *")).await.unwrap();
        let calls = StdArc::new(AtomicUsize::new(0));
        scheduler.set_executor(StdArc::new(CountingExecutor {
            calls: calls.clone(),
            sleep: StdDuration::from_secs(2),
        }));

        let s1 = scheduler.clone();
        let first = tokio::spawn(async move { s1.execute_once("a").await });
        // Give the first execution a chance to acquire the run-lock.
        tokio::time::advance(StdDuration::from_millis(10)).await;

        scheduler.execute_once("a").await.unwrap();
        tokio::time::advance(StdDuration::from_secs(3)).await;
        first.await.unwrap().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn add_job_then_remove_then_get_all_is_empty() {
        let scheduler = Scheduler::new(SchedulerConfig::default());
        scheduler.add_job(job("a", "* * * * * *")).await.unwrap();
        assert_eq!(scheduler.get_all_jobs().await.len(), 1);
        assert!(scheduler.remove_job("a").await);
        assert!(scheduler.get_all_jobs().await.is_empty());
    }
}
