//! Job map the engine reads and writes: a name-keyed entry per job,
//! each carrying its own run-exclusion lock so overlapping ticks for
//! *different* jobs never contend with each other.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use core_types::{AppError, Job, JobStatus};
use tokio::sync::{Mutex, RwLock};

/// One job plus the lock that enforces "at most one concurrent
/// execution" for it. The lock is acquired with `try_lock` by the tick
/// loop — a tick that finds it held is dropped, not queued, per
/// spec.md §5.
struct JobEntry {
    job: Job,
    run_lock: Arc<Mutex<()>>,
}

/// Name-keyed job map guarded by a single `RwLock`: readers are
/// `get_job`/`get_all_jobs`, writers are `add_job`/`remove_job` and the
/// status updates a completed run applies.
#[derive(Default)]
pub struct JobStore {
    inner: RwLock<HashMap<String, JobEntry>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_job(&self, job: Job) -> Result<(), AppError> {
        let mut guard = self.inner.write().await;
        if guard.contains_key(&job.name) {
            return Err(AppError::InvalidArgument(format!(
                "job name {:?} already registered",
                job.name
            )));
        }
        guard.insert(
            job.name.clone(),
            JobEntry {
                job,
                run_lock: Arc::new(Mutex::new(())),
            },
        );
        Ok(())
    }

    pub async fn remove_job(&self, name: &str) -> bool {
        self.inner.write().await.remove(name).is_some()
    }

    pub async fn get_job(&self, name: &str) -> Option<Job> {
        self.inner.read().await.get(name).map(|e| e.job.clone())
    }

    /// Copies of every registered job, in no particular order.
    pub async fn get_all_jobs(&self) -> Vec<Job> {
        self.inner.read().await.values().map(|e| e.job.clone()).collect()
    }

    pub async fn job_names(&self) -> Vec<String> {
        self.inner.read().await.keys().cloned().collect()
    }

    /// The per-job mutex a tick loop must acquire before running. Cloned
    /// out from under the store's own lock so the (possibly long-held)
    /// run lock is never nested inside the map lock.
    pub async fn run_lock(&self, name: &str) -> Option<Arc<Mutex<()>>> {
        self.inner.read().await.get(name).map(|e| Arc::clone(&e.run_lock))
    }

    pub async fn mark_running(&self, name: &str) {
        if let Some(entry) = self.inner.write().await.get_mut(name) {
            entry.job.status = JobStatus::Running;
        }
    }

    pub async fn record_success(&self, name: &str) {
        let mut guard = self.inner.write().await;
        if let Some(entry) = guard.get_mut(name) {
            entry.job.status = JobStatus::Pending;
            entry.job.run_count += 1;
            entry.job.last_run = Some(Utc::now());
        }
    }

    pub async fn record_error(&self, name: &str, message: impl Into<String>) {
        let mut guard = self.inner.write().await;
        if let Some(entry) = guard.get_mut(name) {
            entry.job.status = JobStatus::Error;
            entry.job.error_count += 1;
            entry.job.run_count += 1;
            entry.job.last_run = Some(Utc::now());
            entry.job.last_error = Some(message.into());
        }
    }

    pub async fn set_next_run(&self, name: &str, next: chrono::DateTime<Utc>) {
        if let Some(entry) = self.inner.write().await.get_mut(name) {
            entry.job.next_run = Some(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::ProviderRef;
    use std::collections::HashMap as Map;
    use uuid::Uuid;

    fn sample_job(name: &str) -> Job {
        Job {
            id: Uuid::new_v4(),
            name: name.to_string(),
            enabled: true,
            cron_spec: "* * * * * *".to_string(),
            provider_ref: ProviderRef {
                name: "t".into(),
                provider_type: "RealtimeStock".into(),
            },
            params: Map::new(),
            output: None,
            status: JobStatus::Pending,
            last_run: None,
            next_run: None,
            run_count: 0,
            error_count: 0,
            last_error: None,
        }
    }

    #[tokio::test]
    async fn add_get_remove_round_trips() {
        let store = JobStore::new();
        store.add_job(sample_job("a")).await.unwrap();
        assert!(store.get_job("a").await.is_some());
        assert!(store.remove_job("a").await);
        assert!(store.get_job("a").await.is_none());
    }

    #[tokio::test]
    async fn add_job_rejects_duplicate_name() {
        let store = JobStore::new();
        store.add_job(sample_job("a")).await.unwrap();
        assert!(store.add_job(sample_job("a")).await.is_err());
    }

    #[tokio::test]
    async fn record_success_updates_status_and_counters() {
        let store = JobStore::new();
        store.add_job(sample_job("a")).await.unwrap();
        store.mark_running("a").await;
        assert_eq!(store.get_job("a").await.unwrap().status, JobStatus::Running);
        store.record_success("a").await;
        let job = store.get_job("a").await.unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.run_count, 1);
    }

    #[tokio::test]
    async fn record_error_updates_status_and_last_error() {
        let store = JobStore::new();
        store.add_job(sample_job("a")).await.unwrap();
        store.record_error("a", "boom").await;
        let job = store.get_job("a").await.unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.error_count, 1);
        assert_eq!(job.last_error.as_deref(), Some("boom"));
    }
}
