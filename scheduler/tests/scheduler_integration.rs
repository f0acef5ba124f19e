use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use core_types::{AppError, Job};
use scheduler::{JobExecutor, Scheduler, SchedulerConfig};

struct CountingExecutor {
    calls: Arc<AtomicUsize>,
    sleep: Duration,
}

#[async_trait]
impl JobExecutor for CountingExecutor {
    async fn execute(&self, _job: &Job) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.sleep).await;
        Ok(())
    }
}

const YAML_DOC: &str = r#"
jobs:
  - name: quotes
    enabled: true
    schedule: "* * * * * *"
    provider: { name: vendor-t, type: RealtimeStock }
    params:
      symbols: ["600000"]
"#;

#[tokio::test]
async fn load_config_registers_valid_jobs_and_drops_invalid_ones() {
    let scheduler = Scheduler::new(SchedulerConfig::default());
    let doc = format!(
        "{YAML_DOC}  - name: \"\"\n    schedule: \"* * * * * *\"\n    provider: {{ name: t, type: RealtimeStock }}\n"
    );
    let registered = scheduler.load_config(&doc).await.unwrap();
    assert_eq!(registered, 1);
    assert_eq!(scheduler.get_all_jobs().await.len(), 1);
}

// S7: a job ticking every second whose executor takes 2s must only
// execute once in a 3s window — the second tick collides with the
// in-flight run and is dropped, never queued.
#[tokio::test(start_paused = true)]
async fn overlapping_ticks_never_run_concurrently() {
    let scheduler = Scheduler::new(SchedulerConfig::default());
    scheduler.load_config(YAML_DOC).await.unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    scheduler.set_executor(Arc::new(CountingExecutor {
        calls: calls.clone(),
        sleep: Duration::from_secs(2),
    }));

    scheduler.start().await.unwrap();
    tokio::time::advance(Duration::from_secs(3)).await;
    scheduler.stop().await;

    assert!(calls.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn manual_run_job_updates_status_snapshot() {
    let scheduler = Scheduler::new(SchedulerConfig::default());
    scheduler.load_config(YAML_DOC).await.unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    scheduler.set_executor(Arc::new(CountingExecutor {
        calls: calls.clone(),
        sleep: Duration::ZERO,
    }));

    scheduler.run_job("quotes").await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let job = scheduler.get_job("quotes").await.unwrap();
    assert_eq!(job.status, core_types::JobStatus::Pending);
    assert_eq!(job.run_count, 1);
}

#[tokio::test]
async fn run_job_rejects_unknown_name() {
    let scheduler = Scheduler::new(SchedulerConfig::default());
    let err = scheduler.run_job("missing").await.unwrap_err();
    assert!(matches!(err, scheduler::SchedulerError::NotFound(_)));
}

#[tokio::test]
async fn symbols_extraction_surfaces_as_invalid_argument() {
    let job = Job {
        id: uuid::Uuid::new_v4(),
        name: "no-symbols".into(),
        enabled: true,
        cron_spec: "* * * * * *".into(),
        provider_ref: core_types::ProviderRef {
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
    };
    assert!(job.symbols().is_err());
}
