//! Shared types used by the scheduler subsystem.

use std::time::Duration;

use async_trait::async_trait;
use core_types::{AppError, Job};
use thiserror::Error;

/// Global timing parameters the engine enforces regardless of any one
/// job's own config.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Per-execution deadline; the in-flight run is cancelled past this.
    pub execution_timeout: Duration,
    /// How long `stop()` waits for in-flight runs before giving up.
    pub stop_grace_period: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            execution_timeout: Duration::from_secs(5 * 60),
            stop_grace_period: Duration::from_secs(30),
        }
    }
}

/// The callback a caller installs via [`crate::engine::Scheduler::set_executor`].
/// Invoked with a read-only snapshot of the job that ticked.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(&self, job: &Job) -> Result<(), AppError>;
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("job {0:?} not found")]
    NotFound(String),

    #[error("job name must be unique; {0:?} is already registered")]
    DuplicateName(String),

    #[error("job {0:?} is disabled")]
    Disabled(String),

    #[error("invalid job config: {0}")]
    InvalidConfig(String),

    #[error("no executor installed; call set_executor before start()")]
    NoExecutor,

    #[error("config error: {0}")]
    Config(String),
}
