//! Cron scheduler (C6): loads a declarative job document, ticks each
//! job's cron expression with seconds precision, and invokes an
//! installed executor with at-most-one-concurrent-execution per job.

pub mod config;
pub mod eligibility;
pub mod engine;
pub mod state;
pub mod types;

pub use config::parse_jobs;
pub use engine::Scheduler;
pub use types::{JobExecutor, SchedulerConfig, SchedulerError};
