//! Pure, synchronous admission check run before a tick is allowed to
//! invoke the executor — no IO, no locks, just a read-only decision
//! from a job snapshot so it is trivially unit-testable.

use core_types::{Job, JobStatus};

use crate::types::SchedulerError;

/// Whether `job` may run right now. Disabled jobs are rejected outright;
/// a job mid-run is the run-lock's concern, not this check's (the
/// run-lock `try_lock` in the tick loop is what actually drops an
/// overlapping tick).
pub fn check_job_runnable(job: &Job) -> Result<(), SchedulerError> {
    if !job.enabled || job.status == JobStatus::Disabled {
        return Err(SchedulerError::Disabled(job.name.clone()));
    }
    Ok(())
}
