//! Declarative job config document (`jobs.yaml`, spec.md §6) loading
//! and validation. Invalid entries are dropped with a warning rather
//! than failing the whole load — one malformed job should not take
//! down every other job in the file.

use std::collections::HashMap;
use std::collections::HashSet;

use core_types::{Job, JobStatus, OutputSpec, ProviderRef};
use cron::Schedule;
use serde::Deserialize;
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct JobConfigDocument {
    #[serde(default)]
    jobs: Vec<JobConfigEntry>,
}

#[derive(Debug, Deserialize)]
struct JobConfigEntry {
    name: String,
    #[serde(default = "default_true")]
    enabled: bool,
    schedule: String,
    provider: ProviderRef,
    #[serde(default)]
    params: HashMap<String, serde_json::Value>,
    #[serde(default)]
    output: Option<OutputSpec>,
}

fn default_true() -> bool {
    true
}

/// Parse a YAML job document into validated [`Job`]s. Entries that fail
/// validation are skipped (logged at `warn`); the returned list
/// contains only jobs that are safe to register with the cron engine.
pub fn parse_jobs(yaml: &str) -> Result<Vec<Job>, String> {
    let doc: JobConfigDocument =
        serde_yaml::from_str(yaml).map_err(|e| format!("malformed job document: {e}"))?;

    let mut seen_names = HashSet::new();
    let mut jobs = Vec::with_capacity(doc.jobs.len());

    for entry in doc.jobs {
        match validate_entry(&entry, &seen_names) {
            Ok(()) => {
                seen_names.insert(entry.name.clone());
                jobs.push(Job {
                    id: Uuid::new_v4(),
                    name: entry.name,
                    enabled: entry.enabled,
                    cron_spec: entry.schedule,
                    provider_ref: entry.provider,
                    params: entry.params,
                    output: entry.output,
                    status: if entry.enabled {
                        JobStatus::Pending
                    } else {
                        JobStatus::Disabled
                    },
                    last_run: None,
                    next_run: None,
                    run_count: 0,
                    error_count: 0,
                    last_error: None,
                });
            }
            Err(reason) => {
                warn!(job = %entry.name, reason, "dropping invalid job from config");
            }
        }
    }

    Ok(jobs)
}

fn validate_entry(entry: &JobConfigEntry, seen_names: &HashSet<String>) -> Result<(), String> {
    if entry.name.trim().is_empty() {
        return Err("job name must not be empty".to_string());
    }
    if seen_names.contains(&entry.name) {
        return Err(format!("duplicate job name {:?}", entry.name));
    }
    if entry.schedule.trim().is_empty() {
        return Err("cron schedule must not be empty".to_string());
    }
    if Schedule::from_str(&entry.schedule).is_err() {
        return Err(format!("unparseable 6-field cron schedule {:?}", entry.schedule));
    }
    if entry.provider.name.trim().is_empty() {
        return Err("provider.name must not be empty".to_string());
    }
    if entry.provider.provider_type.trim().is_empty() {
        return Err("provider.type must not be empty".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_DOC: &str = r#"
jobs:
  - name: a-share-quotes
    enabled: true
    schedule: "*/10 * * * * *"
    provider: { name: vendor-t, type: RealtimeStock }
    params:
      symbols: ["600000", "000001"]
    output: { type: stock_realtime, stream: "stock:stream:stock_realtime" }
"#;

    #[test]
    fn parses_a_valid_document() {
        let jobs = parse_jobs(VALID_DOC).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name, "a-share-quotes");
        assert_eq!(jobs[0].status, JobStatus::Pending);
        assert_eq!(jobs[0].symbols().unwrap(), vec!["600000", "000001"]);
    }

    #[test]
    fn drops_job_with_empty_name() {
        let doc = r#"
jobs:
  - name: ""
    schedule: "* * * * * *"
    provider: { name: t, type: RealtimeStock }
"#;
        assert!(parse_jobs(doc).unwrap().is_empty());
    }

    #[test]
    fn drops_job_with_unparseable_schedule() {
        let doc = r#"
jobs:
  - name: bad
    schedule: "not a cron expression"
    provider: { name: t, type: RealtimeStock }
"#;
        assert!(parse_jobs(doc).unwrap().is_empty());
    }

    #[test]
    fn drops_duplicate_job_names_keeping_the_first() {
        let doc = r#"
jobs:
  - name: dup
    schedule: "* * * * * *"
    provider: { name: t, type: RealtimeStock }
  - name: dup
    schedule: "*/5 * * * * *"
    provider: { name: s, type: RealtimeStock }
"#;
        let jobs = parse_jobs(doc).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].cron_spec, "* * * * * *");
    }

    #[test]
    fn drops_job_missing_provider_fields() {
        let doc = r#"
jobs:
  - name: no-provider-name
    schedule: "* * * * * *"
    provider: { name: "", type: RealtimeStock }
"#;
        assert!(parse_jobs(doc).unwrap().is_empty());
    }

    #[test]
    fn disabled_job_defaults_to_disabled_status() {
        let doc = r#"
jobs:
  - name: off
    enabled: false
    schedule: "* * * * * *"
    provider: { name: t, type: RealtimeStock }
"#;
        let jobs = parse_jobs(doc).unwrap();
        assert_eq!(jobs[0].status, JobStatus::Disabled);
    }
}
