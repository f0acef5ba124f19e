use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a [`Job`]. Status is the only field mutated while
/// the scheduler runs it; everything else is fixed at config-load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Stopped,
    Error,
    Disabled,
}

/// `{name, type}` reference into the provider registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRef {
    pub name: String,
    #[serde(rename = "type")]
    pub provider_type: String,
}

/// The optional `output` block from the job config document
/// Only `stream` is consumed by the executor today;
/// `directory` is parsed and ignored — archival is out of scope
/// but the document shape still round-trips it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    #[serde(rename = "type", default)]
    pub output_type: Option<String>,
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub directory: Option<String>,
}

/// A scheduled unit of work.
///
/// Created on config load, destroyed on shutdown or explicit removal.
/// `status`/`last_run`/`next_run`/`run_count`/`error_count`/`last_error`
/// are the only fields mutated during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub name: String,
    pub enabled: bool,
    pub cron_spec: String,
    pub provider_ref: ProviderRef,
    pub params: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub output: Option<OutputSpec>,
    #[serde(default = "default_status")]
    pub status: JobStatus,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_run: Option<DateTime<Utc>>,
    #[serde(default)]
    pub run_count: u64,
    #[serde(default)]
    pub error_count: u64,
    #[serde(default)]
    pub last_error: Option<String>,
}

fn default_status() -> JobStatus {
    JobStatus::Pending
}

impl Job {
    /// Extract `params["symbols"]` as an ordered list of strings,
    /// accepting either a list of strings or a list of mixed scalars
    /// coerced to strings.
    pub fn symbols(&self) -> Result<Vec<String>, String> {
        let value = self
            .params
            .get("symbols")
            .ok_or_else(|| "missing params.symbols".to_string())?;

        let arr = value
            .as_array()
            .ok_or_else(|| "params.symbols must be an array".to_string())?;

        if arr.is_empty() {
            return Err("params.symbols must not be empty".to_string());
        }

        arr.iter()
            .map(|v| match v {
                serde_json::Value::String(s) => Ok(s.clone()),
                serde_json::Value::Number(n) => Ok(n.to_string()),
                serde_json::Value::Bool(b) => Ok(b.to_string()),
                other => Err(format!("unsupported symbol value: {other:?}")),
            })
            .collect()
    }
}
