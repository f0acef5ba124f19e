use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, ValueEnum};
use common::LogFormat;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Json,
    Text,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Text => LogFormat::Text,
        }
    }
}

#[derive(Debug, Parser)]
#[clap(name = "fetcher-node", version)]
pub struct Cli {
    /// Path to the job config document (YAML).
    #[clap(long, default_value = "config/jobs.yaml")]
    pub config: String,

    /// Bus address, `host:port`.
    #[clap(long, default_value = "localhost:6379")]
    pub redis: String,

    /// Bus auth password, if the deployment requires one.
    #[clap(long = "redis-pass", env = "FETCHER_REDIS_PASS")]
    pub redis_pass: Option<String>,

    /// Stable identifier for this node; auto-generated when absent.
    #[clap(long)]
    pub node_id: Option<String>,

    #[clap(long, default_value = "info")]
    pub log_level: String,

    #[clap(long, value_enum, default_value = "json")]
    pub log_format: LogFormatArg,
}

/// `fetcher-<unix-epoch>` when `--node-id` was not given.
pub fn node_id_or_generate(explicit: Option<String>) -> String {
    explicit.unwrap_or_else(|| {
        let epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        format!("fetcher-{epoch}")
    })
}
