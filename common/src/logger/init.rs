use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Wire format for the fmt layer. Mirrors the `--log-format` CLI flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

/// Initialize the global tracing subscriber exactly once.
///
/// `default_level` seeds the filter when `RUST_LOG` is unset; an
/// explicit env var always wins (`EnvFilter::try_from_default_env`).
pub fn init_logger(service_name: &'static str, default_level: &str, format: LogFormat) {
    LOGGER_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

        let builder = fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_line_number(true)
            .with_span_events(fmt::format::FmtSpan::CLOSE);

        match format {
            LogFormat::Json => builder.json().init(),
            LogFormat::Text => builder.init(),
        }

        tracing::info!(service = service_name, "logger initialized");
    });
}
