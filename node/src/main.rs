mod bootstrap;
mod cli;

use clap::Parser;
use cli::Cli;
use common::{init_logger, LogFormat};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let log_format: LogFormat = cli.log_format.into();
    init_logger("fetcher-node", &cli.log_level, log_format);

    if let Err(err) = bootstrap::run(cli).await {
        tracing::error!(%err, "fatal init failure");
        std::process::exit(1);
    }
}
