//! Docchat Bot - Main entry point.

use anyhow::Result;
use docchat_bot::start_server;
use docchat_common::config::Config;
use docchat_common::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    tracing::info!("Docchat Bot v{}", env!("CARGO_PKG_VERSION"));

    // Required credentials must be present before anything connects
    config.validate()?;

    // Start the bot and the HTTP probe
    start_server(&config).await
}
