use anyhow::Result;
use ridercritic_core::{config::Config, server, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let metrics_handle = telemetry::init(&config.telemetry)?;

    info!(
        environment = %config.environment_label(),
        "Starting {} v{}",
        config.app_name,
        config.version
    );

    // Run the server
    server::run(config, metrics_handle).await
}
