//! AQI Vision
//!
//! Terminal dashboard that estimates air quality from a camera frame or the
//! current position, backed by the AQI estimation service.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use aqi_vision::shell::DashboardTui;
use aqi_vision::telemetry::init_logging;
use aqi_vision::{Config, Dashboard};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", Config::usage());
        return Ok(());
    }

    let config = Config::from_env()
        .and_then(|c| c.with_args(&args))
        .with_context(|| Config::usage().to_string())?;

    let _log_guard = init_logging(&config.log_dir).context("Failed to initialize logging")?;
    info!("Starting AQI Vision against {}", config.backend_url);

    let dashboard = Arc::new(Dashboard::from_config(&config).context("Failed to prepare camera")?);
    DashboardTui::new(dashboard).run().await
}
