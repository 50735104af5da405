//! Triggered entry point: sends the alert once and exits.
//!
//! Meant to be invoked by an external scheduler such as a CI cron job.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use weather_alert::{AlertConfig, AlertPipeline, BANNER, SystemClock, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = AlertConfig::load().context("Failed to load configuration")?;
    logging::init(&config.logging)?;

    info!("{}", BANNER);

    let pipeline = AlertPipeline::from_config(&config, Arc::new(SystemClock))
        .context("Failed to set up alert pipeline")?;
    let report = pipeline.run().await;

    info!(
        "Run finished for {}: {} delivered, {} failed",
        report.place,
        report.delivered_count(),
        report.failed_count()
    );

    Ok(())
}
