//! Polling entry point: sends the alert every day at the configured local time.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use weather_alert::{AlertConfig, AlertPipeline, BANNER, Clock, PollingScheduler, SystemClock, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = AlertConfig::load().context("Failed to load configuration")?;
    logging::init(&config.logging)?;

    info!("{}", BANNER);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let pipeline = AlertPipeline::from_config(&config, Arc::clone(&clock))
        .context("Failed to set up alert pipeline")?;
    info!(
        "Alerting {} recipients at {:02}:{:02} local time",
        pipeline.recipients().len(),
        config.schedule.hour,
        config.schedule.minute
    );

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {e}");
            return;
        }
        info!("Shutdown requested");
        shutdown.cancel();
    });

    let scheduler = PollingScheduler::from_config(&config.schedule, clock);
    let pipeline = &pipeline;
    scheduler
        .run(&token, move || async move {
            pipeline.run().await;
        })
        .await;

    Ok(())
}
