//! Run scheduling: a single run, a run over a saved payload, or a poll loop.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use forecast_etl::{EtlConfig, ForecastFeed, ForecastPipeline, RunSummary};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

pub struct Scheduler {
    pipeline: ForecastPipeline,
    poll_interval: Duration,
}

impl Scheduler {
    pub fn new(config: &EtlConfig) -> Result<Self> {
        let pipeline =
            ForecastPipeline::new(config).context("Failed to build forecast pipeline")?;

        Ok(Self {
            pipeline,
            poll_interval: config.schedule.poll_interval(),
        })
    }

    /// Fetch and load once. Fetch failures are returned as errors.
    pub async fn run_once(&self) -> Result<RunSummary> {
        let summary = self.pipeline.run_once().await?;
        log_summary(&summary);
        Ok(summary)
    }

    /// Load a previously saved feed payload instead of calling the endpoint.
    pub async fn run_input(&self, path: &Path) -> Result<RunSummary> {
        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read feed payload: {}", path.display()))?;
        let feed: ForecastFeed = serde_json::from_slice(&content)
            .with_context(|| format!("Failed to decode feed payload: {}", path.display()))?;

        info!(path = %path.display(), "Loading saved feed payload");
        let summary = self.pipeline.process(&feed).await;
        log_summary(&summary);
        Ok(summary)
    }

    /// Run every `poll_interval` until a shutdown signal arrives.
    ///
    /// A failed run is logged and retried on the next tick.
    pub async fn run_forever(&self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            "Starting forecast poll loop"
        );

        loop {
            if let Err(e) = self.run_once().await {
                error!(error = %e, "Scheduled forecast run failed");
            }

            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Shutting down scheduler");
                    break;
                }
                _ = tokio::time::sleep(self.poll_interval) => {
                    // Next run
                }
            }
        }

        Ok(())
    }
}

fn log_summary(summary: &RunSummary) {
    if !summary.is_success() {
        warn!(
            records = summary.record_count,
            store = %summary.store,
            export = %summary.export,
            "Forecast run finished with sink failures"
        );
    }
}
