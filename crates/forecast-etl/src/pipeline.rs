//! Fetch → transform → {store, export} run.
//!
//! A fetch failure aborts the run before anything is written. The two sinks
//! receive the same record slice and are written independently: a failing
//! store does not prevent the export and vice versa.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::config::EtlConfig;
use crate::error::{EtlError, EtlResult};
use crate::export;
use crate::feed::ForecastFeed;
use crate::fetch::FeedClient;
use crate::store;
use crate::transform;

/// What happened to one sink during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SinkOutcome {
    Written(usize),
    /// Nothing to write; the sink was not opened
    Skipped,
    Failed(String),
}

impl SinkOutcome {
    fn from_result(result: EtlResult<usize>) -> Self {
        match result {
            Ok(0) => Self::Skipped,
            Ok(n) => Self::Written(n),
            Err(e) => Self::Failed(e.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for SinkOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Written(n) => write!(f, "written ({} rows)", n),
            Self::Skipped => write!(f, "skipped"),
            Self::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub record_count: usize,
    pub store: SinkOutcome,
    pub export: SinkOutcome,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        !self.store.is_failed() && !self.export.is_failed()
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}

pub struct ForecastPipeline {
    client: FeedClient,
    store_path: PathBuf,
    export_path: PathBuf,
}

impl ForecastPipeline {
    pub fn new(config: &EtlConfig) -> EtlResult<Self> {
        config.validate()?;
        let client = FeedClient::new(config.feed.clone())?;

        Ok(Self {
            client,
            store_path: config.store.path.clone(),
            export_path: config.export.path.clone(),
        })
    }

    /// Fetch the feed and load it into both sinks.
    ///
    /// Only a fetch failure is returned as an error; sink failures are part of
    /// the summary.
    #[instrument(skip(self), fields(url = %self.client.url()))]
    pub async fn run_once(&self) -> EtlResult<RunSummary> {
        let feed = match self.client.fetch().await {
            Ok(feed) => feed,
            Err(e) => {
                error!(
                    error = %e,
                    status = ?e.status(),
                    timeout = e.is_timeout(),
                    "Forecast fetch failed, nothing written"
                );
                return Err(EtlError::FetchFailed(e));
            }
        };

        Ok(self.process(&feed).await)
    }

    /// Transform an already-decoded feed and load it into both sinks.
    pub async fn process(&self, feed: &ForecastFeed) -> RunSummary {
        let records = transform::flatten(feed);

        if records.is_empty() {
            info!(reason = %EtlError::EmptyPayload, "Nothing to load, sinks left untouched");
        }

        let store = SinkOutcome::from_result(store::write_records(&self.store_path, &records).await);
        if let SinkOutcome::Failed(e) = &store {
            warn!(path = %self.store_path.display(), error = %e, "Store sink failed");
        }

        let export = SinkOutcome::from_result(export::write_csv(&self.export_path, &records));
        if let SinkOutcome::Failed(e) = &export {
            warn!(path = %self.export_path.display(), error = %e, "Export sink failed");
        }

        let summary = RunSummary {
            record_count: records.len(),
            store,
            export,
        };

        info!(
            records = summary.record_count,
            store = %summary.store,
            export = %summary.export,
            "Forecast run complete"
        );
        summary
    }
}
