//! Township weather forecast ETL.
//!
//! Pulls the forecast feed, flattens its per-location / per-element /
//! per-time-slot layout into one [`ForecastRecord`] per forecast window, and
//! loads the result into a SQLite table and a CSV export.
//!
//! ```ignore
//! use forecast_etl::{EtlConfig, ForecastPipeline};
//!
//! let pipeline = ForecastPipeline::new(&EtlConfig::default())?;
//! let summary = pipeline.run_once().await?;
//! println!("{} records, store {}", summary.record_count, summary.store);
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod feed;
pub mod fetch;
pub mod pipeline;
pub mod record;
pub mod store;
pub mod transform;

pub use config::{EtlConfig, ExportConfig, FeedConfig, ScheduleConfig, StoreConfig};
pub use error::{EtlError, EtlResult, FetchError};
pub use feed::ForecastFeed;
pub use fetch::FeedClient;
pub use pipeline::{ForecastPipeline, RunSummary, SinkOutcome};
pub use record::{ForecastPoint, ForecastRecord};
pub use store::ForecastStore;
