//! Pipeline configuration.
//!
//! Deserialised from the loader's YAML file; every section has defaults so an
//! empty file (or none at all) yields a runnable configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EtlError, EtlResult};

pub const DEFAULT_FEED_URL: &str =
    "https://opendata.cwa.gov.tw/api/v1/rest/datastore/F-D0047-091";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EtlConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Forecast endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_url")]
    pub url: String,
    /// Sent as the `Authorization` query parameter
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Skip TLS certificate validation for this feed
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            accept_invalid_certs: false,
        }
    }
}

impl FeedConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_csv_path")]
    pub path: PathBuf,
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("weather_data.csv")
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: default_csv_path(),
        }
    }
}

/// Polling settings for the long-running loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    3600
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl ScheduleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl EtlConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> EtlResult<()> {
        if self.feed.url.trim().is_empty() {
            return Err(EtlError::Config("feed.url must not be empty".to_string()));
        }
        if self.feed.timeout_secs == 0 {
            return Err(EtlError::Config(
                "feed.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.store.path.as_os_str().is_empty() {
            return Err(EtlError::Config("store.path must not be empty".to_string()));
        }
        if self.export.path.as_os_str().is_empty() {
            return Err(EtlError::Config("export.path must not be empty".to_string()));
        }
        if self.schedule.poll_interval_secs == 0 {
            return Err(EtlError::Config(
                "schedule.poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
