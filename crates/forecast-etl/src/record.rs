//! Flat forecast records produced by the transformer and consumed by both sinks.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One row per `(location_name, start_time)` forecast window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub location_name: String,
    pub start_time: String,
    pub end_time: String,
    pub avg_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
    /// Probability of precipitation in percent. Never null.
    pub pop: i64,
    pub weather_desc: Option<String>,
    pub weather_code: Option<String>,
}

impl ForecastRecord {
    /// An empty window with every element still unset.
    pub fn new(location_name: &str, start_time: &str, end_time: &str) -> Self {
        Self {
            location_name: location_name.to_string(),
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            avg_temp: None,
            max_temp: None,
            min_temp: None,
            pop: 0,
            weather_desc: None,
            weather_code: None,
        }
    }

    /// Identity of the record in the store.
    pub fn key(&self) -> (&str, &str) {
        (&self.location_name, &self.start_time)
    }
}

/// Read model used by charting consumers of the store: only rows whose time
/// and numbers coerce cleanly are kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub location_name: String,
    pub start_time: DateTime<FixedOffset>,
    pub avg_temp: f64,
    pub pop: f64,
}

/// Parse a feed timestamp. Only RFC 3339 with an explicit offset is accepted,
/// and the offset is kept.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value.trim()).ok()
}
