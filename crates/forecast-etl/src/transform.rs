//! Flattens the nested feed into one record per (location, forecast window).
//!
//! Each location is accumulated in a map keyed by the slot's `StartTime`, so
//! element series that share a window land in the same record. Extraction from
//! the map yields records in ascending `start_time` order; locations keep the
//! order in which the feed lists them.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, info};

use crate::feed::{ElementValue, ForecastFeed, Location};
use crate::record::ForecastRecord;

pub const AVG_TEMPERATURE: &str = "平均溫度";
pub const MAX_TEMPERATURE: &str = "最高溫度";
pub const MIN_TEMPERATURE: &str = "最低溫度";
pub const PRECIPITATION_PROBABILITY: &str = "12小時降雨機率";
pub const WEATHER_PHENOMENON: &str = "天氣現象";

type Assign = fn(&mut ForecastRecord, &ElementValue);

/// Maps a feed element name onto the record field(s) it fills.
struct ElementRoute {
    element: &'static str,
    assign: Assign,
}

const ELEMENT_ROUTES: &[ElementRoute] = &[
    ElementRoute {
        element: AVG_TEMPERATURE,
        assign: assign_avg_temp,
    },
    ElementRoute {
        element: MAX_TEMPERATURE,
        assign: assign_max_temp,
    },
    ElementRoute {
        element: MIN_TEMPERATURE,
        assign: assign_min_temp,
    },
    ElementRoute {
        element: PRECIPITATION_PROBABILITY,
        assign: assign_pop,
    },
    ElementRoute {
        element: WEATHER_PHENOMENON,
        assign: assign_weather,
    },
];

fn assign_avg_temp(record: &mut ForecastRecord, value: &ElementValue) {
    record.avg_temp = number_field(value, "Temperature");
}

fn assign_max_temp(record: &mut ForecastRecord, value: &ElementValue) {
    record.max_temp = number_field(value, "MaxTemperature");
}

fn assign_min_temp(record: &mut ForecastRecord, value: &ElementValue) {
    record.min_temp = number_field(value, "MinTemperature");
}

fn assign_pop(record: &mut ForecastRecord, value: &ElementValue) {
    record.pop = coerce_pop(text_field(value, "ProbabilityOfPrecipitation").as_deref());
}

fn assign_weather(record: &mut ForecastRecord, value: &ElementValue) {
    record.weather_desc = text_field(value, "Weather");
    record.weather_code = text_field(value, "WeatherCode");
}

fn route_for(element_name: &str) -> Option<&'static ElementRoute> {
    ELEMENT_ROUTES.iter().find(|r| r.element == element_name)
}

/// Read a value as text. The feed sends strings, but numbers are accepted too.
fn text_field(value: &ElementValue, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_field(value: &ElementValue, key: &str) -> Option<f64> {
    text_field(value, key)?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Precipitation probability is kept only when it is a plain run of digits;
/// anything else (absent, `"-"`, decimals) becomes 0.
pub fn coerce_pop(raw: Option<&str>) -> i64 {
    match raw {
        Some(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse().unwrap_or(0)
        }
        _ => 0,
    }
}

/// Flatten the whole feed.
///
/// A feed with no `records` or no locations yields an empty vector.
pub fn flatten(feed: &ForecastFeed) -> Vec<ForecastRecord> {
    if feed.is_empty() {
        debug!("Feed carries no locations");
        return Vec::new();
    }

    let locations = feed.locations();
    let mut records = Vec::new();

    for location in locations {
        records.extend(flatten_location(location));
    }

    info!(
        locations = locations.len(),
        records = records.len(),
        "Flattened forecast feed"
    );
    records
}

/// Flatten a single location into records sorted by `start_time`.
pub fn flatten_location(location: &Location) -> Vec<ForecastRecord> {
    let mut windows: BTreeMap<String, ForecastRecord> = BTreeMap::new();

    for element in &location.weather_element {
        let route = route_for(&element.element_name);
        if route.is_none() {
            debug!(
                location = %location.location_name,
                element = %element.element_name,
                "Ignoring unrecognized weather element"
            );
        }

        for slot in &element.time {
            let Some(start_time) = &slot.start_time else {
                debug!(
                    location = %location.location_name,
                    element = %element.element_name,
                    "Skipping time slot without a start time"
                );
                continue;
            };
            let end_time = slot.end_time.as_deref().unwrap_or_default();

            let record = windows.entry(start_time.clone()).or_insert_with(|| {
                ForecastRecord::new(&location.location_name, start_time, end_time)
            });
            // A window first seen without an end takes it from a later element
            if record.end_time.is_empty() && !end_time.is_empty() {
                record.end_time = end_time.to_string();
            }

            if let (Some(route), Some(value)) = (route, slot.element_value.first()) {
                (route.assign)(record, value);
            }
        }
    }

    windows.into_values().collect()
}
