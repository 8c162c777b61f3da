//! Wire model of the township forecast feed.
//!
//! Shape: `records.Locations[].Location[].WeatherElement[].Time[].ElementValue[]`.
//! Containers default to empty so that a payload without `records` (or with an
//! empty `Locations` array) decodes to a feed with nothing to transform.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of a time slot's `ElementValue` array, e.g.
/// `{"Temperature": "20"}` or `{"Weather": "多雲", "WeatherCode": "04"}`.
pub type ElementValue = Map<String, Value>;

/// Root document returned by the forecast endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastFeed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<FeedRecords>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedRecords {
    #[serde(rename = "Locations", default)]
    pub locations: Vec<LocationGroup>,
}

/// A dataset grouping (the feed publishes one group per county dataset).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationGroup {
    #[serde(rename = "LocationsName", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Location", default)]
    pub location: Vec<Location>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "LocationName")]
    pub location_name: String,
    #[serde(rename = "WeatherElement", default)]
    pub weather_element: Vec<WeatherElement>,
}

/// A named forecast quantity reported as a series of time slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherElement {
    #[serde(rename = "ElementName")]
    pub element_name: String,
    #[serde(rename = "Time", default)]
    pub time: Vec<TimeSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    #[serde(rename = "StartTime", default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(rename = "EndTime", default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(rename = "ElementValue", default)]
    pub element_value: Vec<ElementValue>,
}

impl ForecastFeed {
    /// Locations of the first dataset group, or an empty slice.
    pub fn locations(&self) -> &[Location] {
        self.records
            .as_ref()
            .and_then(|r| r.locations.first())
            .map(|g| g.location.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.locations().is_empty()
    }
}
