//! Feed payload fixtures.
//!
//! Payloads are built as `serde_json::Value` so they can be handed to the
//! transformer directly or served over HTTP by a mock feed.

use serde_json::{json, Value};

/// Element names as published by the feed.
pub mod elements {
    pub const AVG_TEMPERATURE: &str = "平均溫度";
    pub const MAX_TEMPERATURE: &str = "最高溫度";
    pub const MIN_TEMPERATURE: &str = "最低溫度";
    pub const PRECIPITATION_PROBABILITY: &str = "12小時降雨機率";
    pub const WEATHER_PHENOMENON: &str = "天氣現象";
    /// Published by the feed but not loaded
    pub const UV_INDEX: &str = "紫外線指數";
}

/// `ElementValue` key for each element.
pub fn value_key(element: &str) -> &'static str {
    match element {
        elements::AVG_TEMPERATURE => "Temperature",
        elements::MAX_TEMPERATURE => "MaxTemperature",
        elements::MIN_TEMPERATURE => "MinTemperature",
        elements::PRECIPITATION_PROBABILITY => "ProbabilityOfPrecipitation",
        elements::WEATHER_PHENOMENON => "Weather",
        elements::UV_INDEX => "UVIndex",
        _ => "Value",
    }
}

/// One time slot with a single value entry.
pub fn slot(start: &str, end: &str, value: Value) -> Value {
    json!({
        "StartTime": start,
        "EndTime": end,
        "ElementValue": [value],
    })
}

/// Builder for a single location's element blocks.
#[derive(Debug, Clone)]
pub struct LocationBuilder {
    name: String,
    elements: Vec<Value>,
}

impl LocationBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            elements: Vec::new(),
        }
    }

    /// Add an element block from `(start, end, raw value)` triples.
    pub fn element(mut self, element: &str, slots: &[(&str, &str, &str)]) -> Self {
        let key = value_key(element);
        let time: Vec<Value> = slots
            .iter()
            .map(|(start, end, raw)| slot(start, end, json!({ key: raw })))
            .collect();
        self.elements.push(json!({
            "ElementName": element,
            "Time": time,
        }));
        self
    }

    /// Add a weather phenomenon block from `(start, end, description, code)`.
    pub fn weather(mut self, slots: &[(&str, &str, &str, &str)]) -> Self {
        let time: Vec<Value> = slots
            .iter()
            .map(|(start, end, desc, code)| {
                slot(start, end, json!({ "Weather": desc, "WeatherCode": code }))
            })
            .collect();
        self.elements.push(json!({
            "ElementName": elements::WEATHER_PHENOMENON,
            "Time": time,
        }));
        self
    }

    pub fn build(self) -> Value {
        json!({
            "LocationName": self.name,
            "WeatherElement": self.elements,
        })
    }
}

/// Wrap locations in the full `records.Locations[0].Location` envelope.
pub fn feed(locations: Vec<Value>) -> Value {
    json!({
        "success": "true",
        "records": {
            "Locations": [{
                "DatasetDescription": "臺灣各縣市鄉鎮未來1週天氣預報",
                "LocationsName": "臺灣",
                "Location": locations,
            }]
        }
    })
}

/// One location, two 12-hour windows, second precipitation value is the `"-"` sentinel.
///
/// Windows are listed out of order on purpose.
pub fn taipei_two_slots() -> Value {
    feed(vec![LocationBuilder::new("Taipei")
        .element(
            elements::AVG_TEMPERATURE,
            &[
                ("2024-01-01T12:00", "2024-01-02T00:00", "22"),
                ("2024-01-01T00:00", "2024-01-01T12:00", "20"),
            ],
        )
        .element(
            elements::PRECIPITATION_PROBABILITY,
            &[
                ("2024-01-01T00:00", "2024-01-01T12:00", "30"),
                ("2024-01-01T12:00", "2024-01-02T00:00", "-"),
            ],
        )
        .build()])
}

/// Same windows as [`taipei_two_slots`] with different values.
pub fn taipei_two_slots_revised() -> Value {
    feed(vec![LocationBuilder::new("Taipei")
        .element(
            elements::AVG_TEMPERATURE,
            &[
                ("2024-01-01T00:00", "2024-01-01T12:00", "19"),
                ("2024-01-01T12:00", "2024-01-02T00:00", "21"),
            ],
        )
        .element(
            elements::PRECIPITATION_PROBABILITY,
            &[
                ("2024-01-01T00:00", "2024-01-01T12:00", "60"),
                ("2024-01-01T12:00", "2024-01-02T00:00", "70"),
            ],
        )
        .build()])
}

/// Valid response with an empty `Locations` array.
pub fn empty_locations() -> Value {
    json!({ "success": "true", "records": { "Locations": [] } })
}

/// Valid response without a `records` key.
pub fn no_records() -> Value {
    json!({ "success": "true" })
}
