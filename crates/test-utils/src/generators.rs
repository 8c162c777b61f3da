//! Synthetic feed generators.
//!
//! Values are derived from the location and window index so tests can check
//! that every element ended up in the right record:
//! - average temperature = `10 + location + window`
//! - max / min = average ± 3
//! - precipitation = `(window * 10) % 100`, except every fourth window which
//!   carries the `"-"` sentinel

use serde_json::Value;

use crate::fixtures::{elements, feed, LocationBuilder};

/// Start of the `index`-th 12-hour window, in the feed's timestamp format.
pub fn window_start(index: usize) -> String {
    let day = 1 + index / 2;
    let hour = if index % 2 == 0 { 6 } else { 18 };
    format!("2024-01-{:02}T{:02}:00:00+08:00", day, hour)
}

pub fn window_end(index: usize) -> String {
    window_start(index + 1)
}

pub fn expected_avg_temp(location: usize, window: usize) -> f64 {
    (10 + location + window) as f64
}

/// Expected precipitation after sentinel coercion.
pub fn expected_pop(window: usize) -> i64 {
    if window % 4 == 3 {
        0
    } else {
        ((window * 10) % 100) as i64
    }
}

fn raw_pop(window: usize) -> String {
    if window % 4 == 3 {
        "-".to_string()
    } else {
        ((window * 10) % 100).to_string()
    }
}

/// Name of the `index`-th generated location.
pub fn location_name(index: usize) -> String {
    format!("Township-{:03}", index)
}

/// Build a feed with `locations` × `windows` forecast windows.
///
/// Element series are emitted with windows in descending order so that
/// consumers must sort them.
pub fn create_test_feed(locations: usize, windows: usize) -> Value {
    let locations: Vec<Value> = (0..locations)
        .map(|loc| {
            let starts: Vec<String> = (0..windows).rev().map(window_start).collect();
            let ends: Vec<String> = (0..windows).rev().map(window_end).collect();
            let avg: Vec<String> = (0..windows)
                .rev()
                .map(|w| expected_avg_temp(loc, w).to_string())
                .collect();
            let max: Vec<String> = (0..windows)
                .rev()
                .map(|w| (expected_avg_temp(loc, w) + 3.0).to_string())
                .collect();
            let min: Vec<String> = (0..windows)
                .rev()
                .map(|w| (expected_avg_temp(loc, w) - 3.0).to_string())
                .collect();
            let pop: Vec<String> = (0..windows).rev().map(raw_pop).collect();

            let triples = |values: &[String]| -> Vec<(String, String, String)> {
                starts
                    .iter()
                    .zip(&ends)
                    .zip(values)
                    .map(|((s, e), v)| (s.clone(), e.clone(), v.clone()))
                    .collect()
            };

            let mut builder = LocationBuilder::new(&location_name(loc));
            for (element, values) in [
                (elements::AVG_TEMPERATURE, &avg),
                (elements::MAX_TEMPERATURE, &max),
                (elements::MIN_TEMPERATURE, &min),
                (elements::PRECIPITATION_PROBABILITY, &pop),
            ] {
                let owned = triples(values);
                let borrowed: Vec<(&str, &str, &str)> = owned
                    .iter()
                    .map(|(s, e, v)| (s.as_str(), e.as_str(), v.as_str()))
                    .collect();
                builder = builder.element(element, &borrowed);
            }
            builder.build()
        })
        .collect();

    feed(locations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_start_sequence() {
        assert_eq!(window_start(0), "2024-01-01T06:00:00+08:00");
        assert_eq!(window_start(1), "2024-01-01T18:00:00+08:00");
        assert_eq!(window_start(2), "2024-01-02T06:00:00+08:00");
        assert_eq!(window_end(1), window_start(2));
    }

    #[test]
    fn test_window_starts_sort_lexicographically() {
        let starts: Vec<String> = (0..14).map(window_start).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn test_expected_pop_sentinel() {
        assert_eq!(expected_pop(0), 0);
        assert_eq!(expected_pop(1), 10);
        assert_eq!(expected_pop(3), 0);
        assert_eq!(raw_pop(3), "-");
    }

    #[test]
    fn test_create_test_feed_shape() {
        let payload = create_test_feed(3, 4);
        let locations = payload["records"]["Locations"][0]["Location"]
            .as_array()
            .unwrap();
        assert_eq!(locations.len(), 3);
        assert_eq!(locations[2]["LocationName"], "Township-002");
        assert_eq!(locations[0]["WeatherElement"].as_array().unwrap().len(), 4);
        assert_eq!(
            locations[0]["WeatherElement"][0]["Time"].as_array().unwrap().len(),
            4
        );
    }
}
