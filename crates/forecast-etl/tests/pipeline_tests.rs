//! End-to-end tests for the forecast pipeline.
//!
//! A local axum server stands in for the forecast feed so the full
//! fetch → transform → store/export path runs without network access.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use forecast_etl::export::{HEADERS, UTF8_BOM};
use forecast_etl::{
    EtlConfig, EtlError, FetchError, ForecastFeed, ForecastPipeline, ForecastRecord,
    ForecastStore, SinkOutcome,
};
use test_utils::{
    assert_approx_eq, create_test_feed, empty_locations, expected_avg_temp, expected_pop,
    location_name, no_records, require_test_file, sink_paths, taipei_two_slots,
    taipei_two_slots_revised, temp_test_dir,
};

// ============================================================================
// Mock feed
// ============================================================================

type SharedPayload = Arc<Mutex<Value>>;

async fn feed_handler(State(payload): State<SharedPayload>) -> Json<Value> {
    Json(payload.lock().unwrap().clone())
}

async fn unavailable_handler() -> impl IntoResponse {
    (StatusCode::SERVICE_UNAVAILABLE, "feed under maintenance")
}

async fn garbage_handler() -> impl IntoResponse {
    (StatusCode::OK, "<html>not json</html>")
}

async fn auth_handler(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    match params.get("Authorization").map(String::as_str) {
        Some("CWA-TEST-KEY") => Json(taipei_two_slots()).into_response(),
        _ => (StatusCode::UNAUTHORIZED, "missing key").into_response(),
    }
}

async fn slow_handler() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(taipei_two_slots())
}

/// Start the mock feed and return its base URL plus a handle to swap the payload.
async fn spawn_feed(initial: Value) -> (String, SharedPayload) {
    let payload: SharedPayload = Arc::new(Mutex::new(initial));

    let app = Router::new()
        .route("/feed", get(feed_handler))
        .route("/unavailable", get(unavailable_handler))
        .route("/garbage", get(garbage_handler))
        .route("/auth", get(auth_handler))
        .route("/slow", get(slow_handler))
        .with_state(payload.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), payload)
}

fn config_for(url: String, dir: &Path) -> EtlConfig {
    let (db, csv) = sink_paths(dir);
    let mut config = EtlConfig::default();
    config.feed.url = url;
    config.feed.timeout_secs = 1;
    config.store.path = db;
    config.export.path = csv;
    config
}

fn read_csv(path: &Path) -> Vec<Vec<String>> {
    let bytes = fs::read(path).unwrap();
    assert!(bytes.starts_with(UTF8_BOM), "export must start with a BOM");

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(&bytes[UTF8_BOM.len()..]);
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

async fn stored_records(path: &PathBuf) -> Vec<ForecastRecord> {
    let store = ForecastStore::open(path).await.unwrap();
    let records = store.load_records().await.unwrap();
    store.close().await;
    records
}

fn decode(payload: Value) -> ForecastFeed {
    serde_json::from_value(payload).unwrap()
}

// ============================================================================
// Fetch → load
// ============================================================================

#[tokio::test]
async fn test_taipei_example_end_to_end() {
    let dir = temp_test_dir();
    let (base, _) = spawn_feed(taipei_two_slots()).await;
    let config = config_for(format!("{}/feed", base), dir.path());

    let pipeline = ForecastPipeline::new(&config).unwrap();
    let summary = pipeline.run_once().await.unwrap();

    assert_eq!(summary.record_count, 2);
    assert_eq!(summary.store, SinkOutcome::Written(2));
    assert_eq!(summary.export, SinkOutcome::Written(2));
    assert!(summary.is_success());

    let stored = stored_records(&config.store.path).await;
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].start_time, "2024-01-01T00:00");
    assert_eq!(stored[0].avg_temp, Some(20.0));
    assert_eq!(stored[0].pop, 30);
    assert_eq!(stored[1].start_time, "2024-01-01T12:00");
    assert_eq!(stored[1].pop, 0);

    let rows = read_csv(&config.export.path);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], HEADERS.map(str::to_string).to_vec());
    assert_eq!(rows[1][1], "2024-01-01T00:00");
    assert_eq!(rows[2][6], "0");
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let dir = temp_test_dir();
    let (base, _) = spawn_feed(taipei_two_slots()).await;
    let config = config_for(format!("{}/feed", base), dir.path());
    let pipeline = ForecastPipeline::new(&config).unwrap();

    pipeline.run_once().await.unwrap();
    let first = stored_records(&config.store.path).await;
    let first_csv = fs::read(&config.export.path).unwrap();

    pipeline.run_once().await.unwrap();
    let second = stored_records(&config.store.path).await;

    assert_eq!(second.len(), 2);
    assert_eq!(first, second);
    assert_eq!(fs::read(&config.export.path).unwrap(), first_csv);
}

#[tokio::test]
async fn test_later_fetch_replaces_rows() {
    let dir = temp_test_dir();
    let (base, payload) = spawn_feed(taipei_two_slots()).await;
    let config = config_for(format!("{}/feed", base), dir.path());
    let pipeline = ForecastPipeline::new(&config).unwrap();

    pipeline.run_once().await.unwrap();
    *payload.lock().unwrap() = taipei_two_slots_revised();
    pipeline.run_once().await.unwrap();

    let stored = stored_records(&config.store.path).await;
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].avg_temp, Some(19.0));
    assert_eq!(stored[0].pop, 60);
    assert_eq!(stored[1].pop, 70);

    let rows = read_csv(&config.export.path);
    assert_eq!(rows[1][3], "19");
}

#[tokio::test]
async fn test_empty_feed_after_data_leaves_sinks_untouched() {
    let dir = temp_test_dir();
    let (base, payload) = spawn_feed(taipei_two_slots()).await;
    let config = config_for(format!("{}/feed", base), dir.path());
    let pipeline = ForecastPipeline::new(&config).unwrap();

    pipeline.run_once().await.unwrap();
    let csv_before = fs::read(&config.export.path).unwrap();

    *payload.lock().unwrap() = empty_locations();
    let summary = pipeline.run_once().await.unwrap();

    assert!(summary.is_empty());
    assert!(summary.is_success());
    assert_eq!(summary.store, SinkOutcome::Skipped);
    assert_eq!(summary.export, SinkOutcome::Skipped);
    assert_eq!(stored_records(&config.store.path).await.len(), 2);
    assert_eq!(fs::read(&config.export.path).unwrap(), csv_before);
}

#[tokio::test]
async fn test_empty_feed_on_first_run_creates_nothing() {
    let dir = temp_test_dir();
    let (base, _) = spawn_feed(no_records()).await;
    let config = config_for(format!("{}/feed", base), dir.path());

    let summary = ForecastPipeline::new(&config)
        .unwrap()
        .run_once()
        .await
        .unwrap();

    assert_eq!(summary.record_count, 0);
    assert!(!config.store.path.exists());
    assert!(!config.export.path.exists());
}

// ============================================================================
// Fetch failures
// ============================================================================

#[tokio::test]
async fn test_non_success_status_aborts_run() {
    let dir = temp_test_dir();
    let (base, _) = spawn_feed(taipei_two_slots()).await;
    let config = config_for(format!("{}/unavailable", base), dir.path());

    let err = ForecastPipeline::new(&config)
        .unwrap()
        .run_once()
        .await
        .unwrap_err();

    match err {
        EtlError::FetchFailed(FetchError::Status { status, body }) => {
            assert_eq!(status, 503);
            assert!(body.contains("maintenance"));
        }
        other => panic!("expected status failure, got {other:?}"),
    }
    assert!(!config.store.path.exists());
    assert!(!config.export.path.exists());
}

#[tokio::test]
async fn test_malformed_body_aborts_run() {
    let dir = temp_test_dir();
    let (base, _) = spawn_feed(taipei_two_slots()).await;
    let config = config_for(format!("{}/garbage", base), dir.path());

    let err = ForecastPipeline::new(&config)
        .unwrap()
        .run_once()
        .await
        .unwrap_err();

    assert!(matches!(err, EtlError::FetchFailed(FetchError::Decode(_))));
    assert!(!config.export.path.exists());
}

#[tokio::test]
async fn test_timeout_is_fetch_failure() {
    let dir = temp_test_dir();
    let (base, _) = spawn_feed(taipei_two_slots()).await;
    let config = config_for(format!("{}/slow", base), dir.path());

    let err = ForecastPipeline::new(&config)
        .unwrap()
        .run_once()
        .await
        .unwrap_err();

    match err {
        EtlError::FetchFailed(e) => assert!(e.is_timeout(), "expected timeout, got {e}"),
        other => panic!("expected fetch failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_feed_is_fetch_failure() {
    let dir = temp_test_dir();
    // Bind and drop to get a port nobody listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = config_for(format!("http://127.0.0.1:{}/feed", port), dir.path());

    let err = ForecastPipeline::new(&config)
        .unwrap()
        .run_once()
        .await
        .unwrap_err();
    assert!(matches!(err, EtlError::FetchFailed(FetchError::Request(_))));
}

#[tokio::test]
async fn test_api_key_sent_as_authorization_param() {
    let dir = temp_test_dir();
    let (base, _) = spawn_feed(taipei_two_slots()).await;

    let mut config = config_for(format!("{}/auth", base), dir.path());
    let unauthorized = ForecastPipeline::new(&config)
        .unwrap()
        .run_once()
        .await
        .unwrap_err();
    assert!(matches!(
        unauthorized,
        EtlError::FetchFailed(FetchError::Status { status: 401, .. })
    ));

    config.feed.api_key = Some("CWA-TEST-KEY".to_string());
    let summary = ForecastPipeline::new(&config)
        .unwrap()
        .run_once()
        .await
        .unwrap();
    assert_eq!(summary.record_count, 2);
}

// ============================================================================
// Sink independence
// ============================================================================

#[tokio::test]
async fn test_store_failure_does_not_block_export() {
    let dir = temp_test_dir();
    let mut config = config_for("http://127.0.0.1:9/unused".to_string(), dir.path());
    // A directory cannot be opened as a database
    config.store.path = dir.path().join("db_dir");
    fs::create_dir(&config.store.path).unwrap();

    let summary = ForecastPipeline::new(&config)
        .unwrap()
        .process(&decode(taipei_two_slots()))
        .await;

    assert!(summary.store.is_failed());
    assert_eq!(summary.export, SinkOutcome::Written(2));
    assert!(!summary.is_success());
    assert_eq!(read_csv(&config.export.path).len(), 3);
}

#[tokio::test]
async fn test_export_failure_does_not_block_store() {
    let dir = temp_test_dir();
    let mut config = config_for("http://127.0.0.1:9/unused".to_string(), dir.path());
    config.export.path = dir.path().join("csv_dir");
    fs::create_dir(&config.export.path).unwrap();
    fs::write(config.export.path.join("keep"), b"x").unwrap();

    let summary = ForecastPipeline::new(&config)
        .unwrap()
        .process(&decode(taipei_two_slots()))
        .await;

    assert_eq!(summary.store, SinkOutcome::Written(2));
    assert!(summary.export.is_failed());
    assert_eq!(stored_records(&config.store.path).await.len(), 2);
}

// ============================================================================
// Properties over generated feeds
// ============================================================================

#[tokio::test]
async fn test_generated_feed_ordering_and_round_trip() {
    let dir = temp_test_dir();
    let config = config_for("http://127.0.0.1:9/unused".to_string(), dir.path());
    let (locations, windows) = (4, 9);

    let summary = ForecastPipeline::new(&config)
        .unwrap()
        .process(&decode(create_test_feed(locations, windows)))
        .await;
    assert_eq!(summary.record_count, locations * windows);

    let rows = read_csv(&config.export.path);
    let data = &rows[1..];
    assert_eq!(data.len(), locations * windows);

    // Grouped by location in feed order, windows ascending within each group
    for (loc, group) in data.chunks(windows).enumerate() {
        assert!(group.iter().all(|row| row[0] == location_name(loc)));
        assert!(group.windows(2).all(|pair| pair[0][1] <= pair[1][1]));
    }

    // Every exported row matches a stored row
    let stored = stored_records(&config.store.path).await;
    assert_eq!(stored.len(), data.len());
    for row in data {
        let record = stored
            .iter()
            .find(|r| r.key() == (row[0].as_str(), row[1].as_str()))
            .expect("exported row missing from store");
        assert_eq!(forecast_etl::export::export_row(record).to_vec(), *row);
    }

    for record in &stored {
        assert!(!record.location_name.is_empty());
        assert!(!record.start_time.is_empty());
        let loc: usize = record.location_name["Township-".len()..].parse().unwrap();
        let window = (0..windows)
            .find(|w| test_utils::window_start(*w) == record.start_time)
            .unwrap();
        let avg_temp = record.avg_temp.expect("generated feed sets every average");
        assert_approx_eq!(avg_temp, expected_avg_temp(loc, window), 1e-9);
        assert_approx_eq!(record.max_temp.unwrap() - avg_temp, 3.0, 1e-9);
        assert_approx_eq!(avg_temp - record.min_temp.unwrap(), 3.0, 1e-9);
        assert_eq!(record.pop, expected_pop(window));
    }
}

#[tokio::test]
async fn test_sample_feed_file() {
    let path = require_test_file!("cwa_sample.json");
    let dir = temp_test_dir();
    let config = config_for("http://127.0.0.1:9/unused".to_string(), dir.path());

    let feed: ForecastFeed = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    let summary = ForecastPipeline::new(&config).unwrap().process(&feed).await;
    assert_eq!(summary.record_count, 5);

    let rows = read_csv(&config.export.path);
    let names: Vec<&str> = rows[1..].iter().map(|r| r[0].as_str()).collect();
    assert_eq!(names, vec!["臺北市", "臺北市", "臺北市", "高雄市", "高雄市"]);

    // Kaohsiung has no max/min temperature series
    assert_eq!(rows[4][1], "2024-01-01T06:00:00+08:00");
    assert_eq!(rows[4][3], "26");
    assert_eq!(rows[4][4], "");
    assert_eq!(rows[4][7], "晴時多雲");

    // Precipitation sentinel on Taipei's third window
    assert_eq!(rows[3][6], "0");

    let store = ForecastStore::open(&config.store.path).await.unwrap();
    let points = store.load_points().await.unwrap();
    assert_eq!(points.len(), 5);
    assert_approx_eq!(points[0].avg_temp, 20.0, 1e-9);
    assert_approx_eq!(points[3].avg_temp, 26.0, 1e-9);
    assert_approx_eq!(points[4].avg_temp, 22.0, 1e-9);
    assert!(points.iter().all(|p| p.start_time.offset().local_minus_utc() == 8 * 3600));
    store.close().await;
}
