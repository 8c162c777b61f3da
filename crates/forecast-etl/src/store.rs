//! Forecast persistence using SQLite with sqlx.
//!
//! The table carries a `UNIQUE(location_name, start_time) ON CONFLICT REPLACE`
//! constraint, so re-inserting a window overwrites every column of the old row.
//! A refresh is written in a single transaction.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info, warn};

use crate::error::EtlResult;
use crate::record::{parse_timestamp, ForecastPoint, ForecastRecord};

pub const TABLE_NAME: &str = "weather_forecast";

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS weather_forecast (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        location_name TEXT NOT NULL,
        start_time TEXT NOT NULL,
        end_time TEXT NOT NULL,
        avg_temp REAL,
        max_temp REAL,
        min_temp REAL,
        pop INTEGER NOT NULL DEFAULT 0,
        weather_desc TEXT,
        weather_code TEXT,
        UNIQUE(location_name, start_time) ON CONFLICT REPLACE
    )
"#;

const INSERT_RECORD: &str = r#"
    INSERT INTO weather_forecast
        (location_name, start_time, end_time, avg_temp, max_temp, min_temp, pop, weather_desc, weather_code)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

type RecordRow = (
    String,
    String,
    String,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    i64,
    Option<String>,
    Option<String>,
);

/// Handle on the forecast database.
pub struct ForecastStore {
    pool: SqlitePool,
}

impl ForecastStore {
    /// Open or create the forecast database at the given path.
    pub async fn open(path: &Path) -> EtlResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;

        debug!(path = %path.display(), "Opened forecast database");
        Ok(Self { pool })
    }

    /// Open an in-memory database (for testing).
    pub async fn open_memory() -> EtlResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Upsert all records in one transaction.
    ///
    /// Any failing insert rolls back the whole batch.
    pub async fn upsert(&self, records: &[ForecastRecord]) -> EtlResult<usize> {
        let mut tx = self.pool.begin().await?;

        for record in records {
            sqlx::query(INSERT_RECORD)
                .bind(&record.location_name)
                .bind(&record.start_time)
                .bind(&record.end_time)
                .bind(record.avg_temp)
                .bind(record.max_temp)
                .bind(record.min_temp)
                .bind(record.pop)
                .bind(&record.weather_desc)
                .bind(&record.weather_code)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(records.len())
    }

    /// Number of stored windows.
    pub async fn count(&self) -> EtlResult<u64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM weather_forecast")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 as u64)
    }

    /// All stored records, grouped by location and ordered by window start.
    pub async fn load_records(&self) -> EtlResult<Vec<ForecastRecord>> {
        let rows: Vec<RecordRow> = sqlx::query_as(
            r#"
            SELECT location_name, start_time, end_time, avg_temp, max_temp, min_temp,
                   pop, weather_desc, weather_code
            FROM weather_forecast
            ORDER BY location_name ASC, start_time ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let records = rows
            .into_iter()
            .map(|row| ForecastRecord {
                location_name: row.0,
                start_time: row.1,
                end_time: row.2,
                avg_temp: row.3,
                max_temp: row.4,
                min_temp: row.5,
                pop: row.6,
                weather_desc: row.7,
                weather_code: row.8,
            })
            .collect();

        Ok(records)
    }

    /// Temperature and precipitation series for charting.
    ///
    /// Rows whose start time is not RFC 3339 or whose values are null are dropped.
    pub async fn load_points(&self) -> EtlResult<Vec<ForecastPoint>> {
        let rows: Vec<(String, String, Option<f64>, Option<i64>)> = sqlx::query_as(
            "SELECT location_name, start_time, avg_temp, pop FROM weather_forecast \
             ORDER BY location_name ASC, start_time ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let total = rows.len();
        let points: Vec<ForecastPoint> = rows
            .into_iter()
            .filter_map(|(location_name, start_time, avg_temp, pop)| {
                Some(ForecastPoint {
                    location_name,
                    start_time: parse_timestamp(&start_time)?,
                    avg_temp: avg_temp?,
                    pop: pop? as f64,
                })
            })
            .collect();

        if points.len() < total {
            debug!(
                dropped = total - points.len(),
                kept = points.len(),
                "Dropped rows that failed coercion"
            );
        }

        Ok(points)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// Store sink: open the database, upsert the batch, close it again.
///
/// An empty batch never touches the database, so a failed or empty fetch
/// cannot create an empty table as a side effect.
pub async fn write_records(path: &Path, records: &[ForecastRecord]) -> EtlResult<usize> {
    if records.is_empty() {
        debug!(path = %path.display(), "No records, skipping store write");
        return Ok(0);
    }

    let store = ForecastStore::open(path).await?;
    let result = store.upsert(records).await;
    store.close().await;

    match result {
        Ok(written) => {
            info!(path = %path.display(), records = written, "Updated forecast store");
            Ok(written)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Store batch rolled back");
            Err(e)
        }
    }
}
