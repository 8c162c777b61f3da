//! CSV export of forecast records.
//!
//! The file is UTF-8 with a byte-order mark so spreadsheet tools open the
//! localized header and weather descriptions without mangling them. It is
//! regenerated on every run: rows are written to a sibling temp file that then
//! replaces the target.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{EtlError, EtlResult};
use crate::record::ForecastRecord;

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Location, start, end, average/max/min temperature, precipitation
/// probability (%), weather description, weather code.
pub const HEADERS: [&str; 9] = [
    "地點",
    "開始時間",
    "結束時間",
    "平均溫度",
    "最高溫度",
    "最低溫度",
    "降雨機率(%)",
    "天氣現象",
    "天氣代碼",
];

/// Render a record as a CSV row in header order. Absent values are empty cells.
pub fn export_row(record: &ForecastRecord) -> [String; 9] {
    [
        record.location_name.clone(),
        record.start_time.clone(),
        record.end_time.clone(),
        format_number(record.avg_temp),
        format_number(record.max_temp),
        format_number(record.min_temp),
        record.pop.to_string(),
        record.weather_desc.clone().unwrap_or_default(),
        record.weather_code.clone().unwrap_or_default(),
    ]
}

fn format_number(value: Option<f64>) -> String {
    // f64's Display already drops a zero fraction: 20.0 -> "20"
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Export sink: overwrite `path` with a header row plus one row per record.
///
/// An empty batch leaves any existing file untouched.
pub fn write_csv(path: &Path, records: &[ForecastRecord]) -> EtlResult<usize> {
    if records.is_empty() {
        debug!(path = %path.display(), "No records, skipping export");
        return Ok(0);
    }

    write_rows(path, records).map_err(|source| EtlError::ExportWriteFailed {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), rows = records.len(), "Exported forecast CSV");
    Ok(records.len())
}

fn write_rows(path: &Path, records: &[ForecastRecord]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(UTF8_BOM)?;

    {
        let mut writer = csv::Writer::from_writer(&mut tmp);
        writer.write_record(HEADERS)?;
        for record in records {
            writer.write_record(export_row(record))?;
        }
        writer.flush()?;
    }

    tmp.persist(path)?;
    Ok(())
}
