//! CSV loading and cleaning.
//!
//! Input bytes are decoded with the first encoding that accepts them, then
//! parsed as CSV with a required `date` column. Rows with missing cells and
//! exact duplicate rows are dropped, dates become the sorted index, and
//! every other column is kept if all its cells are numeric.

use crate::core::{Column, Dataset};
use crate::error::{ForecastError, Result};
use crate::io::encoding::{decode_with, TextEncoding, DEFAULT_ENCODINGS};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// Name of the required timestamp column.
pub const DATE_COLUMN: &str = "date";

/// Cell spellings read as missing.
const MISSING_MARKERS: [&str; 9] = ["NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A", "-nan"];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Loads tabular data into a cleaned [`Dataset`].
#[derive(Debug, Clone)]
pub struct DataLoader {
    encodings: Vec<TextEncoding>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self {
            encodings: DEFAULT_ENCODINGS.to_vec(),
        }
    }
}

/// One parsed data row.
struct Row {
    line: u64,
    timestamp: DateTime<Utc>,
    cells: Vec<String>,
}

impl DataLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the ordered list of encodings to try.
    pub fn with_encodings(mut self, encodings: Vec<TextEncoding>) -> Self {
        self.encodings = encodings;
        self
    }

    pub fn encodings(&self) -> &[TextEncoding] {
        &self.encodings
    }

    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|err| ForecastError::Io(format!("{}: {err}", path.display())))?;
        log::debug!("read {} bytes from {}", bytes.len(), path.display());
        self.load_bytes(&bytes)
    }

    pub fn load_reader<R: Read>(&self, mut reader: R) -> Result<Dataset> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.load_bytes(&bytes)
    }

    pub fn load_bytes(&self, bytes: &[u8]) -> Result<Dataset> {
        let (text, _) = decode_with(bytes, &self.encodings)?;
        parse_table(&text)
    }
}

fn parse_table(text: &str) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let date_idx = headers
        .iter()
        .position(|h| h == DATE_COLUMN)
        .ok_or_else(|| {
            ForecastError::Schema(format!(
                "required column '{DATE_COLUMN}' not found (headers: {})",
                headers.join(", ")
            ))
        })?;

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    let mut dropped_missing = 0usize;
    let mut dropped_duplicate = 0usize;

    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let cells: Vec<String> = record.iter().map(str::to_string).collect();

        if cells.iter().any(|c| is_missing(c)) {
            dropped_missing += 1;
            continue;
        }
        if !seen.insert(cells.clone()) {
            dropped_duplicate += 1;
            continue;
        }

        let raw_date = &cells[date_idx];
        let timestamp = parse_date(raw_date).ok_or_else(|| {
            ForecastError::Schema(format!("line {line}: cannot parse date '{raw_date}'"))
        })?;
        rows.push(Row {
            line,
            timestamp,
            cells,
        });
    }

    log::debug!(
        "parsed {} rows, dropped {dropped_missing} with missing values and {dropped_duplicate} duplicates",
        rows.len()
    );

    if rows.is_empty() {
        return Err(ForecastError::EmptyData);
    }

    rows.sort_by_key(|r| r.timestamp);
    rows.dedup_by(|later, kept| {
        let same = later.timestamp == kept.timestamp;
        if same {
            log::warn!(
                "line {}: timestamp {} repeats line {} with different values; keeping the first",
                later.line,
                later.timestamp.format("%Y-%m-%d"),
                kept.line
            );
        }
        same
    });

    let mut columns = Vec::new();
    let mut non_numeric = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        if idx == date_idx {
            continue;
        }
        let parsed: Option<Vec<f64>> = rows
            .iter()
            .map(|r| r.cells[idx].parse::<f64>().ok().filter(|v| v.is_finite()))
            .collect();
        match parsed {
            Some(values) => columns.push(Column {
                name: name.clone(),
                values,
            }),
            None => {
                log::debug!("column '{name}' is not numeric");
                non_numeric.push(name.clone());
            }
        }
    }

    let timestamps = rows.iter().map(|r| r.timestamp).collect();
    Dataset::new(timestamps, columns, non_numeric)
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || MISSING_MARKERS.contains(&cell)
}

/// Parse the supported date spellings into UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date.and_time(chrono::NaiveTime::MIN).and_utc());
        }
    }
    // year-month
    NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc())
}
