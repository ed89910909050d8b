//! Input loading and report output.

pub mod encoding;
pub mod export;
pub mod loader;

pub use encoding::{decode, decode_with, TextEncoding, DEFAULT_ENCODINGS};
pub use export::{ForecastCsvSink, JsonSink, MetricsCsvSink, ReportSink};
pub use loader::{parse_date, DataLoader, DATE_COLUMN};
