//! Report sinks for presentation layers.

use crate::error::{ForecastError, Result};
use crate::report::Report;
use serde::Serialize;
use std::io::Write;

/// Renders a [`Report`] to a byte stream.
pub trait ReportSink {
    fn write(&self, report: &Report, out: &mut dyn Write) -> Result<()>;
}

/// Whole report as a JSON document, with the chart lines included.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSink {
    pub pretty: bool,
}

impl JsonSink {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    #[serde(flatten)]
    report: &'a Report,
    chart: crate::report::Chart,
}

impl ReportSink for JsonSink {
    fn write(&self, report: &Report, out: &mut dyn Write) -> Result<()> {
        let document = JsonDocument {
            report,
            chart: report.chart(),
        };
        let written = if self.pretty {
            serde_json::to_writer_pretty(&mut *out, &document)
        } else {
            serde_json::to_writer(&mut *out, &document)
        };
        written.map_err(|err| ForecastError::Io(err.to_string()))?;
        writeln!(out)?;
        Ok(())
    }
}

/// Metrics table: `date,value,anomaly,cluster`; missing labels are empty cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCsvSink;

impl ReportSink for MetricsCsvSink {
    fn write(&self, report: &Report, out: &mut dyn Write) -> Result<()> {
        write_rows(report.metrics_rows(), out)
    }
}

/// Forecast table: `date,value,model`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForecastCsvSink;

impl ReportSink for ForecastCsvSink {
    fn write(&self, report: &Report, out: &mut dyn Write) -> Result<()> {
        write_rows(&report.forecasts, out)
    }
}

fn write_rows<T: Serialize>(rows: &[T], out: &mut dyn Write) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer
            .serialize(row)
            .map_err(|err| ForecastError::Io(err.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::AnomalyLabel;
    use crate::report::{ForecastRow, HistoricalRow};
    use chrono::{TimeZone, Utc};

    fn report() -> Report {
        let jan = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let feb = Utc.with_ymd_and_hms(2022, 2, 1, 0, 0, 0).unwrap();
        Report {
            column: "emissions".into(),
            horizon: 1,
            historical: vec![
                HistoricalRow {
                    date: jan,
                    value: 4.5,
                    anomaly: Some(AnomalyLabel::Anomaly),
                    cluster: Some(2),
                },
                HistoricalRow {
                    date: feb,
                    value: 3.0,
                    anomaly: None,
                    cluster: None,
                },
            ],
            forecasts: vec![ForecastRow {
                date: Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap(),
                value: 3.25,
                model: "SARIMA".into(),
            }],
            strategies: vec!["SARIMA".into()],
            skipped: Vec::new(),
        }
    }

    fn render(sink: &dyn ReportSink) -> String {
        let mut out = Vec::new();
        sink.write(&report(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn metrics_csv() {
        assert_eq!(
            render(&MetricsCsvSink),
            "date,value,anomaly,cluster\n2022-01-01,4.5,anomaly,2\n2022-02-01,3.0,,\n"
        );
    }

    #[test]
    fn forecast_csv() {
        assert_eq!(
            render(&ForecastCsvSink),
            "date,value,model\n2022-03-01,3.25,SARIMA\n"
        );
    }

    #[test]
    fn json_document_includes_chart() {
        let json: serde_json::Value = serde_json::from_str(&render(&JsonSink::pretty())).unwrap();
        assert_eq!(json["column"], "emissions");
        assert_eq!(json["forecasts"][0]["value"], 3.25);
        assert_eq!(json["chart"]["forecasts"][0]["label"], "SARIMA");
        assert!(json["historical"][1]["anomaly"].is_null());
    }
}
