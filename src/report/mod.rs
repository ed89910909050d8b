//! Report assembly.
//!
//! Joins the original-scale history with its labels and the denormalized
//! forecasts into row-oriented tables that presentation sinks render.

use crate::core::{ForecastResult, TimeSeries};
use crate::detection::AnomalyLabel;
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Date rendering used by every report table.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

mod day_format {
    use super::DATE_FORMAT;
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&raw, DATE_FORMAT)
            .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
            .map_err(serde::de::Error::custom)
    }
}

/// One historical observation with its labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRow {
    #[serde(with = "day_format")]
    pub date: DateTime<Utc>,
    pub value: f64,
    pub anomaly: Option<AnomalyLabel>,
    pub cluster: Option<usize>,
}

/// One forecast value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    #[serde(with = "day_format")]
    pub date: DateTime<Utc>,
    pub value: f64,
    pub model: String,
}

/// A strategy that produced no forecast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedStrategy {
    pub strategy: String,
    pub reason: String,
}

/// A named line for plotting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLine {
    pub label: String,
    pub dates: Vec<String>,
    pub values: Vec<f64>,
}

/// Historical line plus one line per strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    pub historical: ChartLine,
    pub forecasts: Vec<ChartLine>,
}

/// The assembled report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub column: String,
    pub horizon: usize,
    pub historical: Vec<HistoricalRow>,
    pub forecasts: Vec<ForecastRow>,
    /// Labels of strategies that produced forecasts, in request order
    pub strategies: Vec<String>,
    pub skipped: Vec<SkippedStrategy>,
}

impl Report {
    /// Forecast values of one strategy, in date order.
    pub fn forecast_values(&self, strategy: &str) -> Option<Vec<f64>> {
        if !self.strategies.iter().any(|s| s == strategy) {
            return None;
        }
        Some(
            self.forecasts
                .iter()
                .filter(|r| r.model == strategy)
                .map(|r| r.value)
                .collect(),
        )
    }

    /// Rows of the metrics table: date, value, anomaly, cluster.
    pub fn metrics_rows(&self) -> &[HistoricalRow] {
        &self.historical
    }

    /// Lines for a chart of history and forecasts.
    pub fn chart(&self) -> Chart {
        let historical = ChartLine {
            label: "historical".to_string(),
            dates: self
                .historical
                .iter()
                .map(|r| r.date.format(DATE_FORMAT).to_string())
                .collect(),
            values: self.historical.iter().map(|r| r.value).collect(),
        };

        let forecasts = self
            .strategies
            .iter()
            .map(|strategy| {
                let rows: Vec<&ForecastRow> =
                    self.forecasts.iter().filter(|r| &r.model == strategy).collect();
                ChartLine {
                    label: strategy.clone(),
                    dates: rows
                        .iter()
                        .map(|r| r.date.format(DATE_FORMAT).to_string())
                        .collect(),
                    values: rows.iter().map(|r| r.value).collect(),
                }
            })
            .collect();

        Chart {
            title: format!("{} forecast", self.column),
            historical,
            forecasts,
        }
    }

    pub fn anomaly_count(&self) -> usize {
        self.historical
            .iter()
            .filter(|r| r.anomaly.is_some_and(AnomalyLabel::is_anomaly))
            .count()
    }
}

/// Builds a [`Report`] from pipeline outputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportAssembler;

impl ReportAssembler {
    /// Assemble a report.
    ///
    /// `historical` and `forecasts` must already be in original units. The
    /// first forecast fixes the horizon; its date axis is the month starts
    /// after the last historical timestamp, and every other forecast must
    /// carry exactly that axis.
    ///
    /// # Errors
    /// `Alignment` when a label set or forecast does not line up.
    pub fn build(
        column: &str,
        historical: &TimeSeries,
        forecasts: &[ForecastResult],
        anomalies: Option<&[AnomalyLabel]>,
        clusters: Option<&[usize]>,
        skipped: Vec<(String, String)>,
    ) -> Result<Report> {
        let n = historical.len();
        if let Some(labels) = anomalies {
            check_len("anomaly labels", n, labels.len())?;
        }
        if let Some(labels) = clusters {
            check_len("cluster labels", n, labels.len())?;
        }

        let horizon = forecasts.first().map_or(0, ForecastResult::len);
        let axis = historical.future_timestamps(horizon)?;
        for forecast in forecasts {
            let what = format!("forecast '{}'", forecast.strategy());
            check_len(&what, horizon, forecast.len())?;
            if forecast.timestamps() != axis.as_slice() {
                return Err(ForecastError::Alignment {
                    what: format!("{what} dates"),
                    expected: horizon,
                    got: forecast
                        .timestamps()
                        .iter()
                        .zip(&axis)
                        .filter(|(a, b)| a == b)
                        .count(),
                });
            }
        }

        let historical_rows = historical
            .timestamps()
            .iter()
            .zip(historical.values())
            .enumerate()
            .map(|(i, (&date, &value))| HistoricalRow {
                date,
                value,
                anomaly: anomalies.map(|a| a[i]),
                cluster: clusters.map(|c| c[i]),
            })
            .collect();

        let forecast_rows = forecasts
            .iter()
            .flat_map(|f| {
                axis.iter().zip(f.values()).map(|(&date, &value)| ForecastRow {
                    date,
                    value,
                    model: f.strategy().to_string(),
                })
            })
            .collect();

        Ok(Report {
            column: column.to_string(),
            horizon,
            historical: historical_rows,
            forecasts: forecast_rows,
            strategies: forecasts.iter().map(|f| f.strategy().to_string()).collect(),
            skipped: skipped
                .into_iter()
                .map(|(strategy, reason)| SkippedStrategy { strategy, reason })
                .collect(),
        })
    }
}

fn check_len(what: &str, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(ForecastError::Alignment {
            what: what.to_string(),
            expected,
            got,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calendar;
    use chrono::TimeZone;

    fn ymd(y: i32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, 1, 0, 0, 0).unwrap()
    }

    fn history() -> TimeSeries {
        let timestamps = (0..6)
            .map(|i| calendar::add_months(ymd(2021, 7), i).unwrap())
            .collect();
        TimeSeries::univariate(timestamps, vec![10.0, 12.0, 11.0, 30.0, 13.0, 12.5]).unwrap()
    }

    fn forecast(label: &str, values: Vec<f64>) -> ForecastResult {
        let axis = history().future_timestamps(values.len()).unwrap();
        ForecastResult::new(label, axis, values).unwrap()
    }

    #[test]
    fn builds_rows_and_tables() {
        let anomalies = [
            AnomalyLabel::Normal,
            AnomalyLabel::Normal,
            AnomalyLabel::Normal,
            AnomalyLabel::Anomaly,
            AnomalyLabel::Normal,
            AnomalyLabel::Normal,
        ];
        let clusters = [0, 1, 0, 2, 1, 1];
        let report = ReportAssembler::build(
            "emissions",
            &history(),
            &[forecast("SARIMA", vec![12.0, 12.2]), forecast("Holt-Winters", vec![11.9, 12.1])],
            Some(&anomalies),
            Some(&clusters),
            vec![("Prophet".into(), "computation error: singular".into())],
        )
        .unwrap();

        assert_eq!(report.horizon, 2);
        assert_eq!(report.metrics_rows().len(), 6);
        assert_eq!(report.anomaly_count(), 1);
        assert_eq!(report.historical[3].cluster, Some(2));
        assert_eq!(report.forecasts.len(), 4);
        assert_eq!(report.forecasts[0].date, ymd(2022, 1));
        assert_eq!(report.forecasts[1].date, ymd(2022, 2));
        assert_eq!(report.forecast_values("Holt-Winters"), Some(vec![11.9, 12.1]));
        assert_eq!(report.forecast_values("Prophet"), None);
        assert_eq!(report.skipped[0].strategy, "Prophet");
    }

    #[test]
    fn missing_labels_stay_missing() {
        let report = ReportAssembler::build(
            "x",
            &history(),
            &[forecast("SARIMA", vec![1.0])],
            None,
            None,
            Vec::new(),
        )
        .unwrap();
        assert!(report.historical.iter().all(|r| r.anomaly.is_none() && r.cluster.is_none()));
    }

    #[test]
    fn misaligned_labels_rejected() {
        let err = ReportAssembler::build(
            "x",
            &history(),
            &[forecast("SARIMA", vec![1.0])],
            None,
            Some(&[0, 1, 2]),
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ForecastError::Alignment {
                what: "cluster labels".into(),
                expected: 6,
                got: 3
            }
        );
    }

    #[test]
    fn forecasts_must_share_the_reference_axis() {
        let err = ReportAssembler::build(
            "x",
            &history(),
            &[forecast("SARIMA", vec![1.0, 2.0]), forecast("Prophet", vec![1.0])],
            None,
            None,
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ForecastError::Alignment { expected: 2, got: 1, .. }));

        let shifted = ForecastResult::new("Prophet", vec![ymd(2022, 2), ymd(2022, 3)], vec![1.0, 2.0])
            .unwrap();
        let err = ReportAssembler::build(
            "x",
            &history(),
            &[forecast("SARIMA", vec![1.0, 2.0]), shifted],
            None,
            None,
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ForecastError::Alignment { .. }));
    }

    #[test]
    fn chart_has_one_line_per_strategy() {
        let report = ReportAssembler::build(
            "emissions",
            &history(),
            &[forecast("SARIMA", vec![1.0, 2.0]), forecast("Prophet", vec![3.0, 4.0])],
            None,
            None,
            Vec::new(),
        )
        .unwrap();
        let chart = report.chart();
        assert_eq!(chart.historical.values.len(), 6);
        assert_eq!(chart.forecasts.len(), 2);
        assert_eq!(chart.forecasts[1].label, "Prophet");
        assert_eq!(chart.forecasts[1].dates, vec!["2022-01-01", "2022-02-01"]);
    }

    #[test]
    fn serializes_dates_as_days() {
        let report = ReportAssembler::build(
            "x",
            &history(),
            &[forecast("SARIMA", vec![1.5])],
            Some(&[AnomalyLabel::Normal; 6]),
            None,
            Vec::new(),
        )
        .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["forecasts"][0]["date"], "2022-01-01");
        assert_eq!(json["forecasts"][0]["model"], "SARIMA");
        assert_eq!(json["historical"][0]["anomaly"], "normal");
        assert!(json["historical"][0]["cluster"].is_null());

        let back: Report = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}
