//! Cleaned tabular dataset: one timestamp axis and named numeric columns.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};

/// A numeric column of a [`Dataset`].
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// Loaded and cleaned input table.
///
/// Timestamps are strictly increasing and every column has one value per
/// timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    timestamps: Vec<DateTime<Utc>>,
    columns: Vec<Column>,
    non_numeric: Vec<String>,
}

impl Dataset {
    /// Create a dataset, validating ordering and column lengths.
    pub fn new(
        timestamps: Vec<DateTime<Utc>>,
        columns: Vec<Column>,
        non_numeric: Vec<String>,
    ) -> Result<Self> {
        if timestamps.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ForecastError::TimestampError(
                "timestamps must be strictly increasing".to_string(),
            ));
        }
        for column in &columns {
            if column.values.len() != timestamps.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: timestamps.len(),
                    got: column.values.len(),
                });
            }
        }
        Ok(Self {
            timestamps,
            columns,
            non_numeric,
        })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Names of numeric columns in file order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Names of columns dropped because they hold non-numeric values.
    pub fn non_numeric_columns(&self) -> &[String] {
        &self.non_numeric
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Check that `name` can be forecast, without copying any data.
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        if let Some(column) = self.columns.iter().find(|c| c.name == name) {
            return Ok(column);
        }
        if self.non_numeric.iter().any(|c| c == name) {
            return Err(ForecastError::Schema(format!(
                "column '{name}' is not numeric"
            )));
        }
        Err(ForecastError::Schema(format!(
            "column '{name}' is absent from the data (available: {})",
            self.column_names().join(", ")
        )))
    }

    /// Extract one column as a [`TimeSeries`].
    pub fn series(&self, name: &str) -> Result<TimeSeries> {
        let column = self.require_column(name)?;
        TimeSeries::new(name, self.timestamps.clone(), column.values.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stamps(n: usize) -> Vec<DateTime<Utc>> {
        (0..n)
            .map(|i| Utc.with_ymd_and_hms(2020, 1 + i as u32, 1, 0, 0, 0).unwrap())
            .collect()
    }

    fn sample() -> Dataset {
        Dataset::new(
            stamps(3),
            vec![
                Column {
                    name: "emissions".into(),
                    values: vec![1.0, 2.0, 3.0],
                },
                Column {
                    name: "output".into(),
                    values: vec![10.0, 20.0, 30.0],
                },
            ],
            vec!["plant".into()],
        )
        .unwrap()
    }

    #[test]
    fn extracts_series() {
        let ds = sample();
        let s = ds.series("output").unwrap();
        assert_eq!(s.name(), "output");
        assert_eq!(s.values(), &[10.0, 20.0, 30.0]);
        assert_eq!(ds.column_names(), vec!["emissions", "output"]);
    }

    #[test]
    fn absent_column_is_schema_error() {
        let err = sample().series("missing").unwrap_err();
        assert!(matches!(err, ForecastError::Schema(msg) if msg.contains("absent")));
    }

    #[test]
    fn non_numeric_column_is_schema_error() {
        let err = sample().require_column("plant").unwrap_err();
        assert!(matches!(err, ForecastError::Schema(msg) if msg.contains("not numeric")));
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = Dataset::new(
            stamps(2),
            vec![Column {
                name: "a".into(),
                values: vec![1.0],
            }],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, ForecastError::DimensionMismatch { .. }));
    }
}
