//! Forecast structures: raw estimator output and labelled results.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};

/// Point predictions produced by a [`Forecaster`](crate::models::Forecaster).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    point: Vec<f64>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { point: values }
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Get the point predictions.
    pub fn primary(&self) -> &[f64] {
        &self.point
    }

    pub fn into_values(self) -> Vec<f64> {
        self.point
    }
}

/// Forecast of one strategy aligned to its future timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    strategy: String,
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl ForecastResult {
    pub fn new(
        strategy: impl Into<String>,
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }
        Ok(Self {
            strategy: strategy.into(),
            timestamps,
            values,
        })
    }

    /// Strategy label, e.g. `"SARIMA"`.
    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Same strategy and timestamps, values passed through `f`.
    pub fn map_values<F>(&self, f: F) -> ForecastResult
    where
        F: FnOnce(&[f64]) -> Vec<f64>,
    {
        let values = f(&self.values);
        debug_assert_eq!(values.len(), self.values.len());
        ForecastResult {
            strategy: self.strategy.clone(),
            timestamps: self.timestamps.clone(),
            values,
        }
    }
}
