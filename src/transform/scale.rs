//! Min-max scaling for a single column.
//!
//! The scaler is fitted once per request and the same [`ScalerState`] must be
//! used to invert every forecast and historical value.
//!
//! x_scaled = (x - min) / (max - min)

use crate::core::{ForecastResult, TimeSeries};
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// What to do when the fitted column has zero range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstantColumnPolicy {
    /// Fail with [`ForecastError::DegenerateRange`].
    #[default]
    Reject,
    /// Use a unit range: every value maps to 0 and inverts exactly.
    Passthrough,
}

/// Parameters captured at fit time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScalerState {
    min: f64,
    max: f64,
    scale: f64,
}

impl ScalerState {
    /// Observed minimum.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Observed maximum.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Divisor applied after the shift; `max - min` unless the range was degenerate.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Map values into the fitted [0, 1] range.
    pub fn transform(&self, data: &[f64]) -> Vec<f64> {
        data.iter().map(|&x| (x - self.min) / self.scale).collect()
    }

    /// Map scaled values back to original units. Extrapolates linearly.
    pub fn inverse_transform(&self, data: &[f64]) -> Vec<f64> {
        data.iter().map(|&x| x * self.scale + self.min).collect()
    }

    /// Invert a scaled series, keeping its axis.
    pub fn inverse_series(&self, series: &TimeSeries) -> Result<TimeSeries> {
        series.with_values(self.inverse_transform(series.values()))
    }

    /// Invert the values of a forecast produced on the scaled series.
    pub fn inverse_forecast(&self, result: &ForecastResult) -> ForecastResult {
        result.map_values(|v| self.inverse_transform(v))
    }
}

/// Min-max scaler with a configurable constant-column policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinMaxScaler {
    policy: ConstantColumnPolicy,
}

impl MinMaxScaler {
    pub fn new(policy: ConstantColumnPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ConstantColumnPolicy {
        self.policy
    }

    /// Fit on `values`, labelled `column` for error messages.
    pub fn fit(&self, column: &str, values: &[f64]) -> Result<ScalerState> {
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "column '{column}' contains non-finite value {bad}"
            )));
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;

        let scale = if range > 0.0 {
            range
        } else {
            match self.policy {
                ConstantColumnPolicy::Reject => {
                    return Err(ForecastError::DegenerateRange {
                        column: column.to_string(),
                        value: min,
                    })
                }
                ConstantColumnPolicy::Passthrough => {
                    log::warn!("column '{column}' is constant ({min}); scaling with unit range");
                    1.0
                }
            }
        };

        Ok(ScalerState { min, max, scale })
    }

    /// Fit on the series and return the scaled copy with its state.
    pub fn fit_transform(&self, series: &TimeSeries) -> Result<(TimeSeries, ScalerState)> {
        let state = self.fit(series.name(), series.values())?;
        let scaled = series.with_values(state.transform(series.values()))?;
        log::debug!(
            "scaled '{}' from [{}, {}] into [0, 1]",
            series.name(),
            state.min,
            state.max
        );
        Ok((scaled, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn series(values: Vec<f64>) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let stamps = (0..values.len())
            .map(|i| crate::core::calendar::add_months(base, i as u32).unwrap())
            .collect();
        TimeSeries::new("emissions", stamps, values).unwrap()
    }

    #[test]
    fn normalize_basic() {
        let state = MinMaxScaler::default()
            .fit("x", &[0.0, 25.0, 50.0, 75.0, 100.0])
            .unwrap();
        let data = state.transform(&[0.0, 50.0, 100.0]);

        assert_relative_eq!(data[0], 0.0, epsilon = 1e-10);
        assert_relative_eq!(data[1], 0.5, epsilon = 1e-10);
        assert_relative_eq!(data[2], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn normalize_negative_values() {
        let state = MinMaxScaler::default().fit("x", &[-10.0, 0.0, 10.0]).unwrap();
        let data = state.transform(&[-10.0, 0.0, 10.0]);

        assert_relative_eq!(data[0], 0.0, epsilon = 1e-10);
        assert_relative_eq!(data[1], 0.5, epsilon = 1e-10);
        assert_relative_eq!(data[2], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn inverse_round_trip() {
        let values = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        let state = MinMaxScaler::default().fit("x", &values).unwrap();
        let recovered = state.inverse_transform(&state.transform(&values));

        for (orig, rec) in values.iter().zip(recovered.iter()) {
            assert_relative_eq!(orig, rec, epsilon = 1e-10);
        }
    }

    #[test]
    fn inverse_extrapolates_linearly() {
        let state = MinMaxScaler::default().fit("x", &[100.0, 200.0]).unwrap();
        let out = state.inverse_transform(&[-0.5, 1.5]);
        assert_relative_eq!(out[0], 50.0, epsilon = 1e-10);
        assert_relative_eq!(out[1], 250.0, epsilon = 1e-10);
    }

    #[test]
    fn constant_column_rejected_by_default() {
        let err = MinMaxScaler::default().fit("emissions", &[5.0; 10]).unwrap_err();
        assert_eq!(
            err,
            ForecastError::DegenerateRange {
                column: "emissions".into(),
                value: 5.0
            }
        );
    }

    #[test]
    fn constant_column_passthrough() {
        let scaler = MinMaxScaler::new(ConstantColumnPolicy::Passthrough);
        let state = scaler.fit("x", &[5.0; 4]).unwrap();
        let scaled = state.transform(&[5.0; 4]);
        assert!(scaled.iter().all(|&x| x == 0.0));
        assert_eq!(state.inverse_transform(&scaled), vec![5.0; 4]);
    }

    #[test]
    fn empty_and_non_finite_inputs() {
        let scaler = MinMaxScaler::default();
        assert_eq!(scaler.fit("x", &[]), Err(ForecastError::EmptyData));
        assert!(matches!(
            scaler.fit("x", &[1.0, f64::NAN]),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn fit_transform_series() {
        let (scaled, state) = MinMaxScaler::default()
            .fit_transform(&series(vec![2.0, 4.0, 6.0]))
            .unwrap();
        assert_eq!(scaled.values(), &[0.0, 0.5, 1.0]);
        assert_eq!(scaled.name(), "emissions");
        assert_eq!(state.min(), 2.0);
        assert_eq!(state.max(), 6.0);

        let back = state.inverse_series(&scaled).unwrap();
        assert_eq!(back.values(), &[2.0, 4.0, 6.0]);
    }

    #[test]
    fn inverse_forecast_keeps_axis() {
        let (scaled, state) = MinMaxScaler::default()
            .fit_transform(&series(vec![0.0, 10.0]))
            .unwrap();
        let future = scaled.future_timestamps(2).unwrap();
        let result = ForecastResult::new("SARIMA", future.clone(), vec![0.5, 1.2]).unwrap();
        let restored = state.inverse_forecast(&result);

        assert_eq!(restored.timestamps(), future.as_slice());
        assert_relative_eq!(restored.values()[0], 5.0, epsilon = 1e-10);
        assert_relative_eq!(restored.values()[1], 12.0, epsilon = 1e-10);
    }
}
