//! Additive trend plus yearly seasonality regression.
//!
//! A piecewise-linear trend with automatically placed changepoints is summed
//! with a yearly Fourier series and fitted by penalized least squares:
//!
//! `y(t) = k·t + m + Σ δ_j (t - c_j)₊ + Σ [a_n sin(2πnτ) + b_n cos(2πnτ)]`
//!
//! where `t` is time scaled to `[0, 1]` over the history and `τ` is time in
//! years. Daily and weekly components are not modelled.

use crate::core::{calendar, Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::ridge::{ridge_fit, RidgeFit};
use chrono::{DateTime, Utc};
use std::f64::consts::PI;

/// Settings for [`AdditiveTrendSeasonal`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSeasonalConfig {
    /// Maximum number of trend changepoints.
    pub n_changepoints: usize,
    /// Fraction of the history in which changepoints may be placed.
    pub changepoint_range: f64,
    /// Number of yearly Fourier pairs.
    pub yearly_order: usize,
    /// L2 penalty on changepoint slope adjustments.
    pub changepoint_penalty: f64,
    /// L2 penalty on Fourier coefficients.
    pub seasonality_penalty: f64,
}

impl Default for TrendSeasonalConfig {
    fn default() -> Self {
        Self {
            n_changepoints: 25,
            changepoint_range: 0.8,
            yearly_order: 10,
            changepoint_penalty: 10.0,
            seasonality_penalty: 0.01,
        }
    }
}

impl TrendSeasonalConfig {
    pub fn n_changepoints(mut self, n: usize) -> Self {
        self.n_changepoints = n;
        self
    }

    pub fn yearly_order(mut self, order: usize) -> Self {
        self.yearly_order = order;
        self
    }

    pub fn changepoint_penalty(mut self, penalty: f64) -> Self {
        self.changepoint_penalty = penalty;
        self
    }
}

/// Time scaling and changepoints learned from the training history.
#[derive(Debug, Clone)]
struct TimeAxis {
    start: i64,
    span: f64,
    changepoints: Vec<f64>,
}

impl TimeAxis {
    fn scaled(&self, ts: DateTime<Utc>) -> f64 {
        (ts.timestamp() - self.start) as f64 / self.span
    }
}

/// Additive trend/seasonality forecaster.
#[derive(Debug, Clone, Default)]
pub struct AdditiveTrendSeasonal {
    config: TrendSeasonalConfig,
    axis: Option<TimeAxis>,
    fit: Option<RidgeFit>,
    last_timestamp: Option<DateTime<Utc>>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl AdditiveTrendSeasonal {
    pub fn new(config: TrendSeasonalConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &TrendSeasonalConfig {
        &self.config
    }

    /// Changepoint locations on the scaled time axis.
    pub fn changepoints(&self) -> Option<&[f64]> {
        self.axis.as_ref().map(|a| a.changepoints.as_slice())
    }

    /// Evenly spaced changepoints within the first `changepoint_range` of the history.
    fn place_changepoints(&self, scaled: &[f64]) -> Vec<f64> {
        let hist = (scaled.len() as f64 * self.config.changepoint_range).floor() as usize;
        if hist < 2 {
            return Vec::new();
        }
        let count = self.config.n_changepoints.min(hist - 1);
        if count == 0 {
            return Vec::new();
        }
        let last = (hist - 1) as f64;
        (1..=count)
            .map(|j| {
                let idx = (j as f64 * last / count as f64).round() as usize;
                scaled[idx]
            })
            .collect()
    }

    fn design(&self, axis: &TimeAxis, timestamps: &[DateTime<Utc>]) -> Vec<Vec<f64>> {
        let t: Vec<f64> = timestamps.iter().map(|&ts| axis.scaled(ts)).collect();
        let years: Vec<f64> = timestamps
            .iter()
            .map(|&ts| calendar::years_since_epoch(ts))
            .collect();

        let mut columns = Vec::with_capacity(2 + axis.changepoints.len() + 2 * self.config.yearly_order);
        columns.push(vec![1.0; t.len()]);
        columns.push(t.clone());
        for &c in &axis.changepoints {
            columns.push(t.iter().map(|&x| (x - c).max(0.0)).collect());
        }
        for n in 1..=self.config.yearly_order {
            let freq = 2.0 * PI * n as f64;
            columns.push(years.iter().map(|y| (freq * y).sin()).collect());
            columns.push(years.iter().map(|y| (freq * y).cos()).collect());
        }
        columns
    }

    fn penalties(&self, axis: &TimeAxis) -> Vec<f64> {
        let mut penalties = vec![0.0, 0.0];
        penalties.extend(std::iter::repeat(self.config.changepoint_penalty).take(axis.changepoints.len()));
        penalties.extend(std::iter::repeat(self.config.seasonality_penalty).take(2 * self.config.yearly_order));
        penalties
    }
}

impl Forecaster for AdditiveTrendSeasonal {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        let timestamps = series.timestamps();
        if values.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: values.len(),
            });
        }
        if self.config.changepoint_penalty < 0.0 || self.config.seasonality_penalty < 0.0 {
            return Err(ForecastError::InvalidParameter(
                "penalties must be non-negative".into(),
            ));
        }

        let start = timestamps[0].timestamp();
        let end = timestamps[timestamps.len() - 1].timestamp();
        let mut axis = TimeAxis {
            start,
            span: (end - start).max(1) as f64,
            changepoints: Vec::new(),
        };
        let scaled: Vec<f64> = timestamps.iter().map(|&ts| axis.scaled(ts)).collect();
        axis.changepoints = self.place_changepoints(&scaled);

        let columns = self.design(&axis, timestamps);
        let fit = ridge_fit(&columns, values, &self.penalties(&axis))?;
        let fitted = fit.predict(&columns)?;
        let residuals = values.iter().zip(&fitted).map(|(y, f)| y - f).collect();

        log::debug!(
            "trend/seasonality fit: {} changepoints, {} Fourier pairs",
            axis.changepoints.len(),
            self.config.yearly_order
        );

        self.last_timestamp = series.last_timestamp();
        self.axis = Some(axis);
        self.fit = Some(fit);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let axis = self.axis.as_ref().ok_or(ForecastError::FitRequired)?;
        let fit = self.fit.as_ref().ok_or(ForecastError::FitRequired)?;
        let last = self.last_timestamp.ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let future = calendar::month_starts_after(last, horizon)?;
        let predictions = fit.predict(&self.design(axis, &future))?;
        Ok(Forecast::from_values(predictions))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "AdditiveTrendSeasonal"
    }
}
