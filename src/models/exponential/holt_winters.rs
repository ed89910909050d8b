//! Holt-Winters forecasting model.
//!
//! Exponential smoothing with an additive seasonal component and an
//! optional additive trend.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::mean;

const PARAM_BOUNDS: (f64, f64) = (0.0001, 0.9999);

/// Trend component of the smoothing recursion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendComponent {
    /// Level and season only: `ŷ_{t+h} = l_t + s_{t+h-m}`
    #[default]
    None,
    /// Additive trend: `ŷ_{t+h} = l_t + h*b_t + s_{t+h-m}`
    Additive,
}

/// Holt-Winters forecaster with additive seasonality.
///
/// The model equations:
/// - Level: `l_t = α(y_t - s_{t-m}) + (1-α)(l_{t-1} + b_{t-1})`
/// - Trend: `b_t = β(l_t - l_{t-1}) + (1-β)b_{t-1}`
/// - Seasonal: `s_t = γ(y_t - l_t) + (1-γ)s_{t-m}`
///
/// Without a trend component `b_t` is fixed at zero and β is not estimated.
#[derive(Debug, Clone)]
pub struct HoltWinters {
    /// Level smoothing parameter (0 < alpha < 1).
    alpha: Option<f64>,
    /// Trend smoothing parameter (0 < beta < 1).
    beta: Option<f64>,
    /// Seasonal smoothing parameter (0 < gamma < 1).
    gamma: Option<f64>,
    seasonal_period: usize,
    trend_component: TrendComponent,
    /// Whether to optimize parameters.
    optimize: bool,
    optimizer: NelderMeadConfig,
    level: Option<f64>,
    trend: Option<f64>,
    seasonals: Option<Vec<f64>>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
    /// Original series length.
    n: usize,
}

/// Smoothing state after a pass over the data.
struct SmoothingPass {
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
    fitted: Vec<f64>,
    sse: f64,
}

impl HoltWinters {
    /// Create a model with fixed smoothing parameters.
    pub fn new(
        alpha: f64,
        beta: f64,
        gamma: f64,
        seasonal_period: usize,
        trend_component: TrendComponent,
    ) -> Self {
        Self {
            alpha: Some(alpha.clamp(PARAM_BOUNDS.0, PARAM_BOUNDS.1)),
            beta: Some(beta.clamp(PARAM_BOUNDS.0, PARAM_BOUNDS.1)),
            gamma: Some(gamma.clamp(PARAM_BOUNDS.0, PARAM_BOUNDS.1)),
            optimize: false,
            ..Self::auto(seasonal_period, trend_component)
        }
    }

    /// Create a model whose smoothing parameters are estimated on fit.
    pub fn auto(seasonal_period: usize, trend_component: TrendComponent) -> Self {
        Self {
            alpha: None,
            beta: None,
            gamma: None,
            seasonal_period,
            trend_component,
            optimize: true,
            optimizer: NelderMeadConfig::default(),
            level: None,
            trend: None,
            seasonals: None,
            fitted: None,
            residuals: None,
            residual_variance: None,
            n: 0,
        }
    }

    /// Cap the optimizer's iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.optimizer = self.optimizer.max_iter(max_iter);
        self
    }

    pub fn alpha(&self) -> Option<f64> {
        self.alpha
    }

    pub fn beta(&self) -> Option<f64> {
        self.beta
    }

    pub fn gamma(&self) -> Option<f64> {
        self.gamma
    }

    pub fn seasonal_period(&self) -> usize {
        self.seasonal_period
    }

    pub fn trend_component(&self) -> TrendComponent {
        self.trend_component
    }

    pub fn level(&self) -> Option<f64> {
        self.level
    }

    pub fn trend(&self) -> Option<f64> {
        self.trend
    }

    /// Seasonal indices, one per position in the period.
    pub fn seasonals(&self) -> Option<&[f64]> {
        self.seasonals.as_deref()
    }

    pub fn residual_variance(&self) -> Option<f64> {
        self.residual_variance
    }

    /// Initial state from the first two seasons.
    fn initialize_state(
        values: &[f64],
        period: usize,
        trend_component: TrendComponent,
    ) -> (f64, f64, Vec<f64>) {
        let first_season = &values[..period];
        let level = mean(first_season);

        let trend = match trend_component {
            TrendComponent::None => 0.0,
            TrendComponent::Additive => {
                let sum: f64 = (0..period)
                    .map(|i| (values[period + i] - values[i]) / period as f64)
                    .sum();
                sum / period as f64
            }
        };

        let mut seasonals: Vec<f64> = first_season.iter().map(|y| y - level).collect();
        // seasonals sum to zero
        let adjustment = mean(&seasonals);
        seasonals.iter_mut().for_each(|s| *s -= adjustment);

        (level, trend, seasonals)
    }

    fn smooth(
        values: &[f64],
        alpha: f64,
        beta: f64,
        gamma: f64,
        period: usize,
        trend_component: TrendComponent,
    ) -> SmoothingPass {
        let (mut level, mut trend, mut seasonals) =
            Self::initialize_state(values, period, trend_component);
        let beta = match trend_component {
            TrendComponent::None => 0.0,
            TrendComponent::Additive => beta,
        };

        // the first season seeds the state and is its own fit
        let mut fitted: Vec<f64> = values[..period].to_vec();
        fitted.reserve(values.len() - period);
        let mut sse = 0.0;

        for (t, &y) in values.iter().enumerate().skip(period) {
            let idx = t % period;
            let s = seasonals[idx];
            let forecast = level + trend + s;
            fitted.push(forecast);
            sse += (y - forecast).powi(2);

            let level_prev = level;
            level = alpha * (y - s) + (1.0 - alpha) * (level_prev + trend);
            trend = beta * (level - level_prev) + (1.0 - beta) * trend;
            seasonals[idx] = gamma * (y - level) + (1.0 - gamma) * s;
        }

        SmoothingPass {
            level,
            trend,
            seasonals,
            fitted,
            sse,
        }
    }

    fn optimize_params(&self, values: &[f64]) -> (f64, f64, f64) {
        let period = self.seasonal_period;
        let trend_component = self.trend_component;

        match trend_component {
            TrendComponent::None => {
                let result = nelder_mead(
                    |p| Self::smooth(values, p[0], 0.0, p[1], period, trend_component).sse,
                    &[0.3, 0.1],
                    Some(&[PARAM_BOUNDS, PARAM_BOUNDS]),
                    self.optimizer.clone(),
                );
                let p = result.optimal_point;
                (p[0], 0.0, p[1])
            }
            TrendComponent::Additive => {
                let result = nelder_mead(
                    |p| Self::smooth(values, p[0], p[1], p[2], period, trend_component).sse,
                    &[0.3, 0.1, 0.1],
                    Some(&[PARAM_BOUNDS, PARAM_BOUNDS, PARAM_BOUNDS]),
                    self.optimizer.clone(),
                );
                let p = result.optimal_point;
                (p[0], p[1], p[2])
            }
        }
    }
}

impl Default for HoltWinters {
    /// Additive seasonality over 12 periods, no trend, parameters estimated.
    fn default() -> Self {
        Self::auto(12, TrendComponent::None)
    }
}

impl Forecaster for HoltWinters {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        let period = self.seasonal_period;
        if period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonal period must be at least 2, got {period}"
            )));
        }
        if values.len() < 2 * period {
            return Err(ForecastError::InsufficientData {
                needed: 2 * period,
                got: values.len(),
            });
        }

        if self.optimize {
            let (alpha, beta, gamma) = self.optimize_params(values);
            self.alpha = Some(alpha);
            self.beta = Some(beta);
            self.gamma = Some(gamma);
        }

        let alpha = self.alpha.ok_or(ForecastError::FitRequired)?;
        let beta = self.beta.ok_or(ForecastError::FitRequired)?;
        let gamma = self.gamma.ok_or(ForecastError::FitRequired)?;

        let pass = Self::smooth(values, alpha, beta, gamma, period, self.trend_component);
        if !pass.sse.is_finite() {
            return Err(ForecastError::ComputationError(
                "Holt-Winters smoothing diverged".into(),
            ));
        }

        let residuals: Vec<f64> = values
            .iter()
            .zip(&pass.fitted)
            .map(|(y, f)| y - f)
            .collect();

        self.n = values.len();
        self.level = Some(pass.level);
        self.trend = Some(pass.trend);
        self.seasonals = Some(pass.seasonals);
        self.fitted = Some(pass.fitted);
        self.residual_variance = Some(pass.sse / (values.len() - period) as f64);
        self.residuals = Some(residuals);

        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let level = self.level.ok_or(ForecastError::FitRequired)?;
        let trend = self.trend.ok_or(ForecastError::FitRequired)?;
        let seasonals = self.seasonals.as_ref().ok_or(ForecastError::FitRequired)?;
        let period = self.seasonal_period;

        let predictions: Vec<f64> = (1..=horizon)
            .map(|h| {
                let s = seasonals[(self.n + h - 1) % period];
                level + h as f64 * trend + s
            })
            .collect();

        Ok(Forecast::from_values(predictions))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "HoltWinters"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calendar;
    use approx::assert_relative_eq;
    use chrono::{DateTime, TimeZone, Utc};

    fn make_timestamps(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| calendar::add_months(base, i as u32).unwrap())
            .collect()
    }

    fn make_seasonal_data(n: usize, period: usize, trend: f64, amplitude: f64) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                let seasonal = amplitude * (2.0 * std::f64::consts::PI * t / period as f64).sin();
                10.0 + trend * t + seasonal
            })
            .collect()
    }

    fn series(values: Vec<f64>) -> TimeSeries {
        TimeSeries::univariate(make_timestamps(values.len()), values).unwrap()
    }

    #[test]
    fn hw_default_is_seasonal_without_trend() {
        let model = HoltWinters::default();
        assert_eq!(model.seasonal_period(), 12);
        assert_eq!(model.trend_component(), TrendComponent::None);
        assert!(model.optimize);
        assert_eq!(model.name(), "HoltWinters");
    }

    #[test]
    fn hw_repeats_pure_seasonal_pattern() {
        let values = make_seasonal_data(36, 12, 0.0, 3.0);
        let mut model = HoltWinters::default();
        model.fit(&series(values.clone())).unwrap();

        let preds = model.predict(12).unwrap();
        for (pred, actual) in preds.primary().iter().zip(&values[24..]) {
            assert_relative_eq!(pred, actual, epsilon = 1e-6);
        }
    }

    #[test]
    fn hw_no_trend_keeps_trend_at_zero() {
        let mut model = HoltWinters::default();
        model
            .fit(&series(make_seasonal_data(48, 12, 0.1, 3.0)))
            .unwrap();
        assert_eq!(model.trend(), Some(0.0));
        assert_eq!(model.beta(), Some(0.0));
    }

    #[test]
    fn hw_additive_trend_follows_slope() {
        let values = make_seasonal_data(48, 12, 0.5, 2.0);
        let mut model = HoltWinters::auto(12, TrendComponent::Additive);
        model.fit(&series(values)).unwrap();

        assert!(model.alpha().unwrap() > 0.0);
        assert!(model.gamma().unwrap() > 0.0);
        let preds = model.predict(24).unwrap();
        assert!(preds.primary()[23] > preds.primary()[11]);
    }

    #[test]
    fn hw_captures_seasonality() {
        let values: Vec<f64> = (0..32)
            .map(|i| if i % 4 < 2 { 20.0 } else { 10.0 })
            .collect();
        let mut model = HoltWinters::new(0.5, 0.1, 0.5, 4, TrendComponent::None);
        model.fit(&series(values)).unwrap();

        let preds = model.predict(4).unwrap();
        let preds = preds.primary();
        assert!(preds[0] > preds[2]);
        assert!(preds[1] > preds[3]);
    }

    #[test]
    fn hw_insufficient_data() {
        let values: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let mut model = HoltWinters::new(0.3, 0.1, 0.1, 8, TrendComponent::Additive);
        assert!(matches!(
            model.fit(&series(values)),
            Err(ForecastError::InsufficientData {
                needed: 16,
                got: 10
            })
        ));
    }

    #[test]
    fn hw_requires_fit_before_predict() {
        let model = HoltWinters::default();
        assert!(matches!(model.predict(4), Err(ForecastError::FitRequired)));
    }

    #[test]
    fn hw_fitted_and_residuals() {
        let values = make_seasonal_data(24, 6, 0.1, 2.0);
        let mut model = HoltWinters::new(0.3, 0.1, 0.1, 6, TrendComponent::Additive);
        model.fit(&series(values.clone())).unwrap();

        let fitted = model.fitted_values().unwrap();
        let residuals = model.residuals().unwrap();
        assert_eq!(fitted.len(), 24);
        assert_eq!(residuals.len(), 24);
        for i in 0..24 {
            assert_relative_eq!(residuals[i], values[i] - fitted[i], epsilon = 1e-10);
        }
        assert_eq!(model.seasonals().unwrap().len(), 6);
    }

    #[test]
    fn hw_iteration_cap_still_fits() {
        let mut model = HoltWinters::default().with_max_iter(3);
        model
            .fit(&series(make_seasonal_data(36, 12, 0.0, 1.0)))
            .unwrap();
        assert_eq!(model.predict(5).unwrap().horizon(), 5);
    }

    #[test]
    fn hw_rejects_degenerate_period() {
        let mut model = HoltWinters::auto(1, TrendComponent::None);
        assert!(matches!(
            model.fit(&series(vec![1.0; 10])),
            Err(ForecastError::InvalidParameter(_))
        ));
    }
}
