//! Seasonal ARIMA model.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{difference, integrate, seasonal_difference};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};

/// SARIMA(p, d, q)(P, D, Q)\[s\] specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SARIMASpec {
    /// Non-seasonal AR order (p)
    pub p: usize,
    /// Non-seasonal differencing order (d)
    pub d: usize,
    /// Non-seasonal MA order (q)
    pub q: usize,
    /// Seasonal AR order (P)
    pub seasonal_p: usize,
    /// Seasonal differencing order (D)
    pub seasonal_d: usize,
    /// Seasonal MA order (Q)
    pub seasonal_q: usize,
    /// Seasonal period (s)
    pub period: usize,
}

impl SARIMASpec {
    pub fn new(
        order: (usize, usize, usize),
        seasonal_order: (usize, usize, usize, usize),
    ) -> Self {
        Self {
            p: order.0,
            d: order.1,
            q: order.2,
            seasonal_p: seasonal_order.0,
            seasonal_d: seasonal_order.1,
            seasonal_q: seasonal_order.2,
            period: seasonal_order.3,
        }
    }

    /// Number of estimated coefficients (no constant term).
    pub fn num_params(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q
    }

    /// Observations consumed by differencing.
    pub fn differencing_loss(&self) -> usize {
        self.d + self.seasonal_d * self.period
    }

    /// Shortest series the model will fit.
    ///
    /// After differencing there must be at least one full seasonal lag plus
    /// one observation per coefficient left to fit against.
    pub fn min_length(&self) -> usize {
        let seasonal_lag = self.period * self.seasonal_p.max(self.seasonal_q);
        self.differencing_loss() + seasonal_lag + self.p.max(self.q) + self.num_params().max(1)
    }
}

impl Default for SARIMASpec {
    fn default() -> Self {
        Self::new((1, 1, 1), (1, 1, 1, 12))
    }
}

/// Lag polynomials of the multiplicative model expanded to plain lag coefficients.
///
/// `w_t = Σ ar[L] w_{t-L} + Σ ma[L] e_{t-L} + e_t`
#[derive(Debug, Clone, Default, PartialEq)]
struct ExpandedLags {
    ar: Vec<f64>,
    ma: Vec<f64>,
}

impl ExpandedLags {
    fn from_params(spec: &SARIMASpec, params: &[f64]) -> Self {
        let (ar, rest) = params.split_at(spec.p);
        let (ma, rest) = rest.split_at(spec.q);
        let (sar, sma) = rest.split_at(spec.seasonal_p);
        let s = spec.period;

        // (1 - Σφ B^i)(1 - ΣΦ B^js): cross terms enter with a minus sign
        let mut ar_lags = vec![0.0; spec.p + spec.seasonal_p * s + 1];
        for (i, phi) in ar.iter().enumerate() {
            ar_lags[i + 1] += phi;
        }
        for (j, big_phi) in sar.iter().enumerate() {
            ar_lags[(j + 1) * s] += big_phi;
            for (i, phi) in ar.iter().enumerate() {
                ar_lags[i + 1 + (j + 1) * s] -= phi * big_phi;
            }
        }

        // (1 + Σθ B^i)(1 + ΣΘ B^js)
        let mut ma_lags = vec![0.0; spec.q + spec.seasonal_q * s + 1];
        for (i, theta) in ma.iter().enumerate() {
            ma_lags[i + 1] += theta;
        }
        for (j, big_theta) in sma.iter().enumerate() {
            ma_lags[(j + 1) * s] += big_theta;
            for (i, theta) in ma.iter().enumerate() {
                ma_lags[i + 1 + (j + 1) * s] += theta * big_theta;
            }
        }

        Self {
            ar: ar_lags,
            ma: ma_lags,
        }
    }

    /// One-step prediction at position `t` given history and past errors.
    fn predict_at(&self, t: usize, w: &[f64], errors: &[f64]) -> f64 {
        let ar: f64 = self
            .ar
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(lag, _)| *lag <= t)
            .map(|(lag, c)| c * w[t - lag])
            .sum();
        let ma: f64 = self
            .ma
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(lag, _)| *lag <= t)
            .map(|(lag, c)| c * errors[t - lag])
            .sum();
        ar + ma
    }

    /// Residuals of the conditional fit; pre-sample values are taken as zero.
    fn residuals(&self, w: &[f64]) -> Vec<f64> {
        let mut errors = vec![0.0; w.len()];
        for t in 0..w.len() {
            errors[t] = w[t] - self.predict_at(t, w, &errors);
        }
        errors
    }
}

/// Seasonal ARIMA forecaster.
///
/// The series is differenced `d` times at lag 1 and `D` times at lag `s`;
/// the multiplicative ARMA model is fitted to the result by conditional sum
/// of squares and forecasts are integrated back through both operators.
#[derive(Debug, Clone)]
pub struct SARIMA {
    spec: SARIMASpec,
    optimizer: NelderMeadConfig,
    /// Estimated coefficients in (φ, θ, Φ, Θ) order.
    params: Vec<f64>,
    lags: ExpandedLags,
    original: Option<Vec<f64>>,
    differenced: Option<Vec<f64>>,
    innovations: Option<Vec<f64>>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
    converged: bool,
}

impl SARIMA {
    /// Create a SARIMA model from orders.
    pub fn new(
        order: (usize, usize, usize),
        seasonal_order: (usize, usize, usize, usize),
    ) -> Self {
        Self::from_spec(SARIMASpec::new(order, seasonal_order))
    }

    pub fn from_spec(spec: SARIMASpec) -> Self {
        Self {
            spec,
            optimizer: NelderMeadConfig::default(),
            params: Vec::new(),
            lags: ExpandedLags::default(),
            original: None,
            differenced: None,
            innovations: None,
            fitted: None,
            residuals: None,
            residual_variance: None,
            converged: false,
        }
    }

    /// Cap the optimizer's iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.optimizer = self.optimizer.max_iter(max_iter);
        self
    }

    pub fn spec(&self) -> SARIMASpec {
        self.spec
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        self.params.get(..self.spec.p).unwrap_or(&[])
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        let start = self.spec.p;
        self.params
            .get(start..start + self.spec.q)
            .unwrap_or(&[])
    }

    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        let start = self.spec.p + self.spec.q;
        self.params
            .get(start..start + self.spec.seasonal_p)
            .unwrap_or(&[])
    }

    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        let start = self.spec.p + self.spec.q + self.spec.seasonal_p;
        self.params.get(start..).unwrap_or(&[])
    }

    pub fn residual_variance(&self) -> Option<f64> {
        self.residual_variance
    }

    /// Whether the last fit met the optimizer tolerance.
    pub fn converged(&self) -> bool {
        self.converged
    }

    fn css(&self, w: &[f64], params: &[f64]) -> f64 {
        let lags = ExpandedLags::from_params(&self.spec, params);
        let burn = self.spec.p.max(self.spec.q);
        lags.residuals(w)
            .iter()
            .skip(burn)
            .map(|e| e * e)
            .sum()
    }

    fn estimate(&mut self, w: &[f64]) {
        let k = self.spec.num_params();
        if k == 0 {
            self.params = Vec::new();
            self.converged = true;
            return;
        }

        let initial = vec![0.1; k];
        let bounds = vec![(-0.99, 0.99); k];
        let result = nelder_mead(
            |params| self.css(w, params),
            &initial,
            Some(&bounds),
            self.optimizer.clone(),
        );

        if !result.converged {
            log::debug!(
                "SARIMA optimizer stopped after {} iterations without converging",
                result.iterations
            );
        }
        self.params = result.optimal_point;
        self.converged = result.converged;
    }
}

impl Default for SARIMA {
    fn default() -> Self {
        Self::from_spec(SARIMASpec::default())
    }
}

impl Forecaster for SARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        let needed = self.spec.min_length();
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let x = difference(values, self.spec.d);
        let w = seasonal_difference(&x, self.spec.seasonal_d, self.spec.period);

        self.estimate(&w);
        self.lags = ExpandedLags::from_params(&self.spec, &self.params);

        let innovations = self.lags.residuals(&w);
        let burn = self.spec.p.max(self.spec.q);
        let effective = &innovations[burn.min(innovations.len())..];
        let variance = effective.iter().map(|e| e * e).sum::<f64>() / effective.len().max(1) as f64;
        if !variance.is_finite() {
            return Err(ForecastError::ComputationError(
                "SARIMA residual variance is not finite".into(),
            ));
        }

        // Differencing is known given the past, so the one-step error of w is
        // the one-step error of the original series.
        let loss = self.spec.differencing_loss();
        let mut residuals = vec![0.0; loss];
        residuals.extend_from_slice(&innovations);
        let fitted: Vec<f64> = values
            .iter()
            .zip(&residuals)
            .map(|(y, e)| y - e)
            .collect();

        self.original = Some(values.to_vec());
        self.differenced = Some(w);
        self.innovations = Some(innovations);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        self.residual_variance = Some(variance);

        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let original = self.original.as_ref().ok_or(ForecastError::FitRequired)?;
        let w = self.differenced.as_ref().ok_or(ForecastError::FitRequired)?;
        let innovations = self.innovations.as_ref().ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let mut extended = w.clone();
        let mut errors = innovations.clone();
        for _ in 0..horizon {
            let t = extended.len();
            let next = self.lags.predict_at(t, &extended, &errors);
            extended.push(next);
            errors.push(0.0);
        }
        let w_future = &extended[w.len()..];

        let x_history = difference(original, self.spec.d);
        let x_future = integrate(w_future, &x_history, self.spec.seasonal_d, self.spec.period);
        let predictions = integrate(&x_future, original, self.spec.d, 1);

        if predictions.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ComputationError(
                "SARIMA forecast diverged".into(),
            ));
        }

        Ok(Forecast::from_values(predictions))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "SARIMA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn make_series(values: Vec<f64>) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| crate::core::calendar::add_months(base, i as u32).unwrap())
            .collect();
        TimeSeries::univariate(timestamps, values).unwrap()
    }

    fn seasonal_trend(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                10.0 + 0.2 * t + 3.0 * (2.0 * std::f64::consts::PI * t / 12.0).sin()
            })
            .collect()
    }

    #[test]
    fn default_orders() {
        let spec = SARIMASpec::default();
        assert_eq!((spec.p, spec.d, spec.q), (1, 1, 1));
        assert_eq!(
            (spec.seasonal_p, spec.seasonal_d, spec.seasonal_q, spec.period),
            (1, 1, 1, 12)
        );
        assert_eq!(spec.num_params(), 4);
        assert_eq!(spec.differencing_loss(), 13);
        assert_eq!(spec.min_length(), 30);
    }

    #[test]
    fn expanded_lags_include_cross_terms() {
        let spec = SARIMASpec::new((1, 0, 1), (1, 0, 1, 4));
        let lags = ExpandedLags::from_params(&spec, &[0.5, 0.3, 0.2, 0.4]);
        assert_relative_eq!(lags.ar[1], 0.5);
        assert_relative_eq!(lags.ar[4], 0.2);
        assert_relative_eq!(lags.ar[5], -0.1);
        assert_relative_eq!(lags.ma[1], 0.3);
        assert_relative_eq!(lags.ma[4], 0.4);
        assert_relative_eq!(lags.ma[5], 0.12);
    }

    #[test]
    fn fits_and_forecasts_seasonal_trend() {
        let values = seasonal_trend(48);
        let mut model = SARIMA::default();
        model.fit(&make_series(values.clone())).unwrap();

        assert_eq!(model.ar_coefficients().len(), 1);
        assert_eq!(model.ma_coefficients().len(), 1);
        assert_eq!(model.seasonal_ar_coefficients().len(), 1);
        assert_eq!(model.seasonal_ma_coefficients().len(), 1);

        let forecast = model.predict(12).unwrap();
        assert_eq!(forecast.horizon(), 12);

        // A deterministic seasonal + linear series is reproduced by the
        // differencing alone, whatever the ARMA coefficients.
        let expected = seasonal_trend(60);
        for (pred, want) in forecast.primary().iter().zip(&expected[48..]) {
            assert_relative_eq!(pred, want, epsilon = 1e-6);
        }
    }

    #[test]
    fn residuals_cover_whole_series() {
        let mut model = SARIMA::default();
        model.fit(&make_series(seasonal_trend(36))).unwrap();
        assert_eq!(model.residuals().unwrap().len(), 36);
        assert_eq!(model.fitted_values().unwrap().len(), 36);
        assert!(model.residual_variance().unwrap() >= 0.0);
    }

    #[test]
    fn insufficient_data() {
        let mut model = SARIMA::default();
        let err = model.fit(&make_series(seasonal_trend(20))).unwrap_err();
        assert_eq!(err, ForecastError::InsufficientData { needed: 30, got: 20 });
    }

    #[test]
    fn requires_fit() {
        let model = SARIMA::default();
        assert!(matches!(model.predict(5), Err(ForecastError::FitRequired)));
    }

    #[test]
    fn zero_horizon() {
        let mut model = SARIMA::default();
        model.fit(&make_series(seasonal_trend(36))).unwrap();
        assert_eq!(model.predict(0).unwrap().horizon(), 0);
    }

    #[test]
    fn non_seasonal_random_walk() {
        let values: Vec<f64> = (0..30).map(|i| 5.0 + i as f64 * 0.5).collect();
        let mut model = SARIMA::new((0, 1, 0), (0, 0, 0, 12));
        model.fit(&make_series(values)).unwrap();
        let forecast = model.predict(3).unwrap();
        // pure differencing continues the last value
        for v in forecast.primary() {
            assert_relative_eq!(*v, 19.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn name() {
        assert_eq!(SARIMA::default().name(), "SARIMA");
    }
}
