//! Strategy registry and the forecast engine.
//!
//! The engine fits each selected strategy on the (normalized) series
//! independently. A failing strategy, including one that panics, is
//! recorded in its outcome and never aborts the batch.

use crate::core::{ForecastResult, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::{AdditiveTrendSeasonal, BoxedForecaster, HoltWinters, SARIMA};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::str::FromStr;

/// Key and display label of the SARIMA strategy.
pub const SARIMA_KEY: (&str, &str) = ("sarima", "SARIMA");
/// Key and display label of the trend/seasonality regression strategy.
pub const PROPHET_KEY: (&str, &str) = ("prophet", "Prophet");
/// Key and display label of the Holt-Winters strategy.
pub const HOLT_WINTERS_KEY: (&str, &str) = ("holt_winters", "Holt-Winters");

/// A named strategy and the factory that builds a fresh estimator for it.
pub struct StrategySpec {
    /// Selector key, e.g. `holt_winters`
    pub key: &'static str,
    /// Label shown in reports, e.g. `Holt-Winters`
    pub label: &'static str,
    factory: Box<dyn Fn() -> BoxedForecaster + Send + Sync>,
}

impl StrategySpec {
    pub fn new<F>(key: &'static str, label: &'static str, factory: F) -> Self
    where
        F: Fn() -> BoxedForecaster + Send + Sync + 'static,
    {
        Self {
            key,
            label,
            factory: Box::new(factory),
        }
    }

    /// Create a new, unfitted estimator.
    pub fn create(&self) -> BoxedForecaster {
        (self.factory)()
    }
}

impl fmt::Debug for StrategySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategySpec")
            .field("key", &self.key)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of strategies.
///
/// # Example
///
/// ```
/// use seriescast::engine::{StrategyRegistry, StrategySpec};
/// use seriescast::models::HoltWinters;
///
/// let mut registry = StrategyRegistry::new();
/// registry.register(StrategySpec::new("hw", "HW", || Box::new(HoltWinters::default())));
///
/// for spec in registry.iter() {
///     let model = spec.create();
///     assert!(!model.is_fitted());
/// }
/// ```
#[derive(Debug, Default)]
pub struct StrategyRegistry {
    strategies: Vec<StrategySpec>,
}

impl StrategyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// SARIMA, Prophet and Holt-Winters, in that order, with optimizer
    /// iterations capped at `max_iterations`.
    pub fn builtin(max_iterations: usize) -> Self {
        let mut registry = Self::new();
        registry.register(StrategySpec::new(SARIMA_KEY.0, SARIMA_KEY.1, move || {
            Box::new(SARIMA::default().with_max_iter(max_iterations))
        }));
        registry.register(StrategySpec::new(PROPHET_KEY.0, PROPHET_KEY.1, || {
            Box::new(AdditiveTrendSeasonal::default())
        }));
        registry.register(StrategySpec::new(
            HOLT_WINTERS_KEY.0,
            HOLT_WINTERS_KEY.1,
            move || Box::new(HoltWinters::default().with_max_iter(max_iterations)),
        ));
        registry
    }

    /// Register a strategy; a strategy with the same key is replaced in place.
    pub fn register(&mut self, spec: StrategySpec) {
        match self.strategies.iter_mut().find(|s| s.key == spec.key) {
            Some(existing) => *existing = spec,
            None => self.strategies.push(spec),
        }
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StrategySpec> {
        self.strategies.iter()
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.key).collect()
    }

    /// Strategies matched by `selector`, in registry order.
    pub fn select(&self, selector: &StrategySelector) -> Result<Vec<&StrategySpec>> {
        match selector {
            StrategySelector::All => Ok(self.strategies.iter().collect()),
            StrategySelector::Only(key) => self
                .strategies
                .iter()
                .find(|s| s.key == key)
                .map(|s| vec![s])
                .ok_or_else(|| {
                    ForecastError::Validation(format!(
                        "unknown strategy '{key}' (expected all, {})",
                        self.keys().join(", ")
                    ))
                }),
        }
    }
}

/// Which strategies to run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StrategySelector {
    /// Every registered strategy
    #[default]
    All,
    /// A single strategy by normalized key
    Only(String),
}

impl FromStr for StrategySelector {
    type Err = ForecastError;

    /// Case-insensitive; `-` and spaces are read as `_`.
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        match key.as_str() {
            "" => Err(ForecastError::Validation("strategy must not be empty".into())),
            "all" => Ok(StrategySelector::All),
            _ => Ok(StrategySelector::Only(key)),
        }
    }
}

impl TryFrom<String> for StrategySelector {
    type Error = ForecastError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<StrategySelector> for String {
    fn from(selector: StrategySelector) -> Self {
        selector.to_string()
    }
}

impl fmt::Display for StrategySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategySelector::All => f.write_str("all"),
            StrategySelector::Only(key) => f.write_str(key),
        }
    }
}

/// Inclusive bounds on the forecast horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonBounds {
    pub min: usize,
    pub max: usize,
}

impl Default for HorizonBounds {
    fn default() -> Self {
        Self { min: 1, max: 120 }
    }
}

impl HorizonBounds {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn validate(&self, steps_ahead: usize) -> Result<()> {
        if steps_ahead < self.min || steps_ahead > self.max {
            return Err(ForecastError::Validation(format!(
                "steps_ahead must be between {} and {}, got {steps_ahead}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Result of one strategy within a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOutcome {
    pub key: &'static str,
    pub label: &'static str,
    pub result: Result<ForecastResult>,
}

impl StrategyOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-strategy outcomes in request order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastBatch {
    outcomes: Vec<StrategyOutcome>,
}

impl ForecastBatch {
    pub fn outcomes(&self) -> &[StrategyOutcome] {
        &self.outcomes
    }

    /// Successful forecasts in request order.
    pub fn successes(&self) -> impl Iterator<Item = &ForecastResult> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Failed strategies with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&'static str, &ForecastError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.label, e)))
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    /// Split into successful results and `(label, reason)` pairs.
    pub fn into_parts(self) -> (Vec<ForecastResult>, Vec<(String, String)>) {
        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for outcome in self.outcomes {
            match outcome.result {
                Ok(result) => successes.push(result),
                Err(err) => failures.push((outcome.label.to_string(), err.to_string())),
            }
        }
        (successes, failures)
    }
}

/// Runs strategies from a registry against one series.
#[derive(Debug)]
pub struct ForecastEngine {
    registry: StrategyRegistry,
    bounds: HorizonBounds,
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self::new(StrategyRegistry::builtin(1000), HorizonBounds::default())
    }
}

impl ForecastEngine {
    pub fn new(registry: StrategyRegistry, bounds: HorizonBounds) -> Self {
        Self { registry, bounds }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn bounds(&self) -> HorizonBounds {
        self.bounds
    }

    /// Check the horizon and selector without fitting anything.
    pub fn validate(&self, steps_ahead: usize, selector: &StrategySelector) -> Result<()> {
        self.bounds.validate(steps_ahead)?;
        self.registry.select(selector).map(|_| ())
    }

    /// Fit and forecast every selected strategy.
    ///
    /// # Errors
    /// `Validation` for a bad horizon or selector (nothing is fitted),
    /// `NoForecastAvailable` when every selected strategy fails.
    pub fn run(
        &self,
        series: &TimeSeries,
        steps_ahead: usize,
        selector: &StrategySelector,
    ) -> Result<ForecastBatch> {
        self.bounds.validate(steps_ahead)?;
        let specs = self.registry.select(selector)?;
        let future = series.future_timestamps(steps_ahead)?;

        let outcomes: Vec<StrategyOutcome> = specs
            .into_iter()
            .map(|spec| {
                let result = run_isolated(spec, series, steps_ahead, &future);
                match &result {
                    Ok(_) => log::info!("strategy {} produced {steps_ahead} values", spec.label),
                    Err(err) => log::warn!("strategy {} failed: {err}", spec.label),
                }
                StrategyOutcome {
                    key: spec.key,
                    label: spec.label,
                    result,
                }
            })
            .collect();

        let batch = ForecastBatch { outcomes };
        if batch.success_count() == 0 {
            let reasons: Vec<String> = batch
                .failures()
                .map(|(label, err)| format!("{label}: {err}"))
                .collect();
            return Err(ForecastError::NoForecastAvailable(reasons.join("; ")));
        }
        Ok(batch)
    }
}

fn run_isolated(
    spec: &StrategySpec,
    series: &TimeSeries,
    steps_ahead: usize,
    future: &[DateTime<Utc>],
) -> Result<ForecastResult> {
    catch_unwind(AssertUnwindSafe(|| run_strategy(spec, series, steps_ahead, future)))
        .unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(ForecastError::ComputationError(format!("panicked: {message}")))
        })
}

fn run_strategy(
    spec: &StrategySpec,
    series: &TimeSeries,
    steps_ahead: usize,
    future: &[DateTime<Utc>],
) -> Result<ForecastResult> {
    let mut model = spec.create();
    model.fit(series)?;
    let values = model.predict(steps_ahead)?.into_values();

    if values.len() != steps_ahead {
        return Err(ForecastError::DimensionMismatch {
            expected: steps_ahead,
            got: values.len(),
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::ComputationError(
            "forecast contains non-finite values".into(),
        ));
    }
    ForecastResult::new(spec.label, future.to_vec(), values)
}
