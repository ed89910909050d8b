//! Request validation and orchestration.
//!
//! A [`Pipeline`] holds configuration and strategy factories only. Every
//! call to [`Pipeline::run`] builds its own scaler state, estimators and
//! random generators, so one pipeline can serve many requests.

use crate::core::Dataset;
use crate::clustering::KMeansConfig;
use crate::detection::IsolationForestConfig;
use crate::engine::{
    AnomalyClusterEngine, ForecastEngine, HorizonBounds, StrategyRegistry, StrategySelector,
};
use crate::error::Result;
use crate::io::DataLoader;
use crate::report::{Report, ReportAssembler};
use crate::transform::{ConstantColumnPolicy, MinMaxScaler};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Seed for anomaly detection and clustering
    pub seed: u64,
    pub horizon_bounds: HorizonBounds,
    /// Expected share of anomalies
    pub contamination: f64,
    pub n_clusters: usize,
    pub constant_column: ConstantColumnPolicy,
    /// Optimizer iteration cap for iterative estimators
    pub max_iterations: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            horizon_bounds: HorizonBounds::default(),
            contamination: 0.1,
            n_clusters: 3,
            constant_column: ConstantColumnPolicy::Reject,
            max_iterations: 1000,
        }
    }
}

impl PipelineConfig {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn horizon_bounds(mut self, bounds: HorizonBounds) -> Self {
        self.horizon_bounds = bounds;
        self
    }

    pub fn contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }

    pub fn n_clusters(mut self, n_clusters: usize) -> Self {
        self.n_clusters = n_clusters;
        self
    }

    pub fn constant_column(mut self, policy: ConstantColumnPolicy) -> Self {
        self.constant_column = policy;
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }
}

/// What to forecast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub column: String,
    pub steps_ahead: usize,
    #[serde(default)]
    pub strategy: StrategySelector,
}

impl ForecastRequest {
    /// Request every strategy for `column`.
    pub fn new(column: impl Into<String>, steps_ahead: usize) -> Self {
        Self {
            column: column.into(),
            steps_ahead,
            strategy: StrategySelector::All,
        }
    }

    pub fn strategy(mut self, strategy: StrategySelector) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Load, normalize, forecast, label and assemble.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    loader: DataLoader,
    engine: ForecastEngine,
    labeller: AnomalyClusterEngine,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Pipeline {
    /// Pipeline with the built-in strategies.
    pub fn new(config: PipelineConfig) -> Self {
        let registry = StrategyRegistry::builtin(config.max_iterations);
        Self::with_registry(config, registry)
    }

    /// Pipeline with a custom set of strategies.
    pub fn with_registry(config: PipelineConfig, registry: StrategyRegistry) -> Self {
        let forest = IsolationForestConfig::default()
            .contamination(config.contamination)
            .seed(config.seed);
        let kmeans = KMeansConfig::default().k(config.n_clusters).seed(config.seed);
        Self {
            engine: ForecastEngine::new(registry, config.horizon_bounds),
            labeller: AnomalyClusterEngine::new(forest, kmeans),
            loader: DataLoader::new(),
            config,
        }
    }

    /// Replace the loader, e.g. to change the encoding order.
    pub fn loader(mut self, loader: DataLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn engine(&self) -> &ForecastEngine {
        &self.engine
    }

    /// Validate the request against the dataset without computing anything.
    pub fn validate(&self, dataset: &Dataset, request: &ForecastRequest) -> Result<()> {
        dataset.require_column(&request.column)?;
        self.engine.validate(request.steps_ahead, &request.strategy)
    }

    /// Run a request against an already loaded dataset.
    ///
    /// # Errors
    /// `Schema` for an unknown or non-numeric column, `Validation` for a bad
    /// horizon or strategy, `DegenerateRange` for a constant column under
    /// the reject policy, `NoForecastAvailable` when every strategy fails.
    pub fn run(&self, dataset: &Dataset, request: &ForecastRequest) -> Result<Report> {
        log::info!(
            "forecast request: column '{}', strategy {}, {} steps ahead",
            request.column,
            request.strategy,
            request.steps_ahead
        );
        self.validate(dataset, request)?;

        let series = dataset.series(&request.column)?;
        let scaler = MinMaxScaler::new(self.config.constant_column);
        let (scaled, state) = scaler.fit_transform(&series)?;

        let batch = self
            .engine
            .run(&scaled, request.steps_ahead, &request.strategy)?;
        let (results, skipped) = batch.into_parts();
        let forecasts: Vec<_> = results.iter().map(|r| state.inverse_forecast(r)).collect();

        let labels = self.labeller.run(&scaled);
        let historical = state.inverse_series(&scaled)?;

        let report = ReportAssembler::build(
            &request.column,
            &historical,
            &forecasts,
            labels.anomalies.as_deref(),
            labels.clusters.as_deref(),
            skipped,
        )?;

        log::info!(
            "report ready: {} historical rows, {} forecast series, {} skipped",
            report.historical.len(),
            report.strategies.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Load `bytes` and run the request.
    pub fn run_bytes(&self, bytes: &[u8], request: &ForecastRequest) -> Result<Report> {
        let dataset = self.loader.load_bytes(bytes)?;
        self.run(&dataset, request)
    }

    /// Load the file at `path` and run the request.
    pub fn run_path(&self, path: impl AsRef<Path>, request: &ForecastRequest) -> Result<Report> {
        let dataset = self.loader.load_path(path)?;
        self.run(&dataset, request)
    }
}
