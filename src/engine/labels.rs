//! Anomaly and cluster labelling of the historical series.

use crate::clustering::{kmeans, KMeansConfig};
use crate::core::TimeSeries;
use crate::detection::{isolation_forest, AnomalyLabel, IsolationForestConfig};
use crate::error::Result;

/// Label sets for one series; a set that could not be computed is `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Labels {
    pub anomalies: Option<Vec<AnomalyLabel>>,
    pub clusters: Option<Vec<usize>>,
}

/// Labels each observation as normal or anomalous and assigns a cluster id.
///
/// Each observation is treated as a one-dimensional point; timestamps do
/// not take part.
#[derive(Debug, Clone, Default)]
pub struct AnomalyClusterEngine {
    forest: IsolationForestConfig,
    kmeans: KMeansConfig,
}

impl AnomalyClusterEngine {
    pub fn new(forest: IsolationForestConfig, kmeans: KMeansConfig) -> Self {
        Self { forest, kmeans }
    }

    /// Use `seed` for both the forest and the clustering.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.forest = self.forest.seed(seed);
        self.kmeans = self.kmeans.seed(seed);
        self
    }

    pub fn forest_config(&self) -> &IsolationForestConfig {
        &self.forest
    }

    pub fn kmeans_config(&self) -> &KMeansConfig {
        &self.kmeans
    }

    pub fn detect_anomalies(&self, series: &TimeSeries) -> Result<Vec<AnomalyLabel>> {
        let result = isolation_forest(&as_points(series), &self.forest)?;
        log::debug!(
            "isolation forest flagged {} of {} points",
            result.anomaly_count(),
            series.len()
        );
        Ok(result.labels)
    }

    pub fn cluster(&self, series: &TimeSeries) -> Result<Vec<usize>> {
        let result = kmeans(&as_points(series), &self.kmeans)?;
        log::debug!(
            "k-means converged after {} iterations, sizes {:?}",
            result.n_iter,
            result.cluster_sizes()
        );
        Ok(result.labels)
    }

    /// Run both labellers independently; a failure is logged and leaves
    /// that label set empty.
    pub fn run(&self, series: &TimeSeries) -> Labels {
        let anomalies = self
            .detect_anomalies(series)
            .map_err(|err| log::warn!("anomaly detection skipped: {err}"))
            .ok();
        let clusters = self
            .cluster(series)
            .map_err(|err| log::warn!("clustering skipped: {err}"))
            .ok();
        Labels {
            anomalies,
            clusters,
        }
    }
}

fn as_points(series: &TimeSeries) -> Vec<Vec<f64>> {
    series.values().iter().map(|&v| vec![v]).collect()
}
