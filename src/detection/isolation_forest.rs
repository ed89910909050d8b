//! Isolation forest anomaly detection.
//!
//! Points that are isolated by few random axis-aligned splits are
//! anomalous. Scores follow the usual convention: the forest yields
//! `s = 2^(-E[h(x)] / c(ψ))` and the reported score is `-s`, so lower means
//! more anomalous. Points scoring below the contamination percentile are
//! labelled anomalies.

use crate::error::{ForecastError, Result};
use crate::utils::stats::{harmonic, percentile};
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

/// Binary anomaly label for one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyLabel {
    Normal,
    Anomaly,
}

impl AnomalyLabel {
    pub fn is_anomaly(self) -> bool {
        self == AnomalyLabel::Anomaly
    }

    /// `-1` for anomalies and `1` for normal points.
    pub fn as_signed(self) -> i8 {
        match self {
            AnomalyLabel::Normal => 1,
            AnomalyLabel::Anomaly => -1,
        }
    }
}

/// Isolation forest configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationForestConfig {
    /// Number of trees
    pub n_estimators: usize,
    /// Sub-sample size per tree (capped at the number of points)
    pub max_samples: usize,
    /// Expected share of anomalies, in (0, 0.5]
    pub contamination: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for IsolationForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            contamination: 0.1,
            seed: 42,
        }
    }
}

impl IsolationForestConfig {
    pub fn n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn max_samples(mut self, n: usize) -> Self {
        self.max_samples = n;
        self
    }

    pub fn contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 || self.max_samples < 2 {
            return Err(ForecastError::InvalidParameter(
                "isolation forest needs at least one tree and a sub-sample of 2".into(),
            ));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(ForecastError::InvalidParameter(format!(
                "contamination must be in (0, 0.5], got {}",
                self.contamination
            )));
        }
        Ok(())
    }
}

/// Result of anomaly detection.
#[derive(Debug, Clone)]
pub struct IsolationForestResult {
    /// Label per input point
    pub labels: Vec<AnomalyLabel>,
    /// Score per input point (lower = more anomalous)
    pub scores: Vec<f64>,
    /// Score threshold; points strictly below it are anomalies
    pub threshold: f64,
}

impl IsolationForestResult {
    pub fn anomaly_indices(&self) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_anomaly())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn anomaly_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_anomaly()).count()
    }
}

#[derive(Debug)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

struct TreeBuilder<'a> {
    points: &'a [Vec<f64>],
    height_limit: usize,
}

impl TreeBuilder<'_> {
    fn build(&self, rows: &[usize], depth: usize, rng: &mut Pcg64) -> Node {
        if depth >= self.height_limit || rows.len() <= 1 {
            return Node::Leaf { size: rows.len() };
        }

        let dim = self.points[rows[0]].len();
        let feature = rng.gen_range(0..dim);
        let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
            let x = self.points[r][feature];
            (lo.min(x), hi.max(x))
        });
        if lo >= hi {
            return Node::Leaf { size: rows.len() };
        }

        let value = rng.gen_range(lo..hi);
        let (left, right): (Vec<usize>, Vec<usize>) =
            rows.iter().partition(|&&r| self.points[r][feature] < value);

        Node::Split {
            feature,
            value,
            left: Box::new(self.build(&left, depth + 1, rng)),
            right: Box::new(self.build(&right, depth + 1, rng)),
        }
    }
}

fn path_length(node: &Node, point: &[f64], depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Split {
            feature,
            value,
            left,
            right,
        } => {
            if point[*feature] < *value {
                path_length(left, point, depth + 1)
            } else {
                path_length(right, point, depth + 1)
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * harmonic(n - 1.0) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Score and label `points` with an isolation forest.
///
/// Deterministic for a fixed `config.seed`.
///
/// # Errors
/// `EmptyData` for no points, `InsufficientData` for a single point,
/// `DimensionMismatch` for ragged input, `InvalidParameter` for a bad
/// configuration.
pub fn isolation_forest(
    points: &[Vec<f64>],
    config: &IsolationForestConfig,
) -> Result<IsolationForestResult> {
    config.validate()?;
    let n = points.len();
    if n == 0 {
        return Err(ForecastError::EmptyData);
    }
    if n < 2 {
        return Err(ForecastError::InsufficientData { needed: 2, got: n });
    }
    let dim = points[0].len();
    if dim == 0 {
        return Err(ForecastError::InvalidParameter(
            "points must have at least one feature".into(),
        ));
    }
    if let Some(bad) = points.iter().find(|p| p.len() != dim) {
        return Err(ForecastError::DimensionMismatch {
            expected: dim,
            got: bad.len(),
        });
    }

    let sample_size = config.max_samples.min(n);
    let builder = TreeBuilder {
        points,
        height_limit: (sample_size as f64).log2().ceil() as usize,
    };

    let mut rng = Pcg64::seed_from_u64(config.seed);
    let trees: Vec<Node> = (0..config.n_estimators)
        .map(|_| {
            let rows = index::sample(&mut rng, n, sample_size).into_vec();
            builder.build(&rows, 0, &mut rng)
        })
        .collect();

    let normalizer = average_path_length(sample_size);
    let scores: Vec<f64> = points
        .iter()
        .map(|p| {
            let mean_depth =
                trees.iter().map(|t| path_length(t, p, 0)).sum::<f64>() / trees.len() as f64;
            -(2f64).powf(-mean_depth / normalizer)
        })
        .collect();

    let threshold = percentile(&scores, 100.0 * config.contamination);
    let labels = scores
        .iter()
        .map(|&s| {
            if s < threshold {
                AnomalyLabel::Anomaly
            } else {
                AnomalyLabel::Normal
            }
        })
        .collect();

    Ok(IsolationForestResult {
        labels,
        scores,
        threshold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scalar_points(values: &[f64]) -> Vec<Vec<f64>> {
        values.iter().map(|&v| vec![v]).collect()
    }

    fn with_outliers() -> Vec<Vec<f64>> {
        let mut values: Vec<f64> = (0..38).map(|i| 0.45 + 0.003 * (i % 10) as f64).collect();
        values.push(0.0);
        values.push(1.0);
        scalar_points(&values)
    }

    #[test]
    fn flags_extreme_points() {
        let result = isolation_forest(&with_outliers(), &IsolationForestConfig::default()).unwrap();
        assert_eq!(result.labels.len(), 40);
        assert!(result.labels[38].is_anomaly());
        assert!(result.labels[39].is_anomaly());
        assert!(result.anomaly_count() <= 4);
    }

    #[test]
    fn scores_are_negative_and_bounded() {
        let result = isolation_forest(&with_outliers(), &IsolationForestConfig::default()).unwrap();
        for s in &result.scores {
            assert!(*s < 0.0 && *s >= -1.0);
        }
        let outlier = result.scores[39];
        let inlier = result.scores[5];
        assert!(outlier < inlier);
    }

    #[test]
    fn deterministic_for_seed() {
        let config = IsolationForestConfig::default().seed(3);
        let a = isolation_forest(&with_outliers(), &config).unwrap();
        let b = isolation_forest(&with_outliers(), &config).unwrap();
        assert_eq!(a.labels, b.labels);
        assert_eq!(a.scores, b.scores);
    }

    #[test]
    fn contamination_bounds_anomaly_share() {
        let points = scalar_points(&(0..100).map(|i| (i as f64 * 0.37).sin()).collect::<Vec<_>>());
        let result = isolation_forest(&points, &IsolationForestConfig::default()).unwrap();
        assert!(result.anomaly_count() <= 10);
    }

    #[test]
    fn constant_points_are_all_normal() {
        let points = scalar_points(&[0.5; 12]);
        let result = isolation_forest(&points, &IsolationForestConfig::default()).unwrap();
        assert_eq!(result.anomaly_count(), 0);
    }

    #[test]
    fn path_length_normalizer() {
        assert_relative_eq!(average_path_length(2), 1.0);
        assert_relative_eq!(average_path_length(1), 0.0);
        assert!(average_path_length(256) > average_path_length(16));
    }

    #[test]
    fn signed_labels() {
        assert_eq!(AnomalyLabel::Anomaly.as_signed(), -1);
        assert_eq!(AnomalyLabel::Normal.as_signed(), 1);
    }

    #[test]
    fn rejects_bad_input() {
        let config = IsolationForestConfig::default();
        assert_eq!(isolation_forest(&[], &config).unwrap_err(), ForecastError::EmptyData);
        assert!(matches!(
            isolation_forest(&scalar_points(&[1.0]), &config),
            Err(ForecastError::InsufficientData { needed: 2, got: 1 })
        ));
        assert!(matches!(
            isolation_forest(&with_outliers(), &config.clone().contamination(0.0)),
            Err(ForecastError::InvalidParameter(_))
        ));
    }
}
