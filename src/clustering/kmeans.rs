//! K-means clustering.
//!
//! Euclidean k-means with k-means++ seeding and several restarts. Points
//! are feature vectors of equal dimension; the pipeline clusters scalar
//! observations as one-dimensional points.

use crate::error::{ForecastError, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use std::cmp::Ordering;

/// K-means configuration.
#[derive(Debug, Clone)]
pub struct KMeansConfig {
    /// Number of clusters
    pub k: usize,
    /// Maximum Lloyd iterations per restart
    pub max_iter: usize,
    /// Number of k-means++ restarts; the lowest inertia wins
    pub n_init: usize,
    /// Random seed for initialization
    pub seed: u64,
    /// Convergence tolerance on total centroid movement
    pub tolerance: f64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 3,
            max_iter: 300,
            n_init: 10,
            seed: 42,
            tolerance: 1e-4,
        }
    }
}

impl KMeansConfig {
    /// Set number of clusters.
    pub fn k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set maximum iterations.
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter.max(1);
        self
    }

    pub fn n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init.max(1);
        self
    }

    /// Set random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// K-means clustering result.
#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Cluster assignment of each point, numbered by ascending centroid
    pub labels: Vec<usize>,
    /// Cluster centroids, sorted ascending
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances to the assigned centroid
    pub inertia: f64,
    /// Iterations performed by the winning restart
    pub n_iter: usize,
}

impl KMeansResult {
    /// Get indices of points in a specific cluster.
    pub fn cluster_members(&self, cluster: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == cluster)
            .map(|(i, _)| i)
            .collect()
    }

    /// Get the size of each cluster.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.len()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

/// Cluster `points` into `config.k` groups.
///
/// Deterministic for a fixed seed. Cluster ids are assigned in ascending
/// order of centroid (lexicographic for multi-dimensional points).
///
/// # Errors
/// `InvalidParameter` when `k` is zero or the points differ in dimension,
/// `InsufficientData` when there are fewer points than clusters.
pub fn kmeans(points: &[Vec<f64>], config: &KMeansConfig) -> Result<KMeansResult> {
    let n = points.len();
    let k = config.k;

    if k == 0 {
        return Err(ForecastError::InvalidParameter(
            "number of clusters must be at least 1".into(),
        ));
    }
    if n < k {
        return Err(ForecastError::InsufficientData { needed: k, got: n });
    }
    let dim = points[0].len();
    if let Some(bad) = points.iter().find(|p| p.len() != dim) {
        return Err(ForecastError::DimensionMismatch {
            expected: dim,
            got: bad.len(),
        });
    }

    let mut rng = Pcg64::seed_from_u64(config.seed);
    let mut best: Option<KMeansResult> = None;

    for _ in 0..config.n_init.max(1) {
        let initial = initialize_centroids(points, k, &mut rng);
        let run = lloyd(points, initial, config);
        let better = best
            .as_ref()
            .map_or(true, |b| run.inertia < b.inertia);
        if better {
            best = Some(run);
        }
    }

    let best = best.ok_or_else(|| ForecastError::ComputationError("k-means produced no run".into()))?;
    Ok(relabel(best))
}

/// k-means++ seeding: each new centroid is drawn with probability
/// proportional to its squared distance from the nearest chosen one.
fn initialize_centroids(points: &[Vec<f64>], k: usize, rng: &mut Pcg64) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..n)].clone());

    while centroids.len() < k {
        let weights: Vec<f64> = points
            .iter()
            .map(|p| nearest_centroid(p, &centroids).1)
            .collect();
        // all remaining mass is zero when points repeat
        let idx = match WeightedIndex::new(&weights) {
            Ok(dist) => dist.sample(rng),
            Err(_) => rng.gen_range(0..n),
        };
        centroids.push(points[idx].clone());
    }

    centroids
}

fn lloyd(points: &[Vec<f64>], mut centroids: Vec<Vec<f64>>, config: &KMeansConfig) -> KMeansResult {
    let k = centroids.len();
    let dim = centroids[0].len();
    let mut labels = vec![0; points.len()];
    let mut n_iter = 0;

    for iter in 0..config.max_iter {
        n_iter = iter + 1;

        for (label, p) in labels.iter_mut().zip(points) {
            *label = nearest_centroid(p, &centroids).0;
        }

        let mut sums = vec![vec![0.0; dim]; k];
        let mut counts = vec![0usize; k];
        for (p, &l) in points.iter().zip(&labels) {
            counts[l] += 1;
            for (s, x) in sums[l].iter_mut().zip(p) {
                *s += x;
            }
        }

        let mut updated = Vec::with_capacity(k);
        for (cluster, (sum, count)) in sums.into_iter().zip(&counts).enumerate() {
            if *count == 0 {
                // empty cluster takes the point farthest from its centroid
                let far = farthest_point(points, &labels, &centroids);
                labels[far] = cluster;
                updated.push(points[far].clone());
            } else {
                updated.push(sum.into_iter().map(|s| s / *count as f64).collect());
            }
        }

        let shift: f64 = centroids
            .iter()
            .zip(&updated)
            .map(|(a, b)| squared_distance(a, b))
            .sum();
        centroids = updated;
        if shift <= config.tolerance * config.tolerance {
            break;
        }
    }

    for (label, p) in labels.iter_mut().zip(points) {
        *label = nearest_centroid(p, &centroids).0;
    }
    let inertia = points
        .iter()
        .zip(&labels)
        .map(|(p, &l)| squared_distance(p, &centroids[l]))
        .sum();

    KMeansResult {
        labels,
        centroids,
        inertia,
        n_iter,
    }
}

/// Renumber clusters so that ids follow ascending centroid order.
fn relabel(result: KMeansResult) -> KMeansResult {
    let mut order: Vec<usize> = (0..result.centroids.len()).collect();
    order.sort_by(|&a, &b| {
        result.centroids[a]
            .partial_cmp(&result.centroids[b])
            .unwrap_or(Ordering::Equal)
    });

    let mut new_id = vec![0; order.len()];
    for (new, &old) in order.iter().enumerate() {
        new_id[old] = new;
    }

    KMeansResult {
        labels: result.labels.iter().map(|&l| new_id[l]).collect(),
        centroids: order.iter().map(|&i| result.centroids[i].clone()).collect(),
        inertia: result.inertia,
        n_iter: result.n_iter,
    }
}

/// Index of the nearest centroid and the squared distance to it.
fn nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    centroids
        .iter()
        .map(|c| squared_distance(point, c))
        .enumerate()
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .unwrap_or((0, f64::INFINITY))
}

fn farthest_point(points: &[Vec<f64>], labels: &[usize], centroids: &[Vec<f64>]) -> usize {
    points
        .iter()
        .zip(labels)
        .map(|(p, &l)| squared_distance(p, &centroids[l]))
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .map_or(0, |(i, _)| i)
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}
