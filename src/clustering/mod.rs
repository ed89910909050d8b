//! Clustering of observations.
//!
//! # Example
//!
//! ```
//! use seriescast::clustering::{kmeans, KMeansConfig};
//!
//! let points = vec![
//!     vec![1.0],
//!     vec![1.1],
//!     vec![10.0],
//!     vec![10.1],
//! ];
//! let config = KMeansConfig::default().k(2).seed(42);
//! let result = kmeans(&points, &config).unwrap();
//! assert_eq!(result.labels, vec![0, 0, 1, 1]);
//! ```

pub mod kmeans;

pub use kmeans::{kmeans, KMeansConfig, KMeansResult};
