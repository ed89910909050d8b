//! Anomaly detection.
//!
//! This module provides an isolation forest that labels each observation as
//! normal or anomalous.

mod isolation_forest;

pub use isolation_forest::{
    isolation_forest, AnomalyLabel, IsolationForestConfig, IsolationForestResult,
};
