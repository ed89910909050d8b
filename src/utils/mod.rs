//! Numerical utilities shared by the estimators.

pub mod optimization;
pub mod ridge;
pub mod stats;

pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use ridge::{ridge_fit, RidgeFit};
pub use stats::percentile;
