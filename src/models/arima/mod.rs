//! Seasonal ARIMA models.
//!
//! This module provides:
//! - SARIMA models with seasonal components (P, D, Q)\[s\]
//! - Lag differencing and its inverse

mod diff;
mod sarima;

pub use diff::{difference, integrate, seasonal_difference};
pub use sarima::{SARIMASpec, SARIMA};
