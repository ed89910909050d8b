//! Forecasting models.
//!
//! Every model implements [`Forecaster`]; the forecast engine drives them
//! through boxed trait objects.

mod traits;

pub mod arima;
pub mod exponential;
pub mod prophet;

pub use arima::{SARIMASpec, SARIMA};
pub use exponential::{HoltWinters, TrendComponent};
pub use prophet::{AdditiveTrendSeasonal, TrendSeasonalConfig};
pub use traits::{BoxedForecaster, Forecaster};
