//! Core data structures for time series forecasting.

pub mod calendar;
mod forecast;
mod frame;
mod time_series;

pub use forecast::{Forecast, ForecastResult};
pub use frame::{Column, Dataset};
pub use time_series::TimeSeries;
