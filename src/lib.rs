//! # seriescast
//!
//! Forecast pipeline for monthly time-series datasets.
//!
//! A CSV table with a `date` column is loaded and cleaned, one numeric
//! column is min-max normalized, and SARIMA, an additive trend/seasonality
//! regression and Holt-Winters forecast it independently. Forecasts are
//! mapped back to original units, the history is labelled by an isolation
//! forest and k-means, and everything is assembled into a [`Report`].
//!
//! ```no_run
//! use seriescast::prelude::*;
//!
//! let pipeline = Pipeline::new(PipelineConfig::default());
//! let request = ForecastRequest::new("emissions", 12);
//! let report = pipeline.run_path("emissions.csv", &request)?;
//! for strategy in &report.strategies {
//!     println!("{strategy}: {:?}", report.forecast_values(strategy));
//! }
//! # Ok::<(), seriescast::ForecastError>(())
//! ```

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod clustering;
pub mod core;
pub mod detection;
pub mod engine;
pub mod error;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod transform;
pub mod utils;

pub use error::{ForecastError, Result};
pub use pipeline::{ForecastRequest, Pipeline, PipelineConfig};
pub use report::Report;

pub mod prelude {
    pub use crate::core::{Dataset, Forecast, ForecastResult, TimeSeries};
    pub use crate::engine::{HorizonBounds, StrategySelector};
    pub use crate::error::{ForecastError, Result};
    pub use crate::io::{DataLoader, ReportSink};
    pub use crate::models::Forecaster;
    pub use crate::pipeline::{ForecastRequest, Pipeline, PipelineConfig};
    pub use crate::report::Report;
    pub use crate::transform::{ConstantColumnPolicy, MinMaxScaler};
}
