//! Forecasting and labelling engines driven by the pipeline.

mod forecast;
mod labels;

pub use forecast::{
    ForecastBatch, ForecastEngine, HorizonBounds, StrategyOutcome, StrategyRegistry,
    StrategySelector, StrategySpec, HOLT_WINTERS_KEY, PROPHET_KEY, SARIMA_KEY,
};
pub use labels::{AnomalyClusterEngine, Labels};
