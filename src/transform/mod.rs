//! Data transformations for time series.
//!
//! # Example
//!
//! ```
//! use seriescast::transform::MinMaxScaler;
//!
//! let state = MinMaxScaler::default().fit("emissions", &[10.0, 20.0, 30.0]).unwrap();
//! let scaled = state.transform(&[10.0, 20.0, 30.0]);
//! assert_eq!(scaled, vec![0.0, 0.5, 1.0]);
//! assert_eq!(state.inverse_transform(&scaled), vec![10.0, 20.0, 30.0]);
//! ```

pub mod scale;

pub use scale::{ConstantColumnPolicy, MinMaxScaler, ScalerState};
