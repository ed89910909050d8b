//! Differencing utilities for SARIMA models.

/// Apply lag-1 differencing `d` times.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    seasonal_difference(series, d, 1)
}

/// Apply lag-`period` differencing `d` times.
///
/// Each pass shortens the series by `period` observations; a series that is
/// already too short is returned empty.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if d == 0 || period == 0 {
        return series.to_vec();
    }

    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            return Vec::new();
        }
        result = result
            .iter()
            .skip(period)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Undo `order` passes of lag-`lag` differencing for values that follow `history`.
///
/// `history` is the series at the undifferenced level; `forecast` continues
/// its `order`-times differenced version. Returns the continuation at the
/// undifferenced level.
pub fn integrate(forecast: &[f64], history: &[f64], order: usize, lag: usize) -> Vec<f64> {
    if order == 0 || lag == 0 || forecast.is_empty() {
        return forecast.to_vec();
    }

    let mut levels = Vec::with_capacity(order);
    levels.push(history.to_vec());
    for k in 1..order {
        let next = seasonal_difference(&levels[k - 1], 1, lag);
        levels.push(next);
    }

    let mut result = forecast.to_vec();
    for base in levels.iter().rev() {
        let mut extended = base.clone();
        for &step in &result {
            let prev = extended
                .len()
                .checked_sub(lag)
                .and_then(|i| extended.get(i))
                .copied()
                .unwrap_or(0.0);
            extended.push(step + prev);
        }
        result = extended.split_off(base.len());
    }
    result
}
