//! Statistical utility functions.

use std::cmp::Ordering;

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Percentile with linear interpolation between closest ranks.
///
/// `q` is in percent (0 to 100). Returns NaN for empty input.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let pos = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Harmonic number approximation `H(i) ≈ ln(i) + γ`.
pub fn harmonic(i: f64) -> f64 {
    const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;
    i.ln() + EULER_GAMMA
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_of_slice() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn percentile_interpolates() {
        let v = [4.0, 1.0, 3.0, 2.0];
        assert_relative_eq!(percentile(&v, 0.0), 1.0);
        assert_relative_eq!(percentile(&v, 100.0), 4.0);
        assert_relative_eq!(percentile(&v, 50.0), 2.5);
        assert_relative_eq!(percentile(&v, 10.0), 1.3, epsilon = 1e-12);
        assert!(percentile(&[], 10.0).is_nan());
    }

    #[test]
    fn harmonic_grows_logarithmically() {
        assert!(harmonic(10.0) > harmonic(2.0));
        assert_relative_eq!(harmonic(1.0), 0.5772156649, epsilon = 1e-9);
    }
}
