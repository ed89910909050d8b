//! Penalized least squares on a column-major design matrix.
//!
//! Solves `(X'X + diag(penalty)) beta = X'y` through a Cholesky factorization.
//! A per-column penalty lets unpenalized terms (intercept, base slope) sit
//! next to heavily shrunk ones (trend changepoints, Fourier terms).

use crate::error::{ForecastError, Result};

/// Fitted ridge coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeFit {
    /// One coefficient per design column.
    pub coefficients: Vec<f64>,
}

impl RidgeFit {
    /// Evaluate the fit on a design matrix with the same column layout.
    pub fn predict(&self, columns: &[Vec<f64>]) -> Result<Vec<f64>> {
        if columns.len() != self.coefficients.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.coefficients.len(),
                got: columns.len(),
            });
        }
        let n = columns.first().map_or(0, Vec::len);
        let mut out = vec![0.0; n];
        for (coef, column) in self.coefficients.iter().zip(columns) {
            for (o, x) in out.iter_mut().zip(column) {
                *o += coef * x;
            }
        }
        Ok(out)
    }
}

/// Fit `y ≈ X beta` with an L2 penalty per column.
///
/// # Arguments
/// * `columns` - design matrix, one vector per column, each of length `y.len()`
/// * `y` - target values
/// * `penalties` - non-negative penalty per column
pub fn ridge_fit(columns: &[Vec<f64>], y: &[f64], penalties: &[f64]) -> Result<RidgeFit> {
    let n = y.len();
    let k = columns.len();

    if n == 0 {
        return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
    }
    if penalties.len() != k {
        return Err(ForecastError::DimensionMismatch {
            expected: k,
            got: penalties.len(),
        });
    }
    if let Some(bad) = columns.iter().find(|c| c.len() != n) {
        return Err(ForecastError::DimensionMismatch {
            expected: n,
            got: bad.len(),
        });
    }

    let mut xtx = vec![vec![0.0; k]; k];
    for i in 0..k {
        for j in i..k {
            let dot: f64 = columns[i].iter().zip(&columns[j]).map(|(a, b)| a * b).sum();
            xtx[i][j] = dot;
            xtx[j][i] = dot;
        }
        // keep the system positive definite even for collinear columns
        xtx[i][i] += penalties[i] + 1e-8;
    }

    let xty: Vec<f64> = columns
        .iter()
        .map(|c| c.iter().zip(y).map(|(a, b)| a * b).sum())
        .collect();

    let coefficients = solve_symmetric(&xtx, &xty).ok_or_else(|| {
        ForecastError::ComputationError("normal equations are not positive definite".into())
    })?;

    Ok(RidgeFit { coefficients })
}

/// Solve symmetric positive definite system using Cholesky decomposition.
pub fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let sum = a[i][j] - (0..j).map(|k| l[i][k] * l[j][k]).sum::<f64>();
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // L z = b
    let mut z = vec![0.0; n];
    for i in 0..n {
        z[i] = (b[i] - (0..i).map(|j| l[i][j] * z[j]).sum::<f64>()) / l[i][i];
    }

    // L' x = z
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        x[i] = (z[i] - ((i + 1)..n).map(|j| l[j][i] * x[j]).sum::<f64>()) / l[i][i];
    }

    Some(x)
}
