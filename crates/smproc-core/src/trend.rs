//! # Trend Fitting and Removal
//!
//! Least-squares polynomial trend fitting over a uniform time base, used
//! by baseline correction and by the FAS corner-intersection method.
//!
//! Fits are solved through the normal equations with Gaussian elimination
//! and partial pivoting; the supported orders (1 = linear, 2 = quadratic,
//! 3 = cubic) keep the system small and well conditioned for record
//! lengths seen in practice. As everywhere in the primitive layer, bad
//! input yields an empty result or −1, never a panic.

use crate::array_ops;
use crate::types::SENTINEL_EXTREME;

/// Evaluate a polynomial with ascending coefficients at `x`.
pub fn polynomial_value(coeffs: &[f64], x: f64) -> f64 {
    let mut acc = 0.0;
    for &c in coeffs.iter().rev() {
        acc = acc * x + c;
    }
    acc
}

/// Least-squares polynomial fit of `y` against arbitrary abscissas `x`.
///
/// Returns ascending coefficients (length `order + 1`), or an empty vector
/// when the order is outside 1..=3, the arrays mismatch, or there are not
/// enough points to determine the fit.
pub fn fit_polynomial(x: &[f64], y: &[f64], order: usize) -> Vec<f64> {
    if !(1..=3).contains(&order) || x.len() != y.len() || x.len() <= order {
        return Vec::new();
    }
    let m = order + 1;

    // Normal equations: sums of x^k for k in 0..2*order, and x^k * y.
    let mut pow_sums = vec![0.0; 2 * order + 1];
    let mut rhs = vec![0.0; m];
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let mut p = 1.0;
        for k in 0..=2 * order {
            pow_sums[k] += p;
            if k < m {
                rhs[k] += p * yi;
            }
            p *= xi;
        }
    }
    let mut a = vec![vec![0.0; m]; m];
    for r in 0..m {
        for c in 0..m {
            a[r][c] = pow_sums[r + c];
        }
    }
    solve_linear(&mut a, &mut rhs).unwrap_or_default()
}

/// Gaussian elimination with partial pivoting; `None` on a singular system.
fn solve_linear(a: &mut [Vec<f64>], b: &mut [f64]) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-30 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let f = a[row][col] / a[col][col];
            for c in col..n {
                a[row][c] -= f * a[col][c];
            }
            b[row] -= f * b[col];
        }
    }
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut s = b[row];
        for c in row + 1..n {
            s -= a[row][c] * x[c];
        }
        x[row] = s / a[row][row];
    }
    Some(x)
}

/// Fit a degree-1..3 trend over the uniform time base `i * dt`.
///
/// Returns ascending coefficients, or an empty vector on empty input,
/// `dt <= 0`, or an order outside 1..=3 (order 0 is mean removal and is
/// handled by [`array_ops::remove_mean`]).
pub fn find_polynomial_trend(y: &[f64], order: usize, dt: f64) -> Vec<f64> {
    if y.is_empty() || dt <= 0.0 {
        return Vec::new();
    }
    let x: Vec<f64> = (0..y.len()).map(|i| i as f64 * dt).collect();
    fit_polynomial(&x, y, order)
}

/// Subtract a fitted trend (ascending coefficients) over the time base
/// `i * dt`. No-op on empty coefficients or `dt <= 0`.
pub fn remove_polynomial_trend(y: &mut [f64], coeffs: &[f64], dt: f64) {
    if coeffs.is_empty() || dt <= 0.0 {
        return;
    }
    for (i, v) in y.iter_mut().enumerate() {
        *v -= polynomial_value(coeffs, i as f64 * dt);
    }
}

/// Fit and subtract a linear trend in place. No-op on degenerate input.
pub fn remove_linear_trend(y: &mut [f64], dt: f64) {
    let coeffs = find_polynomial_trend(y, 1, dt);
    remove_polynomial_trend(y, &coeffs, dt);
}

/// Best-fit trend search: order 1 first, escalating to order 2 when the
/// residual dispersion (standard deviation about the fit) exceeds
/// `threshold`.
///
/// Returns `(order, coefficients)` for the accepted fit, or `(-1, [])`
/// when neither order is acceptable or the time step is zero/negative.
pub fn find_trend_with_best_fit(y: &[f64], dt: f64, threshold: f64) -> (i32, Vec<f64>) {
    if y.len() < 4 || dt <= 0.0 {
        return (-1, Vec::new());
    }
    for order in [1usize, 2] {
        let coeffs = find_polynomial_trend(y, order, dt);
        if coeffs.is_empty() {
            continue;
        }
        let residual: Vec<f64> = y
            .iter()
            .enumerate()
            .map(|(i, &v)| v - polynomial_value(&coeffs, i as f64 * dt))
            .collect();
        let disp = array_ops::find_standard_dev(&residual, true);
        if disp != SENTINEL_EXTREME && disp <= threshold {
            return (order as i32, coeffs);
        }
    }
    (-1, Vec::new())
}

/// Subtract the best-fit trend in place; returns the order actually used,
/// or −1 (array untouched) when no fit is acceptable.
pub fn remove_trend_with_best_fit(y: &mut [f64], dt: f64, threshold: f64) -> i32 {
    let (order, coeffs) = find_trend_with_best_fit(y, dt, threshold);
    if order > 0 {
        remove_polynomial_trend(y, &coeffs, dt);
    }
    order
}
