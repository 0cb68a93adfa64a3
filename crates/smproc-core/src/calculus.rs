//! # Time-Domain Integration and Differentiation
//!
//! Trapezoidal cumulative integration and finite-difference
//! differentiation over a uniform time base. These are the time-domain
//! counterparts of the frequency-domain operators in [`crate::fft_calc`];
//! stage 2 selects between the two paths by configuration.
//!
//! Degenerate input (empty array, `dt <= 0`, unsupported stencil) yields
//! an empty result, never a panic.

/// Cumulative trapezoidal integration seeded with `initial`.
///
/// `out[0] = initial`, `out[i] = out[i-1] + (x[i] + x[i-1]) * dt / 2`.
pub fn integrate(data: &[f64], dt: f64, initial: f64) -> Vec<f64> {
    if data.is_empty() || dt <= 0.0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(data.len());
    out.push(initial);
    for i in 1..data.len() {
        let next = out[i - 1] + (data[i] + data[i - 1]) * dt * 0.5;
        out.push(next);
    }
    out
}

/// Finite-difference differentiation.
///
/// `order` selects the stencil: 2 (two-point forward/backward), 3 or 5
/// (central differences via [`central_diff`]). Any other order, empty
/// input, or `dt <= 0` yields an empty result.
pub fn differentiate(data: &[f64], dt: f64, order: usize) -> Vec<f64> {
    if data.is_empty() || dt <= 0.0 {
        return Vec::new();
    }
    match order {
        2 => {
            if data.len() < 2 {
                return Vec::new();
            }
            let mut out = Vec::with_capacity(data.len());
            out.push((data[1] - data[0]) / dt);
            for i in 1..data.len() - 1 {
                out.push((data[i + 1] - data[i - 1]) / (2.0 * dt));
            }
            out.push((data[data.len() - 1] - data[data.len() - 2]) / dt);
            out
        }
        3 | 5 => central_diff(data, dt, order),
        _ => Vec::new(),
    }
}

/// Central-difference differentiation with a 3-, 5-, or 7-point stencil.
///
/// Samples too close to the edges for the full stencil fall back to the
/// next narrower one. Empty result on unsupported `points`, `dt <= 0`, or
/// an array shorter than the stencil.
pub fn central_diff(data: &[f64], dt: f64, points: usize) -> Vec<f64> {
    if data.is_empty() || dt <= 0.0 || !matches!(points, 3 | 5 | 7) || data.len() < points {
        return Vec::new();
    }
    let n = data.len();
    let mut out = vec![0.0; n];

    out[0] = (data[1] - data[0]) / dt;
    out[n - 1] = (data[n - 1] - data[n - 2]) / dt;

    for i in 1..n - 1 {
        let half = points / 2;
        let reach = half.min(i).min(n - 1 - i);
        out[i] = match reach {
            1 => (data[i + 1] - data[i - 1]) / (2.0 * dt),
            2 => {
                (data[i - 2] - 8.0 * data[i - 1] + 8.0 * data[i + 1] - data[i + 2]) / (12.0 * dt)
            }
            _ => {
                (-data[i - 3] + 9.0 * data[i - 2] - 45.0 * data[i - 1] + 45.0 * data[i + 1]
                    - 9.0 * data[i + 2]
                    + data[i + 3])
                    / (60.0 * dt)
            }
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_integrate_constant() {
        let out = integrate(&[2.0; 101], 0.1, 0.0);
        assert_eq!(out.len(), 101);
        assert!((out[100] - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_integrate_seeded() {
        let out = integrate(&[0.0; 10], 0.1, 0.25);
        assert!(out.iter().all(|&v| (v - 0.25).abs() < 1e-15));
    }

    #[test]
    fn test_degenerate_inputs_empty() {
        assert!(integrate(&[], 0.1, 0.0).is_empty());
        assert!(integrate(&[1.0], 0.0, 0.0).is_empty());
        assert!(differentiate(&[1.0, 2.0], -0.1, 2).is_empty());
        assert!(differentiate(&[1.0, 2.0, 3.0], 0.1, 4).is_empty());
        assert!(central_diff(&[1.0, 2.0, 3.0], 0.1, 9).is_empty());
        assert!(central_diff(&[1.0, 2.0], 0.1, 5).is_empty());
    }

    #[test]
    fn test_differentiate_sine() {
        let dt = 0.001;
        let f = 2.0;
        let x: Vec<f64> = (0..2000).map(|i| (2.0 * PI * f * i as f64 * dt).sin()).collect();
        let dx = differentiate(&x, dt, 5);
        let w = 2.0 * PI * f;
        for i in 10..1990 {
            let expected = w * (w * i as f64 * dt).cos();
            assert!((dx[i] - expected).abs() < 1e-4, "sample {i}");
        }
    }

    #[test]
    fn test_integrate_differentiate_round_trip() {
        let dt = 0.005;
        let x: Vec<f64> = (0..4000)
            .map(|i| {
                let t = i as f64 * dt;
                (2.0 * PI * 1.5 * t).sin() + 0.3 * (2.0 * PI * 4.0 * t).cos()
            })
            .collect();
        let v = integrate(&x, dt, 0.0);
        let back = differentiate(&v, dt, 5);
        for i in 5..3995 {
            assert!((back[i] - x[i]).abs() < 5e-3, "sample {i}: {} vs {}", back[i], x[i]);
        }
    }
}
