//! # Single-Degree-of-Freedom Recursive Filters
//!
//! Exact discretization of the damped oscillator
//!
//! ```text
//! u'' + 2*zeta*wn*u' + wn^2*u = -a(t)
//! ```
//!
//! driven by ground acceleration `a`, holding the forcing constant over
//! each time step. The result is a 6-coefficient recursion on the state
//! `(u, v)` (relative displacement and velocity):
//!
//! ```text
//! u[i+1] = a11*u[i] + a12*v[i] + b1*a[i]
//! v[i+1] = a21*u[i] + a22*v[i] + b2*a[i]
//! ```
//!
//! Both the response-spectrum tables in [`crate::spectra`] and the
//! filter-based event-onset picker in [`crate::onset_filter`] run this
//! recursion; they differ only in the (period, damping) pair and in what
//! they extract from the state sequence.

/// The six recursion coefficients `[a11, a12, a21, a22, b1, b2]`.
pub type SdofCoefficients = [f64; 6];

/// Exact zero-order-hold coefficients for an oscillator with natural
/// period `period` (s), damping ratio `damping` (< 1), and time step `dt`.
///
/// Returns `None` for non-positive period/step or damping outside [0, 1).
pub fn coefficients(period: f64, damping: f64, dt: f64) -> Option<SdofCoefficients> {
    if period <= 0.0 || dt <= 0.0 || !(0.0..1.0).contains(&damping) {
        return None;
    }
    let wn = 2.0 * std::f64::consts::PI / period;
    let wd = wn * (1.0 - damping * damping).sqrt();
    let e = (-damping * wn * dt).exp();
    let s = (wd * dt).sin();
    let c = (wd * dt).cos();

    let a11 = e * (c + damping * wn / wd * s);
    let a12 = e * s / wd;
    let a21 = -e * wn * wn / wd * s;
    let a22 = e * (c - damping * wn / wd * s);

    // Constant forcing f over the step settles toward f/wn^2; with the
    // ground-acceleration sign convention f = -a.
    let b1 = -(1.0 - a11) / (wn * wn);
    let b2 = a21 / (wn * wn);

    Some([a11, a12, a21, a22, b1, b2])
}

/// Run the recursion over an acceleration series, yielding the relative
/// displacement and velocity histories.
pub fn response(coef: &SdofCoefficients, accel: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let [a11, a12, a21, a22, b1, b2] = *coef;
    let mut u = Vec::with_capacity(accel.len());
    let mut v = Vec::with_capacity(accel.len());
    let (mut ui, mut vi) = (0.0f64, 0.0f64);
    for &a in accel {
        u.push(ui);
        v.push(vi);
        let un = a11 * ui + a12 * vi + b1 * a;
        let vn = a21 * ui + a22 * vi + b2 * a;
        ui = un;
        vi = vn;
    }
    (u, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_rejects_degenerate_parameters() {
        assert!(coefficients(0.0, 0.05, 0.01).is_none());
        assert!(coefficients(1.0, 0.05, 0.0).is_none());
        assert!(coefficients(1.0, 1.0, 0.01).is_none());
        assert!(coefficients(1.0, -0.1, 0.01).is_none());
        assert!(coefficients(1.0, 0.0, 0.01).is_some()); // undamped is valid
    }

    #[test]
    fn test_free_decay_matches_analytic() {
        // Release from u0 = 1 with no forcing: u(t) = e^{-z*wn*t} *
        // (cos(wd*t) + z*wn/wd * sin(wd*t)).
        let (period, damping, dt) = (0.5, 0.05, 0.005);
        let coef = coefficients(period, damping, dt).unwrap();
        let [a11, a12, a21, a22, ..] = coef;
        let wn = 2.0 * PI / period;
        let wd = wn * (1.0 - damping * damping).sqrt();

        let (mut u, mut v) = (1.0f64, 0.0f64);
        for i in 1..=400 {
            let (un, vn) = (a11 * u + a12 * v, a21 * u + a22 * v);
            u = un;
            v = vn;
            let t = i as f64 * dt;
            let e = (-damping * wn * t).exp();
            let expected = e * ((wd * t).cos() + damping * wn / wd * (wd * t).sin());
            assert!((u - expected).abs() < 1e-9, "step {i}: {u} vs {expected}");
        }
    }

    #[test]
    fn test_static_response_settles() {
        // Constant ground acceleration a: relative displacement settles at
        // -a/wn^2.
        let (period, damping, dt) = (1.0, 0.2, 0.01);
        let coef = coefficients(period, damping, dt).unwrap();
        let accel = vec![2.0; 5000];
        let (u, _) = response(&coef, &accel);
        let wn = 2.0 * PI / period;
        let expected = -2.0 / (wn * wn);
        assert!((u[4999] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_resonant_response_grows_undamped() {
        let (period, dt) = (1.0, 0.005);
        let coef = coefficients(period, 0.0, dt).unwrap();
        let accel: Vec<f64> = (0..4000)
            .map(|i| (2.0 * PI * i as f64 * dt / period).sin())
            .collect();
        let (u, _) = response(&coef, &accel);
        let early = u[..800].iter().fold(0.0f64, |m, &x| m.max(x.abs()));
        let late = u[3200..].iter().fold(0.0f64, |m, &x| m.max(x.abs()));
        assert!(late > 3.0 * early, "resonance should grow: {early} -> {late}");
    }
}
