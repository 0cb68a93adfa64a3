//! # FFT Operations
//!
//! Frequency-domain workhorse for the processing chain: Fourier amplitude
//! spectra for corner-frequency selection, and integration/differentiation
//! by division/multiplication with iω. Plans come from a shared
//! [`FftPlanner`] so repeated transforms of the same length reuse their
//! twiddle tables.
//!
//! Real traces ride in the real part of a `Complex64` buffer zero-padded
//! to the next power of two; results are truncated back to the input
//! length. Degenerate input (empty array, non-positive time step) yields
//! an empty result in keeping with the sentinel contract of the numeric
//! layer.

use num_complex::Complex64;
use rustfft::FftPlanner;
use std::f64::consts::PI;

/// FFT processor holding a reusable planner.
pub struct FftCalc {
    planner: FftPlanner<f64>,
}

impl Default for FftCalc {
    fn default() -> Self {
        Self::new()
    }
}

impl FftCalc {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Next power of two at or above `n`.
    pub fn pad_length(n: usize) -> usize {
        n.next_power_of_two()
    }

    /// Forward FFT of a real series, zero-padded to a power of two.
    pub fn forward(&mut self, data: &[f64]) -> Vec<Complex64> {
        let n2 = Self::pad_length(data.len());
        let mut buf: Vec<Complex64> = data.iter().map(|&x| Complex64::new(x, 0.0)).collect();
        buf.resize(n2, Complex64::new(0.0, 0.0));
        self.planner.plan_fft_forward(n2).process(&mut buf);
        buf
    }

    /// Inverse FFT, returning the real part scaled by 1/N.
    pub fn inverse_real(&mut self, mut spectrum: Vec<Complex64>) -> Vec<f64> {
        let n2 = spectrum.len();
        self.planner.plan_fft_inverse(n2).process(&mut spectrum);
        let scale = 1.0 / n2 as f64;
        spectrum.iter().map(|c| c.re * scale).collect()
    }

    /// Single-sided Fourier amplitude spectrum with its frequency axis.
    ///
    /// Amplitudes are scaled by the time step so the spectrum approximates
    /// the continuous transform. Empty result on empty input or `dt <= 0`.
    pub fn fas(&mut self, data: &[f64], dt: f64) -> (Vec<f64>, Vec<f64>) {
        if data.is_empty() || dt <= 0.0 {
            return (Vec::new(), Vec::new());
        }
        let spectrum = self.forward(data);
        let n2 = spectrum.len();
        let half = n2 / 2 + 1;
        let df = 1.0 / (n2 as f64 * dt);
        let freqs: Vec<f64> = (0..half).map(|k| k as f64 * df).collect();
        let amps: Vec<f64> = spectrum[..half].iter().map(|c| c.norm() * dt).collect();
        (freqs, amps)
    }

    /// Apply a per-bin complex factor as a function of signed angular
    /// frequency, then invert and truncate back to the input length.
    fn apply_omega(
        &mut self,
        data: &[f64],
        dt: f64,
        factor: impl Fn(f64) -> Complex64,
    ) -> Vec<f64> {
        if data.is_empty() || dt <= 0.0 {
            return Vec::new();
        }
        let n = data.len();
        let mut spectrum = self.forward(data);
        let n2 = spectrum.len();
        let df = 1.0 / (n2 as f64 * dt);
        for (k, c) in spectrum.iter_mut().enumerate() {
            // Signed frequency: bins above N/2 are negative.
            let fk = if k <= n2 / 2 {
                k as f64 * df
            } else {
                (k as f64 - n2 as f64) * df
            };
            *c *= factor(2.0 * PI * fk);
        }
        let mut out = self.inverse_real(spectrum);
        out.truncate(n);
        out
    }

    /// Frequency-domain integration: divide by iω, DC bin zeroed.
    pub fn integrate(&mut self, data: &[f64], dt: f64) -> Vec<f64> {
        self.apply_omega(data, dt, |w| {
            if w == 0.0 {
                Complex64::new(0.0, 0.0)
            } else {
                Complex64::new(0.0, -1.0 / w)
            }
        })
    }

    /// Frequency-domain differentiation: multiply by iω.
    pub fn differentiate(&mut self, data: &[f64], dt: f64) -> Vec<f64> {
        self.apply_omega(data, dt, |w| Complex64::new(0.0, w))
    }
}
