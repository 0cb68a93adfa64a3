//! # Sample-Rate Conversion
//!
//! Frequency-domain resampling and decimation. Records arrive at a
//! handful of native rates; processing optionally runs at a configured
//! target rate and the output may be decimated back down afterwards.
//! Conversion only ever happens by an integer factor.
//!
//! ## Example
//! ```
//! use smproc_core::resample::Resampler;
//!
//! let r = Resampler::new(200.0);
//! assert_eq!(r.calc_new_sampling_rate(50.0), (200.0, 4));
//! assert_eq!(r.calc_new_sampling_rate(80.0), (-1.0, -1));
//! assert_eq!(r.calc_new_sampling_rate(500.0), (-1.0, -1));
//! ```

use crate::fft_calc::FftCalc;
use crate::types::{ProcError, ProcResult};
use num_complex::Complex64;

/// Keep every `factor`-th sample after low-passing at the new Nyquist in
/// the frequency domain. The output holds `ceil(n / factor)` samples.
pub fn decimate_array(data: &[f64], factor: usize) -> ProcResult<Vec<f64>> {
    if data.is_empty() || factor == 0 {
        return Err(ProcError::Processing(format!(
            "decimate: {} samples, factor {factor}",
            data.len()
        )));
    }
    if factor == 1 {
        return Ok(data.to_vec());
    }
    let n = data.len();
    let mut fft = FftCalc::new();
    let mut spectrum = fft.forward(data);
    let m = spectrum.len();
    // Zero everything above the decimated Nyquist.
    let keep = m / (2 * factor);
    for (k, c) in spectrum.iter_mut().enumerate() {
        let bin = if k <= m / 2 { k } else { m - k };
        if bin > keep {
            *c = Complex64::new(0.0, 0.0);
        }
    }
    let smoothed = fft.inverse_real(spectrum);
    Ok(smoothed[..n].iter().step_by(factor).copied().collect())
}

/// Band-limited upsampling toward a fixed target rate.
#[derive(Debug, Clone)]
pub struct Resampler {
    target_sps: f64,
}

impl Resampler {
    pub fn new(target_sps: f64) -> Self {
        Self { target_sps }
    }

    /// True when a record at `sps` would be converted up.
    pub fn needs_resampling(&self, sps: f64) -> bool {
        sps > 0.0 && self.target_sps > sps
    }

    /// Working rate for a record at `sps`. Returns `(new_rate, factor)`
    /// with the integer up-conversion ratio, or `(-1, -1)` when the rate
    /// is unusable, not integer-related to the target, or already at or
    /// above it.
    pub fn calc_new_sampling_rate(&self, sps: f64) -> (f64, i32) {
        if sps <= 0.0 || self.target_sps <= sps {
            return (-1.0, -1);
        }
        let ratio = self.target_sps / sps;
        let factor = ratio.round();
        if (ratio - factor).abs() > 1e-9 {
            return (-1.0, -1);
        }
        (self.target_sps, factor as i32)
    }

    /// FFT interpolation of `data` from `sps` up to the target rate:
    /// the spectrum is zero-stuffed between the positive and negative
    /// halves, which inserts samples without touching the original
    /// spectral content. Output length is `n * factor`.
    pub fn resample_array(&self, data: &[f64], sps: f64) -> ProcResult<Vec<f64>> {
        if !self.needs_resampling(sps) {
            return Ok(data.to_vec());
        }
        let (new_rate, factor) = self.calc_new_sampling_rate(sps);
        if new_rate < 0.0 {
            return Err(ProcError::Processing(format!(
                "resample: cannot convert {sps} sps to {} sps",
                self.target_sps
            )));
        }
        let factor = factor as usize;
        if data.len() < 2 {
            return Err(ProcError::Processing(
                "resample: record too short".to_string(),
            ));
        }

        let n = data.len();
        let mut fft = FftCalc::new();
        let spectrum = fft.forward(data);
        let m = spectrum.len();
        let big = m * factor;

        let mut stuffed = vec![Complex64::new(0.0, 0.0); big];
        let half = m / 2;
        stuffed[..half].copy_from_slice(&spectrum[..half]);
        stuffed[big - half..].copy_from_slice(&spectrum[m - half..]);
        // Split the Nyquist bin across both halves to stay Hermitian.
        let nyq = spectrum[half] * 0.5;
        stuffed[half] = nyq;
        stuffed[big - half] = nyq.conj();

        let out = fft.inverse_real(stuffed);
        Ok(out[..n * factor]
            .iter()
            .map(|&v| v * factor as f64)
            .collect())
    }
}
