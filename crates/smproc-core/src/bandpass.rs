//! # Butterworth Band-Pass Filtering
//!
//! The stage-2 band-pass filter, applied in one of two configurable ways:
//!
//! - **time domain**: cascaded biquad sections (Direct Form II Transposed)
//!   from a bilinear-transformed Butterworth design, run forward and then
//!   reverse over the record for zero phase distortion;
//! - **frequency domain**: multiply the spectrum by the acausal
//!   squared-magnitude Butterworth response and invert.
//!
//! Both paths leave the passband untouched to within the design ripple
//! and roll off at `order` poles per edge. Corner validation failures are
//! processing errors: a filter that cannot be built aborts the channel.

use crate::fft_calc::FftCalc;
use crate::types::{ProcError, ProcResult};
use num_complex::Complex64;
use std::f64::consts::PI;

/// A single second-order section, Direct Form II Transposed.
#[derive(Debug, Clone)]
struct Biquad {
    /// Numerator [b0, b1, b2].
    b: [f64; 3],
    /// Denominator [a1, a2], a0 normalized to 1.
    a: [f64; 2],
    state: [f64; 2],
}

impl Biquad {
    fn new(b: [f64; 3], a: [f64; 2]) -> Self {
        Self {
            b,
            a,
            state: [0.0; 2],
        }
    }

    fn process(&mut self, x: f64) -> f64 {
        let y = self.b[0] * x + self.state[0];
        self.state[0] = self.b[1] * x - self.a[0] * y + self.state[1];
        self.state[1] = self.b[2] * x - self.a[1] * y;
        y
    }

    fn reset(&mut self) {
        self.state = [0.0; 2];
    }
}

/// Butterworth band-pass filter of a given order per edge.
#[derive(Debug, Clone)]
pub struct ButterworthBandPass {
    low: f64,
    high: f64,
    order: usize,
    sps: f64,
    sections: Vec<Biquad>,
}

impl ButterworthBandPass {
    /// Design the filter. `order` is per edge and must be even and
    /// positive; corners must satisfy `0 < low < high < sps/2`.
    pub fn new(low: f64, high: f64, order: usize, sps: f64) -> ProcResult<Self> {
        if sps <= 0.0 {
            return Err(ProcError::Processing(format!(
                "band-pass filter: invalid sample rate {sps}"
            )));
        }
        if !(low > 0.0 && low < high && high < 0.5 * sps) {
            return Err(ProcError::Processing(format!(
                "band-pass filter: invalid corners ({low}, {high}) at {sps} sps"
            )));
        }
        if order == 0 || order % 2 != 0 || order > 16 {
            return Err(ProcError::Processing(format!(
                "band-pass filter: order {order} must be even, 2..=16"
            )));
        }

        // Cascade: highpass at the low corner, lowpass at the high corner.
        let mut sections = design_butterworth(order, low, sps, Edge::High);
        sections.extend(design_butterworth(order, high, sps, Edge::Low));
        Ok(Self {
            low,
            high,
            order,
            sps,
            sections,
        })
    }

    pub fn corners(&self) -> (f64, f64) {
        (self.low, self.high)
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Zero-phase time-domain application: forward pass, then a reverse
    /// pass with reset state. The effective magnitude response is the
    /// squared single-pass response.
    pub fn apply_time_domain(&mut self, data: &[f64]) -> Vec<f64> {
        let mut out: Vec<f64> = data.to_vec();
        for pass in 0..2 {
            for s in self.sections.iter_mut() {
                s.reset();
            }
            if pass == 1 {
                out.reverse();
            }
            for x in out.iter_mut() {
                let mut y = *x;
                for s in self.sections.iter_mut() {
                    y = s.process(y);
                }
                *x = y;
            }
            if pass == 1 {
                out.reverse();
            }
        }
        for s in self.sections.iter_mut() {
            s.reset();
        }
        out
    }

    /// Acausal frequency-domain application: multiply every bin by the
    /// real squared-magnitude Butterworth band-pass response.
    pub fn apply_frequency_domain(&mut self, data: &[f64], fft: &mut FftCalc) -> Vec<f64> {
        if data.is_empty() {
            return Vec::new();
        }
        let n = data.len();
        let mut spectrum = fft.forward(data);
        let n2 = spectrum.len();
        let df = self.sps / n2 as f64;
        for (k, c) in spectrum.iter_mut().enumerate() {
            let f = if k <= n2 / 2 {
                k as f64 * df
            } else {
                (n2 - k) as f64 * df
            };
            *c *= Complex64::new(self.magnitude_squared(f), 0.0);
        }
        let mut out = fft.inverse_real(spectrum);
        out.truncate(n);
        out
    }

    /// Squared magnitude of the analog band-pass response at `f` Hz
    /// (high-pass pole at the low corner times low-pass pole at the high
    /// corner).
    fn magnitude_squared(&self, f: f64) -> f64 {
        if f <= 0.0 {
            return 0.0;
        }
        let n2 = 2.0 * self.order as f64;
        let hp = 1.0 / (1.0 + (self.low / f).powf(n2));
        let lp = 1.0 / (1.0 + (f / self.high).powf(n2));
        hp * lp
    }
}

enum Edge {
    Low,
    High,
}

/// Bilinear-transformed Butterworth biquad cascade for one edge.
fn design_butterworth(order: usize, cutoff_hz: f64, sps: f64, edge: Edge) -> Vec<Biquad> {
    // Pre-warp so the digital -3 dB point lands on the requested corner.
    let wc = 2.0 * sps * (PI * cutoff_hz / sps).tan();
    let k = 2.0 * sps;
    let k2 = k * k;

    let mut sections = Vec::with_capacity(order / 2);
    for i in 0..order / 2 {
        // Analog prototype pole pair on the unit circle.
        let theta = PI * (2 * i + order + 1) as f64 / (2 * order) as f64;
        let p = Complex64::new(theta.cos(), theta.sin()) * wc;
        let p_re = p.re;
        let p_mag_sq = p.norm_sqr();

        let d = k2 - 2.0 * k * p_re + p_mag_sq;
        let a1 = 2.0 * (p_mag_sq - k2) / d;
        let a2 = (k2 + 2.0 * k * p_re + p_mag_sq) / d;

        let (b0, b1, b2) = match edge {
            Edge::Low => (p_mag_sq / d, 2.0 * p_mag_sq / d, p_mag_sq / d),
            Edge::High => (k2 / d, -2.0 * k2 / d, k2 / d),
        };
        sections.push(Biquad::new([b0, b1, b2], [a1, a2]));
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(f: f64, sps: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * f * i as f64 / sps).sin()).collect()
    }

    fn mid_amplitude(x: &[f64]) -> f64 {
        let n = x.len();
        x[n / 4..3 * n / 4].iter().fold(0.0f64, |m, &v| m.max(v.abs()))
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(ButterworthBandPass::new(0.0, 20.0, 4, 100.0).is_err());
        assert!(ButterworthBandPass::new(20.0, 0.5, 4, 100.0).is_err());
        assert!(ButterworthBandPass::new(0.5, 60.0, 4, 100.0).is_err());
        assert!(ButterworthBandPass::new(0.5, 20.0, 3, 100.0).is_err());
        assert!(ButterworthBandPass::new(0.5, 20.0, 0, 100.0).is_err());
        assert!(ButterworthBandPass::new(0.5, 20.0, 4, 0.0).is_err());
        assert!(ButterworthBandPass::new(0.5, 20.0, 4, 100.0).is_ok());
    }

    #[test]
    fn test_time_domain_passband_and_stopband() {
        let sps = 200.0;
        let mut filt = ButterworthBandPass::new(1.0, 20.0, 4, sps).unwrap();

        let pass = filt.apply_time_domain(&tone(5.0, sps, 4000));
        assert!((mid_amplitude(&pass) - 1.0).abs() < 0.05);

        let low_stop = filt.apply_time_domain(&tone(0.1, sps, 4000));
        assert!(mid_amplitude(&low_stop) < 0.05);

        let high_stop = filt.apply_time_domain(&tone(80.0, sps, 4000));
        assert!(mid_amplitude(&high_stop) < 0.05);
    }

    #[test]
    fn test_frequency_domain_passband_and_stopband() {
        let sps = 200.0;
        let mut filt = ButterworthBandPass::new(1.0, 20.0, 4, sps).unwrap();
        let mut fft = FftCalc::new();

        let pass = filt.apply_frequency_domain(&tone(5.0, sps, 4096), &mut fft);
        assert!((mid_amplitude(&pass) - 1.0).abs() < 0.05);

        let stop = filt.apply_frequency_domain(&tone(0.1, sps, 4096), &mut fft);
        assert!(mid_amplitude(&stop) < 0.1);
    }

    #[test]
    fn test_both_paths_agree_in_passband() {
        let sps = 100.0;
        let mut filt = ButterworthBandPass::new(0.5, 15.0, 4, sps).unwrap();
        let mut fft = FftCalc::new();
        let x = tone(3.0, sps, 2048);

        let td = filt.apply_time_domain(&x);
        let fd = filt.apply_frequency_domain(&x, &mut fft);
        assert!((mid_amplitude(&td) - mid_amplitude(&fd)).abs() < 0.05);
    }

    #[test]
    fn test_output_length_preserved() {
        let sps = 100.0;
        let mut filt = ButterworthBandPass::new(0.5, 15.0, 2, sps).unwrap();
        let mut fft = FftCalc::new();
        let x = tone(3.0, sps, 777);
        assert_eq!(filt.apply_time_domain(&x).len(), 777);
        assert_eq!(filt.apply_frequency_domain(&x, &mut fft).len(), 777);
    }
}
