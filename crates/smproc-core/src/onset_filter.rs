//! # Coefficient-Filter Event-Onset Picker
//!
//! The second onset strategy: run the trace through a pair of precomputed
//! recursive filters (a short-period, heavily damped oscillator) and watch
//! the cumulative damping energy of the response. Ground noise dissipates
//! energy at a low, steady rate; the P arrival produces a sharp knee. The
//! first crossing of a histogram-derived threshold, snapped back to the
//! previous zero crossing of the response velocity, is the pick.
//!
//! Filter coefficients exist for the three sample intervals the digitizers
//! in practice produce (0.005, 0.01, 0.02 s); the constructor selects the
//! nearest table and no filter design happens at pick time.

use crate::array_ops::{self, SearchDir};
use crate::sdof::{self, SdofCoefficients};
use std::sync::LazyLock;

/// Sample intervals with precomputed filter tables.
pub const SUPPORTED_STEPS: [f64; 3] = [0.005, 0.01, 0.02];

/// Oscillator damping ratio used by the picker.
const PICKER_DAMPING: f64 = 0.6;

/// Oscillator period per supported step: short-period for fine sampling,
/// one decade longer when the step would undersample it.
const PICKER_PERIODS: [f64; 3] = [0.01, 0.01, 0.1];

/// Histogram bins for the energy-knee threshold.
const ENERGY_BINS: usize = 100;

static COEF_TABLES: LazyLock<[SdofCoefficients; 3]> = LazyLock::new(|| {
    let mut tables = [[0.0; 6]; 3];
    for (i, (&dt, &period)) in SUPPORTED_STEPS.iter().zip(PICKER_PERIODS.iter()).enumerate() {
        // Parameters are compile-time constants inside the valid domain.
        tables[i] = sdof::coefficients(period, PICKER_DAMPING, dt)
            .unwrap_or([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }
    tables
});

/// Event-onset picker backed by the precomputed oscillator tables.
#[derive(Debug, Clone)]
pub struct FilterPicker {
    dt: f64,
    coef: SdofCoefficients,
    period: f64,
}

impl FilterPicker {
    /// Select the coefficient table nearest to the record's sample interval.
    pub fn new(dt: f64) -> Self {
        let mut best = 0;
        for (i, &step) in SUPPORTED_STEPS.iter().enumerate() {
            if (dt - step).abs() < (dt - SUPPORTED_STEPS[best]).abs() {
                best = i;
            }
        }
        Self {
            dt: SUPPORTED_STEPS[best],
            coef: COEF_TABLES[best],
            period: PICKER_PERIODS[best],
        }
    }

    /// The sample interval of the selected table.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// First index where the damping-energy discriminant crosses its
    /// threshold, or −1 on empty input or a trace with no usable energy.
    pub fn find_event_onset(&self, data: &[f64]) -> isize {
        if data.is_empty() {
            return -1;
        }
        let (_, v) = sdof::response(&self.coef, data);

        // Cumulative damping energy, normalized to [0, 1].
        let wn = 2.0 * std::f64::consts::PI / self.period;
        let mut energy = Vec::with_capacity(v.len());
        let mut acc = 0.0;
        for &vi in &v {
            acc += 2.0 * PICKER_DAMPING * wn * vi * vi * self.dt;
            energy.push(acc);
        }
        let total = acc;
        if !(total > 0.0) || !total.is_finite() {
            return -1;
        }
        for e in energy.iter_mut() {
            *e /= total;
        }

        // The pre-event plateau dominates the histogram; its upper edge is
        // the crossing threshold.
        let mut counts = [0usize; ENERGY_BINS];
        for &e in &energy {
            let b = ((e * ENERGY_BINS as f64) as usize).min(ENERGY_BINS - 1);
            counts[b] += 1;
        }
        let modal = counts
            .iter()
            .enumerate()
            .max_by_key(|&(_, &c)| c)
            .map(|(b, _)| b)
            .unwrap_or(0);
        let threshold = (modal as f64 + 1.0) / ENERGY_BINS as f64;

        let crossing = energy.iter().position(|&e| e > threshold);
        let idx = match crossing {
            Some(i) => i,
            None => return -1,
        };

        // Snap back to the previous zero crossing of the response velocity
        // so the pick sits at the start of the arriving pulse.
        match array_ops::find_zero_crossing(&v, idx, SearchDir::Backward) {
            j if j >= 0 => j,
            _ => idx as isize,
        }
    }

    /// Buffered pick, clamped at zero.
    pub fn apply_buffer(&self, onset: isize, buffer_sec: f64) -> isize {
        let buffer_samples = (buffer_sec / self.dt).round() as isize;
        (onset - buffer_samples).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::PI;

    fn synthetic_onset(n: usize, onset: usize, dt: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|i| {
                let noise: f64 = rng.gen_range(-0.005..0.005);
                if i >= onset {
                    let t = (i - onset) as f64 * dt;
                    noise + (2.0 * PI * 2.0 * t).sin() * (1.0 + t).min(3.0)
                } else {
                    noise
                }
            })
            .collect()
    }

    #[test]
    fn test_table_selection_nearest() {
        assert_eq!(FilterPicker::new(0.01).dt(), 0.01);
        assert_eq!(FilterPicker::new(0.009).dt(), 0.01);
        assert_eq!(FilterPicker::new(0.004).dt(), 0.005);
        assert_eq!(FilterPicker::new(0.05).dt(), 0.02);
    }

    #[test]
    fn test_empty_input_sentinel() {
        assert_eq!(FilterPicker::new(0.01).find_event_onset(&[]), -1);
    }

    #[test]
    fn test_zero_trace_sentinel() {
        let zeros = vec![0.0; 1000];
        assert_eq!(FilterPicker::new(0.01).find_event_onset(&zeros), -1);
    }

    #[test]
    fn test_pick_near_true_onset() {
        let dt = 0.01;
        let data = synthetic_onset(6000, 2000, dt, 3);
        let picker = FilterPicker::new(dt);
        let pick = picker.find_event_onset(&data);
        assert!(pick >= 0);
        // The histogram threshold trips once the accumulated damping
        // energy clears the noise floor, which for this amplitude is a
        // little over a second into the arrival. The pick must never
        // land before the onset itself.
        assert!(
            pick >= 1990 && pick <= 2350,
            "picked {pick}, expected just after 2000"
        );
    }

    #[test]
    fn test_apply_buffer_clamps_at_zero() {
        let picker = FilterPicker::new(0.01);
        assert_eq!(picker.apply_buffer(1000, 2.0), 800);
        assert_eq!(picker.apply_buffer(100, 5.0), 0);
        assert_eq!(picker.apply_buffer(-1, 1.0), 0);
    }
}
