//! # Despiking
//!
//! Detection and interpolation-based removal of transient outlier samples
//! (telemetry dropouts, digitizer glitches) from a raw trace before unit
//! conversion downstream work amplifies them.
//!
//! Detection is histogram-modal: the first difference of the trace is
//! overwhelmingly concentrated near the modal bin for real ground motion,
//! while a spike produces a step far outside it. Flagged samples are
//! repaired by linear interpolation between the nearest in-bound
//! neighbors.

use crate::array_ops;
use crate::types::SENTINEL_EXTREME;

/// Number of neighbor samples searched on each side during repair.
const NUM_NEIGHBORS: usize = 5;
/// Histogram bins used for the modal estimate.
const NUM_BINS: usize = 4;
/// Detection passes over the record.
const NUM_PASSES: usize = 2;
/// Local window length for the per-sample modal bound.
const WINDOW_SIZE: usize = 25;

/// Summary of a despiking run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DespikeResult {
    /// Whether any spike was found.
    pub found: bool,
    /// Index of the first repaired sample, −1 when none.
    pub first: isize,
    /// Index of the last repaired sample, −1 when none.
    pub last: isize,
    /// Total samples repaired across all passes.
    pub fixed: usize,
}

/// Histogram over `[min, max]`; returns counts plus bin origin and width.
fn histogram(data: &[f64], bins: usize) -> Option<(Vec<usize>, f64, f64)> {
    if data.is_empty() || bins == 0 {
        return None;
    }
    let min = data.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !(max > min) {
        return None;
    }
    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &x in data {
        let b = (((x - min) / width) as usize).min(bins - 1);
        counts[b] += 1;
    }
    Some((counts, min, width))
}

/// Spike detector/repairer with a configurable deviation multiplier.
#[derive(Debug, Clone)]
pub struct Despiker {
    num_std: f64,
}

impl Despiker {
    /// `num_std` scales how far outside the modal bin a sample may sit
    /// before it is treated as a spike.
    pub fn new(num_std: f64) -> Self {
        Self { num_std }
    }

    /// Examine one sample against its windowed modal bounds and repair it
    /// if it falls outside. Returns 1 when the sample was replaced, 0 when
    /// it was within bounds (or the window is degenerate).
    pub fn spike_fix(&self, data: &mut [f64], index: usize) -> u32 {
        if index >= data.len() {
            return 0;
        }
        let lo = index.saturating_sub(WINDOW_SIZE / 2);
        let hi = (index + WINDOW_SIZE / 2 + 1).min(data.len());
        let window: Vec<f64> = data[lo..hi].to_vec();

        let (counts, min, width) = match histogram(&window, NUM_BINS) {
            Some(h) => h,
            None => return 0,
        };
        let modal = counts
            .iter()
            .enumerate()
            .max_by_key(|&(_, &c)| c)
            .map(|(b, _)| b)
            .unwrap_or(0);
        let sigma = array_ops::find_standard_dev(&window, true);
        if sigma == SENTINEL_EXTREME {
            return 0;
        }
        let bound_lo = min + modal as f64 * width - self.num_std * sigma;
        let bound_hi = min + (modal + 1) as f64 * width + self.num_std * sigma;
        let in_bound = |v: f64| v >= bound_lo && v <= bound_hi;

        if in_bound(data[index]) {
            return 0;
        }

        // Nearest in-bound neighbor on each side, searched a few samples out.
        let left = (1..=NUM_NEIGHBORS)
            .filter_map(|k| index.checked_sub(k))
            .find(|&j| in_bound(data[j]));
        let right = (1..=NUM_NEIGHBORS)
            .map(|k| index + k)
            .find(|&j| j < data.len() && in_bound(data[j]));

        data[index] = match (left, right) {
            (Some(l), Some(r)) => {
                let t = (index - l) as f64 / (r - l) as f64;
                data[l] + t * (data[r] - data[l])
            }
            (Some(l), None) => data[l],
            (None, Some(r)) => data[r],
            (None, None) => data[index].clamp(bound_lo, bound_hi),
        };
        1
    }

    /// Find and repair spikes across the whole record.
    ///
    /// Differentiates the trace (first difference), builds a histogram-modal
    /// threshold on the absolute step sizes, repairs every flagged sample
    /// through [`Self::spike_fix`], and repeats for up to two passes.
    /// Empty input returns `found == false` with indices −1.
    pub fn remove_spikes(&self, data: &mut [f64], dt: f64) -> DespikeResult {
        let mut result = DespikeResult {
            found: false,
            first: -1,
            last: -1,
            fixed: 0,
        };
        if data.len() < 3 || dt <= 0.0 {
            return result;
        }

        for _pass in 0..NUM_PASSES {
            let steps: Vec<f64> = data
                .windows(2)
                .map(|w| ((w[1] - w[0]) / dt).abs())
                .collect();
            let sigma = array_ops::find_standard_dev(&steps, true);
            let (counts, min, width) = match histogram(&steps, NUM_BINS) {
                Some(h) => h,
                None => break,
            };
            if sigma == SENTINEL_EXTREME {
                break;
            }
            let modal = counts
                .iter()
                .enumerate()
                .max_by_key(|&(_, &c)| c)
                .map(|(b, _)| b)
                .unwrap_or(0);
            let threshold = min + (modal as f64 + 0.5) * width + self.num_std * sigma;

            // A spike at sample s produces large steps at s-1 and s; flag
            // the trailing index so spike_fix examines the spike itself.
            let flagged: Vec<usize> = steps
                .iter()
                .enumerate()
                .filter(|&(_, &d)| d > threshold)
                .map(|(i, _)| i + 1)
                .collect();
            if flagged.is_empty() {
                break;
            }

            let mut fixed_this_pass = 0;
            for &i in &flagged {
                if self.spike_fix(data, i) == 1 {
                    fixed_this_pass += 1;
                    result.found = true;
                    if result.first < 0 {
                        result.first = i as isize;
                    }
                    result.last = i as isize;
                }
            }
            result.fixed += fixed_this_pass;
            if fixed_this_pass == 0 {
                break;
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_empty_input() {
        let d = Despiker::new(3.0);
        let mut data: Vec<f64> = Vec::new();
        let r = d.remove_spikes(&mut data, 0.01);
        assert!(!r.found);
        assert_eq!(r.first, -1);
        assert_eq!(r.last, -1);
    }

    #[test]
    fn test_spike_fix_repairs_outlier() {
        let d = Despiker::new(3.0);
        let mut data = vec![1.0; 30];
        data[10] = 50.0;
        assert_eq!(d.spike_fix(&mut data, 10), 1);
        assert!((data[10] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_spike_fix_leaves_inlier() {
        let d = Despiker::new(3.0);
        let mut data: Vec<f64> = (0..30).map(|i| (i as f64 * 0.3).sin()).collect();
        let before = data[12];
        assert_eq!(d.spike_fix(&mut data, 12), 0);
        assert_eq!(data[12], before);
    }

    #[test]
    fn test_remove_spikes_on_sine() {
        let dt = 0.01;
        let clean: Vec<f64> = (0..1000).map(|i| (2.0 * PI * i as f64 * dt).sin()).collect();
        let mut data = clean.clone();
        data[200] += 40.0;
        data[750] -= 35.0;

        let d = Despiker::new(3.0);
        let r = d.remove_spikes(&mut data, dt);
        assert!(r.found);
        assert_eq!(r.first, 200);
        assert_eq!(r.last, 750);
        assert!((data[200] - clean[200]).abs() < 0.2);
        assert!((data[750] - clean[750]).abs() < 0.2);
    }

    #[test]
    fn test_clean_record_untouched() {
        let dt = 0.01;
        let mut data: Vec<f64> = (0..500).map(|i| (2.0 * PI * i as f64 * dt).sin()).collect();
        let orig = data.clone();
        let r = Despiker::new(4.0).remove_spikes(&mut data, dt);
        assert!(!r.found);
        assert_eq!(data, orig);
    }
}
