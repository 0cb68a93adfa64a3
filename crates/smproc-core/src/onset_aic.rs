//! # AIC Event-Onset Picker
//!
//! Locates the sample where seismic energy begins by minimizing an
//! Akaike-Information-Criterion characteristic function over the trace:
//!
//! ```text
//! aic(k) = k * ln(var(x[0..k])) + (n - k - 1) * ln(var(x[k..n]))
//! ```
//!
//! The minimum separates the record into a low-variance noise segment and
//! a high-variance signal segment. In `"topeak"` mode the search window is
//! restricted to samples before the global absolute peak, which guards
//! against late coda energy pulling the pick forward on long records.

use crate::array_ops;

/// Search mode value that restricts the pick to before the global peak.
pub const MODE_TO_PEAK: &str = "topeak";

/// Index of the AIC extremum, or −1 on empty/too-short input.
///
/// Mode `"topeak"` searches only up to the global absolute peak; any other
/// value (including empty) searches the whole trace.
pub fn calculate_index(data: &[f64], mode: &str) -> isize {
    if data.len() < 3 {
        return -1;
    }
    let end = if mode == MODE_TO_PEAK {
        match array_ops::find_peak(data) {
            Some((i, _)) if i >= 3 => i,
            _ => data.len(),
        }
    } else {
        data.len()
    };

    // Running sums give O(n) variances on both sides of each split.
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let totals: (f64, f64) = data[..end]
        .iter()
        .fold((0.0, 0.0), |(s, q), &x| (s + x, q + x * x));

    let n = end;
    let mut best_k = 1usize;
    let mut best_aic = f64::INFINITY;
    for k in 1..n - 1 {
        let x = data[k - 1];
        sum += x;
        sum_sq += x * x;

        let var_front = (sum_sq - sum * sum / k as f64) / k as f64;
        let rem = (n - k) as f64;
        let (rs, rq) = (totals.0 - sum, totals.1 - sum_sq);
        let var_back = (rq - rs * rs / rem) / rem;

        let aic = k as f64 * var_front.max(1e-30).ln()
            + (n - k - 1) as f64 * var_back.max(1e-30).ln();
        if aic < best_aic {
            best_aic = aic;
            best_k = k;
        }
    }
    best_k as isize
}

/// Back the pick off by a fixed time buffer.
///
/// Returns −1 when `dt` is zero or negative, 0 when the requested buffer
/// exceeds the samples before the pick (or the pick itself is invalid),
/// and the buffered index otherwise. The 0/−1 split mirrors the two
/// historical code paths and is relied on by callers.
pub fn apply_buffer(onset: isize, buffer_sec: f64, dt: f64) -> isize {
    if dt <= 0.0 {
        return -1;
    }
    if onset < 0 {
        return 0;
    }
    let buffer_samples = (buffer_sec / dt).round() as isize;
    if buffer_samples > onset {
        return 0;
    }
    onset - buffer_samples
}
