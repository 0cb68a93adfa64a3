//! # Array Primitives
//!
//! Leaf numeric utilities used throughout the processing chain: statistics,
//! tapering, zero-crossing search, signal-to-noise estimation, and linear
//! interpolation.
//!
//! None of these functions return `Result`. On null/empty input or
//! degenerate parameters they return a defined "not computable" sentinel
//! (empty array, −1/−2, or [`SENTINEL_EXTREME`]) so that the stage
//! orchestrators can branch on data quality without exception handling in
//! hot numeric code.

use crate::types::SENTINEL_EXTREME;

/// Direction for [`find_zero_crossing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDir {
    /// Scan toward higher indices.
    Forward,
    /// Scan toward lower indices.
    Backward,
}

/// Arithmetic mean; [`SENTINEL_EXTREME`] on empty input.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return SENTINEL_EXTREME;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Subtract a constant from every sample.
pub fn remove_value(data: &mut [f64], value: f64) {
    for x in data.iter_mut() {
        *x -= value;
    }
}

/// Subtract the mean in place; returns the mean removed, or
/// [`SENTINEL_EXTREME`] (and no change) on empty input.
pub fn remove_mean(data: &mut [f64]) -> f64 {
    let m = mean(data);
    if m == SENTINEL_EXTREME {
        return m;
    }
    remove_value(data, m);
    m
}

/// Index and value of the sample with the largest absolute value.
pub fn find_peak(data: &[f64]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &x) in data.iter().enumerate() {
        match best {
            Some((_, v)) if x.abs() <= v.abs() => {}
            _ => best = Some((i, x)),
        }
    }
    best
}

/// Standard deviation; population by default, sample (n−1) otherwise.
/// Fewer than 2 samples yields [`SENTINEL_EXTREME`].
pub fn find_standard_dev(data: &[f64], population: bool) -> f64 {
    if data.len() < 2 {
        return SENTINEL_EXTREME;
    }
    let m = mean(data);
    let ss: f64 = data.iter().map(|&x| (x - m) * (x - m)).sum();
    let denom = if population {
        data.len() as f64
    } else {
        (data.len() - 1) as f64
    };
    (ss / denom).sqrt()
}

/// Root-mean-square; [`SENTINEL_EXTREME`] on empty input.
pub fn rms(data: &[f64]) -> f64 {
    if data.is_empty() {
        return SENTINEL_EXTREME;
    }
    (data.iter().map(|&x| x * x).sum::<f64>() / data.len() as f64).sqrt()
}

/// Ratio of post-window to pre-window RMS power.
///
/// The window `[0, window_end)` is treated as noise and the remainder as
/// signal. Returns −1.0 when the array is empty, `window_end` is zero or
/// not inside the array, or the noise power is zero.
pub fn calc_signal_to_noise_ratio(data: &[f64], window_end: usize) -> f64 {
    if data.is_empty() || window_end == 0 || window_end >= data.len() {
        return -1.0;
    }
    let noise = rms(&data[..window_end]);
    let signal = rms(&data[window_end..]);
    if noise == 0.0 || noise == SENTINEL_EXTREME || signal == SENTINEL_EXTREME {
        return -1.0;
    }
    signal / noise
}

/// Apply a half-cosine taper to the first `front` and last `end` samples.
///
/// Requires `front == end`, both positive, and `2*front <= data.len()`;
/// any other request leaves the array unchanged and returns `false`.
/// The ramp starts at weight zero, so the first and last samples of a
/// tapered array are exactly zero.
pub fn apply_cosine_taper(data: &mut [f64], front: usize, end: usize) -> bool {
    if front != end || front == 0 || 2 * front > data.len() {
        return false;
    }
    let n = data.len();
    for i in 0..front {
        let w = 0.5 * (1.0 - (std::f64::consts::PI * i as f64 / front as f64).cos());
        data[i] *= w;
        data[n - 1 - i] *= w;
    }
    true
}

/// Scan outward from `start` for a sign change.
///
/// Forward: returns the smallest `j > start` such that the sign changes
/// between `j-1` and `j`. Backward: the largest `j < start` with a sign
/// change between `j` and `j+1`. Returns −1 if no crossing is found within
/// bounds and −2 on invalid input (empty array or `start` out of bounds).
pub fn find_zero_crossing(data: &[f64], start: usize, dir: SearchDir) -> isize {
    if data.is_empty() || start >= data.len() {
        return -2;
    }
    match dir {
        SearchDir::Forward => {
            for j in (start + 1)..data.len() {
                if data[j - 1] * data[j] <= 0.0 {
                    return j as isize;
                }
            }
            -1
        }
        SearchDir::Backward => {
            for j in (0..start).rev() {
                if data[j] * data[j + 1] <= 0.0 {
                    return j as isize;
                }
            }
            -1
        }
    }
}

/// Polynomial interpolation of `(known_x, known_y)` at the query abscissas.
///
/// Only degree 1 (piecewise linear, with end-segment extrapolation) is
/// supported. Mismatched array lengths, fewer than 2 knots, or an
/// unsupported degree yield an empty result.
pub fn interpolate(known_x: &[f64], known_y: &[f64], query_x: &[f64], degree: usize) -> Vec<f64> {
    if degree != 1 || known_x.len() != known_y.len() || known_x.len() < 2 {
        return Vec::new();
    }
    let n = known_x.len();
    let mut out = Vec::with_capacity(query_x.len());
    for &x in query_x {
        // Locate the bracketing segment; clamp to the end segments for
        // extrapolation.
        let mut k = n - 2;
        for i in 0..n - 1 {
            if x <= known_x[i + 1] {
                k = i;
                break;
            }
        }
        let (x0, x1) = (known_x[k], known_x[k + 1]);
        let (y0, y1) = (known_y[k], known_y[k + 1]);
        let t = if x1 != x0 { (x - x0) / (x1 - x0) } else { 0.0 };
        out.push(y0 + t * (y1 - y0));
    }
    out
}
