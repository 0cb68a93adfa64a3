//! # Band-Pass Corner Selection
//!
//! Chooses the (low, high) corner frequencies for the stage-2 band-pass
//! filter. Three sources, in priority order:
//!
//! 1. a per-station override table ([`crate::station::StationTable`]),
//! 2. the magnitude/sample-rate default table in this module,
//! 3. noise-spectrum intersection analysis: least-squares lines fitted to
//!    the pre-event (noise) and post-onset (signal) Fourier amplitude
//!    spectra, intersected in log-log space.
//!
//! Magnitude selection follows the fixed priority moment > local >
//! surface > other; when every estimate equals the no-value sentinel the
//! magnitude is `Invalid` and the corners degenerate to (0, 0).

use crate::fft_calc::FftCalc;
use crate::trend;

/// Which magnitude estimate was selected, or why none was usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagnitudeKind {
    Moment,
    Local,
    Surface,
    Other,
    /// Every estimate equalled the sentinel.
    Invalid,
    /// The sample rate is too low for the magnitude bracket's corners.
    LowSps,
}

/// Corner-frequency selection result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerThresholds {
    pub kind: MagnitudeKind,
    pub low: f64,
    pub high: f64,
}

/// Default corner table bracketed by magnitude: `(min magnitude, low
/// corner, high corner, minimum usable sample rate)`.
const MAG_BRACKETS: [(f64, f64, f64, f64); 5] = [
    (6.5, 0.05, 40.0, 100.0),
    (5.5, 0.1, 40.0, 100.0),
    (4.5, 0.3, 35.0, 80.0),
    (3.5, 0.5, 25.0, 60.0),
    (f64::NEG_INFINITY, 0.5, 20.0, 50.0),
];

/// Boxcar half-width for FAS smoothing (window of 2*HW + 1 bins).
const SMOOTH_HALF_WIDTH: usize = 4;

/// Choose a magnitude by fixed priority (moment > local > surface >
/// other). An estimate counts as present when it differs from the
/// sentinel and is finite.
pub fn select_magnitude(
    moment: f64,
    local: f64,
    surface: f64,
    other: f64,
    no_value: f64,
) -> (MagnitudeKind, f64) {
    let present = |v: f64| v.is_finite() && (v - no_value).abs() > 1e-9;
    if present(moment) {
        (MagnitudeKind::Moment, moment)
    } else if present(local) {
        (MagnitudeKind::Local, local)
    } else if present(surface) {
        (MagnitudeKind::Surface, surface)
    } else if present(other) {
        (MagnitudeKind::Other, other)
    } else {
        (MagnitudeKind::Invalid, no_value)
    }
}

/// Default corners for a magnitude bracket at the given sample rate.
///
/// `LowSps` (corners (0, 0)) when the rate cannot support the bracket's
/// high corner; `Invalid` passes through as (0, 0).
pub fn select_mag_thresholds(kind: MagnitudeKind, magnitude: f64, sps: f64) -> CornerThresholds {
    if matches!(kind, MagnitudeKind::Invalid | MagnitudeKind::LowSps) {
        return CornerThresholds {
            kind: MagnitudeKind::Invalid,
            low: 0.0,
            high: 0.0,
        };
    }
    for &(min_mag, low, high, min_sps) in &MAG_BRACKETS {
        if magnitude >= min_mag {
            if sps < min_sps {
                return CornerThresholds {
                    kind: MagnitudeKind::LowSps,
                    low: 0.0,
                    high: 0.0,
                };
            }
            return CornerThresholds { kind, low, high };
        }
    }
    // NEG_INFINITY bracket always matches.
    unreachable!("magnitude bracket table has a catch-all row")
}

/// Boxcar smoothing of a Fourier amplitude spectrum; the window shrinks
/// at the edges. Empty on empty input.
pub fn smooth_fas(spectrum: &[f64]) -> Vec<f64> {
    if spectrum.is_empty() {
        return Vec::new();
    }
    let n = spectrum.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let lo = i.saturating_sub(SMOOTH_HALF_WIDTH);
        let hi = (i + SMOOTH_HALF_WIDTH + 1).min(n);
        let w = &spectrum[lo..hi];
        out.push(w.iter().sum::<f64>() / w.len() as f64);
    }
    out
}

/// Intersection of the least-squares lines through `(x1, y1)` and
/// `(x2, y2)`: solves the 2×2 system for `(x, y)`. Returns `[0, 0]` on
/// malformed input (mismatched or too-short arrays) or parallel lines.
pub fn find_intersection(x1: &[f64], y1: &[f64], x2: &[f64], y2: &[f64]) -> [f64; 2] {
    if x1.len() != y1.len() || x2.len() != y2.len() || x1.len() < 2 || x2.len() < 2 {
        return [0.0, 0.0];
    }
    let l1 = trend::fit_polynomial(x1, y1, 1);
    let l2 = trend::fit_polynomial(x2, y2, 1);
    if l1.len() != 2 || l2.len() != 2 {
        return [0.0, 0.0];
    }
    let (c1, m1) = (l1[0], l1[1]);
    let (c2, m2) = (l2[0], l2[1]);
    if (m1 - m2).abs() < 1e-15 {
        return [0.0, 0.0];
    }
    let x = (c2 - c1) / (m1 - m2);
    [x, m1 * x + c1]
}

/// Corner frequencies from noise-spectrum intersection analysis.
///
/// Splits the trace at the event onset, computes smoothed Fourier
/// amplitude spectra of the noise and signal segments on a common
/// frequency axis, and intersects fitted log-log lines in a low band and
/// a high band. `original_sps` bounds the usable high corner when the
/// record was resampled. Returns `[[f_low, amp], [f_high, amp]]`, or the
/// zero matrix on malformed input (empty/short arrays, onset out of
/// range, non-positive rates).
pub fn find_freq_thresholds(
    data: &[f64],
    onset: usize,
    sps: f64,
    original_sps: f64,
) -> [[f64; 2]; 2] {
    const ZERO: [[f64; 2]; 2] = [[0.0, 0.0], [0.0, 0.0]];
    if data.len() < 64 || onset < 16 || onset + 16 > data.len() || sps <= 0.0 {
        return ZERO;
    }
    let dt = 1.0 / sps;
    let nyquist = 0.5 * sps;
    let usable_high = if original_sps > 0.0 {
        nyquist.min(0.5 * original_sps)
    } else {
        nyquist
    };

    // Common axis: pad both segments to the longer segment's FFT size.
    let n2 = FftCalc::pad_length(onset.max(data.len() - onset));
    let mut noise = data[..onset].to_vec();
    let mut signal = data[onset..].to_vec();
    noise.resize(n2, 0.0);
    signal.resize(n2, 0.0);

    let mut fft = FftCalc::new();
    let (freqs, noise_fas) = fft.fas(&noise, dt);
    let (_, signal_fas) = fft.fas(&signal, dt);
    let noise_fas = smooth_fas(&noise_fas);
    let signal_fas = smooth_fas(&signal_fas);

    // Log-log samples within a band, skipping the DC bin.
    let band = |lo: f64, hi: f64, amps: &[f64]| -> (Vec<f64>, Vec<f64>) {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for (k, &f) in freqs.iter().enumerate().skip(1) {
            if f >= lo && f <= hi {
                xs.push(f.log10());
                ys.push(amps[k].max(1e-20).log10());
            }
        }
        (xs, ys)
    };

    // Below the split the signal spectrum rises out of the noise (the low
    // corner lives there); above it the signal decays back into the noise.
    let split = 0.1 * usable_high;
    let low_band = (freqs[1], split);
    let high_band = (split, usable_high);

    let (nx, ny) = band(low_band.0, low_band.1, &noise_fas);
    let (sx, sy) = band(low_band.0, low_band.1, &signal_fas);
    let low = find_intersection(&nx, &ny, &sx, &sy);

    let (nx, ny) = band(high_band.0, high_band.1, &noise_fas);
    let (sx, sy) = band(high_band.0, high_band.1, &signal_fas);
    let high = find_intersection(&nx, &ny, &sx, &sy);

    // Back out of log space and keep each corner inside its own band;
    // a missing intersection stays a zero row for the caller to branch on.
    let expand = |p: [f64; 2], lo: f64, hi: f64| -> [f64; 2] {
        if p == [0.0, 0.0] {
            return p;
        }
        let f = 10f64.powf(p[0]);
        if !f.is_finite() || f <= 0.0 {
            return [0.0, 0.0];
        }
        [f.clamp(lo, hi), 10f64.powf(p[1])]
    };
    [
        expand(low, low_band.0, low_band.1),
        expand(high, high_band.0, high_band.1),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::PI;

    const NO_VALUE: f64 = -999.0;

    #[test]
    fn test_magnitude_priority() {
        let (k, m) = select_magnitude(6.1, 5.8, NO_VALUE, 4.0, NO_VALUE);
        assert_eq!(k, MagnitudeKind::Moment);
        assert_eq!(m, 6.1);

        let (k, m) = select_magnitude(NO_VALUE, 5.8, 5.5, NO_VALUE, NO_VALUE);
        assert_eq!(k, MagnitudeKind::Local);
        assert_eq!(m, 5.8);

        let (k, _) = select_magnitude(NO_VALUE, NO_VALUE, 5.5, 4.0, NO_VALUE);
        assert_eq!(k, MagnitudeKind::Surface);

        let (k, _) = select_magnitude(NO_VALUE, NO_VALUE, NO_VALUE, 4.0, NO_VALUE);
        assert_eq!(k, MagnitudeKind::Other);

        let (k, _) = select_magnitude(NO_VALUE, NO_VALUE, NO_VALUE, NO_VALUE, NO_VALUE);
        assert_eq!(k, MagnitudeKind::Invalid);
    }

    #[test]
    fn test_threshold_table_brackets() {
        let c = select_mag_thresholds(MagnitudeKind::Moment, 6.8, 200.0);
        assert_eq!((c.low, c.high), (0.05, 40.0));

        let c = select_mag_thresholds(MagnitudeKind::Local, 4.9, 100.0);
        assert_eq!((c.low, c.high), (0.3, 35.0));

        let c = select_mag_thresholds(MagnitudeKind::Other, 2.0, 200.0);
        assert_eq!((c.low, c.high), (0.5, 20.0));
    }

    #[test]
    fn test_low_sample_rate_yields_lowsps() {
        let c = select_mag_thresholds(MagnitudeKind::Moment, 6.8, 50.0);
        assert_eq!(c.kind, MagnitudeKind::LowSps);
        assert_eq!((c.low, c.high), (0.0, 0.0));
    }

    #[test]
    fn test_invalid_magnitude_yields_zero_corners() {
        let c = select_mag_thresholds(MagnitudeKind::Invalid, NO_VALUE, 200.0);
        assert_eq!(c.kind, MagnitudeKind::Invalid);
        assert_eq!((c.low, c.high), (0.0, 0.0));
    }

    #[test]
    fn test_smooth_fas() {
        assert!(smooth_fas(&[]).is_empty());
        let spiky = vec![0.0, 0.0, 9.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let s = smooth_fas(&spiky);
        assert_eq!(s.len(), spiky.len());
        // Energy spread, peak reduced.
        assert!(s[2] < 9.0);
        assert!(s[5] > 0.0);
    }

    #[test]
    fn test_find_intersection() {
        // y = x and y = -x + 2 meet at (1, 1).
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y1 = x.clone();
        let y2: Vec<f64> = x.iter().map(|&v| 2.0 - v).collect();
        let p = find_intersection(&x, &y1, &x, &y2);
        assert!((p[0] - 1.0).abs() < 1e-9);
        assert!((p[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_find_intersection_malformed() {
        let x = [0.0, 1.0];
        assert_eq!(find_intersection(&x, &[1.0], &x, &x), [0.0, 0.0]);
        assert_eq!(find_intersection(&[], &[], &x, &x), [0.0, 0.0]);
        // Parallel lines.
        let y1 = [1.0, 2.0];
        let y2 = [3.0, 4.0];
        assert_eq!(find_intersection(&x, &y1, &x, &y2), [0.0, 0.0]);
    }

    #[test]
    fn test_freq_thresholds_sensible_band() {
        // Broadband noise everywhere, a strong 1-10 Hz signal after onset.
        let sps = 100.0;
        let dt = 1.0 / sps;
        let onset = 1024;
        let mut rng = StdRng::seed_from_u64(21);
        let data: Vec<f64> = (0..4096)
            .map(|i| {
                let noise: f64 = rng.gen_range(-0.02..0.02);
                if i >= onset {
                    let t = (i - onset) as f64 * dt;
                    noise
                        + (2.0 * PI * 1.5 * t).sin()
                        + 0.8 * (2.0 * PI * 4.0 * t).sin()
                        + 0.5 * (2.0 * PI * 9.0 * t).sin()
                } else {
                    noise
                }
            })
            .collect();
        let m = find_freq_thresholds(&data, onset, sps, sps);
        let (low, high) = (m[0][0], m[1][0]);
        assert!(low > 0.0 && low <= 5.0, "low corner {low}");
        assert!(high >= 5.0 && high <= 0.5 * sps, "high corner {high}");
        assert!(high > low);
    }

    #[test]
    fn test_freq_thresholds_malformed_zero_matrix() {
        assert_eq!(find_freq_thresholds(&[], 10, 100.0, 100.0), [[0.0; 2]; 2]);
        let short = vec![0.0; 32];
        assert_eq!(find_freq_thresholds(&short, 16, 100.0, 100.0), [[0.0; 2]; 2]);
        let ok = vec![0.1; 256];
        assert_eq!(find_freq_thresholds(&ok, 4, 100.0, 100.0), [[0.0; 2]; 2]);
        assert_eq!(find_freq_thresholds(&ok, 128, 0.0, 100.0), [[0.0; 2]; 2]);
    }
}
