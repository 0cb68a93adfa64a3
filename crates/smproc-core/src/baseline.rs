//! # Baseline Correction
//!
//! Removal of low-order drift from integrated velocity. Two strategies:
//!
//! - **best-fit**: one polynomial over the whole record, order escalated
//!   from linear to quadratic until the residual dispersion test passes;
//! - **adaptive** (ABC): the record is split into pre-event, event, and
//!   post-event segments, each with an independently chosen polynomial
//!   order. Pre and post segments are fitted on their own intervals; the
//!   event segment is bridged between the two fit endpoints, straight or
//!   with a least-squares quadratic bow. Candidate splits and orders are
//!   ranked by the velocity QC residual; if no candidate passes QC the
//!   correction fails and the channel is routed to `NoAbc`.

use crate::qc::QcChecker;
use crate::trend;

/// Outcome of an adaptive search: the winning segmentation with its
/// corrected velocity and the residual it was ranked by.
#[derive(Debug, Clone)]
pub struct AdaptiveFit {
    pub pre_order: usize,
    pub event_order: usize,
    pub post_order: usize,
    /// First sample of the event segment.
    pub event_start: usize,
    /// First sample of the post-event segment.
    pub event_end: usize,
    pub residual: f64,
    pub corrected: Vec<f64>,
}

/// Minimum samples per segment for the adaptive search.
const MIN_SEGMENT: usize = 20;
/// Candidate post-event break positions examined per (order, order) pair.
const NUM_BREAK_CANDIDATES: usize = 8;

/// Single-polynomial correction over the whole record: order 1 first,
/// escalating to order 2 against the dispersion threshold. Returns the
/// order used, or `None` when no fit was acceptable (input unchanged
/// in that case).
pub fn best_fit_correction(velocity: &mut [f64], dt: f64, dispersion: f64) -> Option<i32> {
    let order = trend::remove_trend_with_best_fit(velocity, dt, dispersion);
    (order > 0).then_some(order)
}

/// Segmented search: for each (pre order, event order, post order,
/// break) candidate, fit the pre-event samples and the post-event
/// samples on their own intervals, bridge the event segment between the
/// two fit endpoints, subtract, and score the result with the velocity
/// QC check. The best-scoring passing candidate wins; `None` means no
/// candidate passed.
pub fn adaptive_correction(
    velocity: &[f64],
    dt: f64,
    onset: usize,
    qc: &QcChecker,
) -> Option<AdaptiveFit> {
    let n = velocity.len();
    if dt <= 0.0 || onset < MIN_SEGMENT || onset + 2 * MIN_SEGMENT >= n {
        return None;
    }
    let sps = 1.0 / dt;

    let mut best: Option<AdaptiveFit> = None;
    for pre_order in 1..=2usize {
        for event_order in 1..=2usize {
            for post_order in 1..=3usize {
                for b in 0..NUM_BREAK_CANDIDATES {
                    // Break candidates spread over the back half of the record.
                    let lo = (onset + MIN_SEGMENT).max(n / 2);
                    let hi = n - MIN_SEGMENT;
                    if lo >= hi {
                        continue;
                    }
                    let event_end = lo + (hi - lo) * b / NUM_BREAK_CANDIDATES;

                    let corrected = match apply_candidate(
                        velocity, dt, onset, event_end, pre_order, event_order, post_order,
                    ) {
                        Some(c) => c,
                        None => continue,
                    };
                    let outcome = qc.qc_velocity(&corrected, sps);
                    if !outcome.passed {
                        continue;
                    }
                    let score = outcome.residual.max(outcome.initial);
                    if best.as_ref().map_or(true, |f| score < f.residual) {
                        best = Some(AdaptiveFit {
                            pre_order,
                            event_order,
                            post_order,
                            event_start: onset,
                            event_end,
                            residual: score,
                            corrected,
                        });
                    }
                }
            }
        }
    }
    best
}

/// Build and subtract one candidate baseline. The baseline equals the
/// pre-event fit before the onset, the post-event fit after `event_end`,
/// and a bridge joining the two fit values in between: the straight line
/// for event order 1, or that line plus a least-squares quadratic bow
/// (zero at both seams, so the bridge stays continuous) for order 2.
fn apply_candidate(
    velocity: &[f64],
    dt: f64,
    onset: usize,
    event_end: usize,
    pre_order: usize,
    event_order: usize,
    post_order: usize,
) -> Option<Vec<f64>> {
    let n = velocity.len();
    let pre = trend::find_polynomial_trend(&velocity[..onset], pre_order, dt);
    let post = trend::find_polynomial_trend(&velocity[event_end..], post_order, dt);
    if pre.is_empty() || post.is_empty() {
        return None;
    }

    let pre_at = |i: usize| trend::polynomial_value(&pre, i as f64 * dt);
    let post_at = |i: usize| trend::polynomial_value(&post, (i - event_end) as f64 * dt);

    let v0 = pre_at(onset.saturating_sub(1));
    let v1 = post_at(event_end);
    let span = (event_end - onset) as f64;
    let line_at = |i: usize| v0 + (v1 - v0) * (i - onset) as f64 / span;

    // Quadratic bow amplitude fitted to the event-interval residual over
    // the straight bridge. The shape s(1-s) vanishes at both seams.
    let bow = if event_order >= 2 {
        let mut num = 0.0;
        let mut den = 0.0;
        for i in onset..event_end {
            let s = (i - onset) as f64 / span;
            let shape = s * (1.0 - s);
            num += shape * (velocity[i] - line_at(i));
            den += shape * shape;
        }
        if den > 0.0 {
            num / den
        } else {
            0.0
        }
    } else {
        0.0
    };

    let mut out = Vec::with_capacity(n);
    for (i, &v) in velocity.iter().enumerate() {
        let baseline = if i < onset {
            pre_at(i)
        } else if i < event_end {
            let s = (i - onset) as f64 / span;
            line_at(i) + bow * s * (1.0 - s)
        } else {
            post_at(i)
        };
        out.push(v - baseline);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn default_qc() -> QcChecker {
        QcChecker::new(&Config::new())
    }

    #[test]
    fn test_best_fit_removes_ramp() {
        let dt = 0.01;
        let mut v: Vec<f64> = (0..500).map(|i| 0.3 * i as f64 * dt).collect();
        let order = best_fit_correction(&mut v, dt, 1.0);
        assert_eq!(order, Some(1));
        assert!(v.iter().all(|&x| x.abs() < 1e-9));
    }

    #[test]
    fn test_best_fit_rejects_degenerate() {
        let mut v = vec![1.0, 2.0];
        assert_eq!(best_fit_correction(&mut v, 0.01, 1.0), None);
        assert_eq!(best_fit_correction(&mut v, 0.0, 1.0), None);
    }

    #[test]
    fn test_adaptive_removes_piecewise_drift() {
        // Flat pre-event, offset+drift post-event: the classic baseline
        // step from a tilted instrument.
        let dt = 0.01;
        let n = 2000;
        let onset = 600;
        let mut v = vec![0.0; n];
        for i in 1000..n {
            v[i] = 0.5 + 0.2 * (i - 1000) as f64 * dt;
        }
        let fit = adaptive_correction(&v, dt, onset, &default_qc()).expect("fit");
        let outcome = default_qc().qc_velocity(&fit.corrected, 1.0 / dt);
        assert!(outcome.passed);
        assert!(fit.residual <= 0.1);
        assert_eq!(fit.event_start, onset);
        assert!(fit.event_end > onset);
    }

    #[test]
    fn test_quadratic_bridge_tracks_event_bow() {
        // A bow with zero-valued flanks: the straight bridge leaves it
        // untouched, the quadratic bridge removes it entirely.
        let dt = 0.01;
        let n = 1000;
        let (onset, brk) = (200, 800);
        let mut v = vec![0.0; n];
        for i in onset..brk {
            let s = (i - onset) as f64 / (brk - onset) as f64;
            v[i] = 0.8 * s * (1.0 - s);
        }
        let straight = apply_candidate(&v, dt, onset, brk, 1, 1, 1).expect("candidate");
        let bowed = apply_candidate(&v, dt, onset, brk, 1, 2, 1).expect("candidate");
        assert!(straight.iter().any(|&x| x.abs() > 0.15));
        assert!(bowed.iter().all(|&x| x.abs() < 1e-6));
    }

    #[test]
    fn test_adaptive_rejects_short_or_early_onset() {
        let v = vec![0.0; 100];
        assert!(adaptive_correction(&v, 0.01, 5, &default_qc()).is_none());
        assert!(adaptive_correction(&v, 0.01, 90, &default_qc()).is_none());
        assert!(adaptive_correction(&v, 0.0, 50, &default_qc()).is_none());
    }

    #[test]
    fn test_adaptive_no_fit_on_exponential_tail() {
        // Exponential growth outruns every cubic: the trailing-window
        // residual stays far above the QC bound for all candidates.
        let dt = 0.01;
        let n = 1000;
        let mut v = vec![0.0; n];
        for i in 500..n {
            v[i] = (0.02 * (i - 500) as f64).exp();
        }
        assert!(adaptive_correction(&v, dt, 100, &default_qc()).is_none());
    }
}
