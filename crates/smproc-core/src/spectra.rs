//! # Response Spectra
//!
//! Elastic response spectra on the standard 91-period grid, for the five
//! standard damping ratios at the four supported sampling rates. The
//! SDOF recursion coefficients for every (rate, damping, period) triple
//! are built once behind a `LazyLock` and shared; spectrum computation
//! is a table lookup plus one recursion pass per period.
//!
//! ## Example
//! ```
//! use smproc_core::spectra;
//!
//! let accel: Vec<f64> = (0..2000)
//!     .map(|i| (2.0 * std::f64::consts::PI * 2.0 * i as f64 * 0.005).sin())
//!     .collect();
//! let spectrum = spectra::response_spectrum(&accel, 0.005, 0.05);
//! assert_eq!(spectrum.sd.len(), spectra::NUM_PERIODS);
//! ```

use crate::sdof::{self, SdofCoefficients};
use serde::Serialize;
use std::f64::consts::PI;
use std::sync::LazyLock;

pub const NUM_PERIODS: usize = 91;

/// The standard 91-period grid in seconds, 0.04 s to 15 s with graded
/// spacing. Contains 0.3, 1.0, and 3.0 s exactly.
pub const PERIODS: [f64; NUM_PERIODS] = [
    0.04, 0.042, 0.044, 0.046, 0.048, 0.05, 0.055, 0.06, 0.065, 0.07, 0.075, 0.08, 0.085, 0.09,
    0.095, 0.1, 0.11, 0.12, 0.13, 0.14, 0.15, 0.16, 0.17, 0.18, 0.19, 0.2, 0.22, 0.24, 0.26, 0.28,
    0.3, 0.32, 0.34, 0.36, 0.38, 0.4, 0.42, 0.44, 0.46, 0.48, 0.5, 0.55, 0.6, 0.65, 0.7, 0.75,
    0.8, 0.85, 0.9, 0.95, 1.0, 1.1, 1.2, 1.3, 1.4, 1.5, 1.6, 1.7, 1.8, 1.9, 2.0, 2.2, 2.4, 2.6,
    2.8, 3.0, 3.2, 3.4, 3.6, 3.8, 4.0, 4.2, 4.4, 4.6, 4.8, 5.0, 5.5, 6.0, 6.5, 7.0, 7.5, 8.0,
    8.5, 9.0, 9.5, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0,
];

/// Damping ratios with precomputed coefficient tables.
pub const DAMPING_RATIOS: [f64; 5] = [0.0, 0.02, 0.05, 0.10, 0.20];

/// Sampling rates with precomputed coefficient tables.
pub const SAMPLE_RATES: [f64; 4] = [50.0, 100.0, 200.0, 500.0];

/// Periods reported as named ordinates (s).
pub const ORDINATE_PERIODS: [f64; 3] = [0.3, 1.0, 3.0];

type PeriodTable = [SdofCoefficients; NUM_PERIODS];

/// [rate][damping] -> 91 coefficient sextets.
static COEF_TABLES: LazyLock<Box<[[PeriodTable; 5]; 4]>> = LazyLock::new(|| {
    let mut tables = Box::new([[[[0.0; 6]; NUM_PERIODS]; 5]; 4]);
    for (r, &sps) in SAMPLE_RATES.iter().enumerate() {
        let dt = 1.0 / sps;
        for (d, &damping) in DAMPING_RATIOS.iter().enumerate() {
            for (p, &period) in PERIODS.iter().enumerate() {
                // Every grid point is a valid oscillator.
                tables[r][d][p] = sdof::coefficients(period, damping, dt).unwrap_or([0.0; 6]);
            }
        }
    }
    tables
});

fn nearest(values: &[f64], target: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::MAX;
    for (i, &v) in values.iter().enumerate() {
        let dist = (v - target).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

/// The precomputed 91-entry coefficient table nearest to the requested
/// sampling rate and damping ratio.
pub fn get_coef_array(sps: f64, damping: f64) -> &'static PeriodTable {
    let r = nearest(&SAMPLE_RATES, sps);
    let d = nearest(&DAMPING_RATIOS, damping);
    &COEF_TABLES[r][d]
}

/// One spectrum at a single damping ratio: per-period maxima of relative
/// displacement (sd, cm), relative velocity (sv, cm/s), and
/// pseudo-absolute acceleration (psa = ωn²·sd, cm/s²).
#[derive(Debug, Clone, Serialize)]
pub struct ResponseSpectrum {
    pub damping: f64,
    pub periods: Vec<f64>,
    pub sd: Vec<f64>,
    pub sv: Vec<f64>,
    pub psa: Vec<f64>,
}

impl ResponseSpectrum {
    /// Value of the named array at an exact grid period, if present.
    pub fn ordinate_at(&self, period: f64) -> Option<SpectrumOrdinate> {
        let i = self.periods.iter().position(|&p| (p - period).abs() < 1e-12)?;
        Some(SpectrumOrdinate {
            period,
            sd: self.sd[i],
            sv: self.sv[i],
            psa: self.psa[i],
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SpectrumOrdinate {
    pub period: f64,
    pub sd: f64,
    pub sv: f64,
    pub psa: f64,
}

/// Compute the spectrum of `accel` (cm/s², sampled at `1/dt` sps) at one
/// damping ratio across the full period grid. Empty input gives
/// all-zero spectra.
pub fn response_spectrum(accel: &[f64], dt: f64, damping: f64) -> ResponseSpectrum {
    let mut out = ResponseSpectrum {
        damping,
        periods: PERIODS.to_vec(),
        sd: vec![0.0; NUM_PERIODS],
        sv: vec![0.0; NUM_PERIODS],
        psa: vec![0.0; NUM_PERIODS],
    };
    if accel.is_empty() || dt <= 0.0 {
        return out;
    }
    let table = get_coef_array(1.0 / dt, damping);
    for (p, &period) in PERIODS.iter().enumerate() {
        let (u, v) = sdof::response(&table[p], accel);
        let sd = u.iter().fold(0.0f64, |m, &x| m.max(x.abs()));
        let sv = v.iter().fold(0.0f64, |m, &x| m.max(x.abs()));
        let wn = 2.0 * PI / period;
        out.sd[p] = sd;
        out.sv[p] = sv;
        out.psa[p] = wn * wn * sd;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_grid_shape() {
        assert_eq!(PERIODS.len(), 91);
        for w in PERIODS.windows(2) {
            assert!(w[1] > w[0], "grid must be strictly increasing");
        }
        for &p in &ORDINATE_PERIODS {
            assert!(PERIODS.contains(&p), "missing ordinate period {p}");
        }
    }

    #[test]
    fn test_get_coef_array_nearest() {
        // 180 sps snaps to the 200 sps table, 0.04 damping to 0.05.
        let a = get_coef_array(180.0, 0.04);
        let b = get_coef_array(200.0, 0.05);
        assert_eq!(a[0], b[0]);
        assert_eq!(a[90], b[90]);
    }

    #[test]
    fn test_tables_match_direct_design() {
        let table = get_coef_array(100.0, 0.05);
        let direct = sdof::coefficients(PERIODS[30], 0.05, 0.01).unwrap();
        assert_eq!(table[30], direct);
    }

    #[test]
    fn test_resonant_tone_peaks_at_its_period() {
        // A 1 Hz tone drives the 1.0 s oscillator hardest among its
        // grid neighbors. The comparison is local: the sudden start also
        // rings the long-period oscillators, whose free response can
        // exceed the resonant bump out at the far end of the grid.
        let dt = 0.005;
        let accel: Vec<f64> = (0..8000)
            .map(|i| (2.0 * PI * 1.0 * i as f64 * dt).sin())
            .collect();
        let spectrum = response_spectrum(&accel, dt, 0.05);
        let i = PERIODS.iter().position(|&p| p == 1.0).unwrap();
        assert!(spectrum.sd[i] > spectrum.sd[i - 1]);
        assert!(spectrum.sd[i] > spectrum.sd[i + 1]);
        // Steady-state resonant amplitude for a unit drive: 1/(2 zeta wn^2).
        let wn = 2.0 * PI;
        let analytic = 1.0 / (2.0 * 0.05 * wn * wn);
        assert!((spectrum.sd[i] - analytic).abs() / analytic < 0.05);
    }

    #[test]
    fn test_psa_is_wn_squared_sd() {
        let dt = 0.01;
        let accel: Vec<f64> = (0..2000)
            .map(|i| (2.0 * PI * 3.0 * i as f64 * dt).sin())
            .collect();
        let spectrum = response_spectrum(&accel, dt, 0.05);
        for i in 0..NUM_PERIODS {
            let wn = 2.0 * PI / spectrum.periods[i];
            assert!((spectrum.psa[i] - wn * wn * spectrum.sd[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_higher_damping_lowers_resonant_peak() {
        let dt = 0.005;
        let accel: Vec<f64> = (0..8000)
            .map(|i| (2.0 * PI * 1.0 * i as f64 * dt).sin())
            .collect();
        let light = response_spectrum(&accel, dt, 0.02);
        let heavy = response_spectrum(&accel, dt, 0.20);
        let i = PERIODS.iter().position(|&p| p == 1.0).unwrap();
        assert!(light.sd[i] > 2.0 * heavy.sd[i]);
    }

    #[test]
    fn test_ordinate_lookup() {
        let dt = 0.01;
        let accel = vec![1.0; 100];
        let spectrum = response_spectrum(&accel, dt, 0.05);
        let ord = spectrum.ordinate_at(1.0).unwrap();
        assert_eq!(ord.period, 1.0);
        assert!(ord.sd > 0.0);
        assert!(spectrum.ordinate_at(1.05).is_none());
    }

    #[test]
    fn test_empty_input() {
        let spectrum = response_spectrum(&[], 0.01, 0.05);
        assert!(spectrum.sd.iter().all(|&v| v == 0.0));
    }
}
