//! # Processing Configuration
//!
//! The configuration layer (XML loading, search paths) lives outside this
//! crate; what arrives here is a flat `key -> string` map. `Config` wraps
//! that map and exposes typed getters with built-in defaults, plus the
//! closed method-selection enums used by the stage orchestrators.
//!
//! Configuration is populated once before any channel is processed and
//! never mutated mid-run; `Config` is therefore `Send + Sync` and safe for
//! concurrent readers.
//!
//! ## Keys
//!
//! | Key | Meaning | Default |
//! |---|---|---|
//! | `processing.despike` | despike V1 input | `false` |
//! | `processing.despike_num_std` | despike deviation multiplier | `3.0` |
//! | `processing.onset_method` | `aic` or `filter` | `aic` |
//! | `processing.onset_buffer_sec` | back-off before the pick | `0.0` |
//! | `processing.target_sps` | resampling target rate (0 disables) | `0` |
//! | `processing.decimate_after_resample` | restore original rate on output | `false` |
//! | `processing.filter_domain` | `time` or `frequency` | `frequency` |
//! | `processing.filter_order` | band-pass order (even) | `4` |
//! | `processing.taper_length_sec` | half-cosine taper length | `2.0` |
//! | `processing.integration_method` | `fft` or `time` | `fft` |
//! | `processing.differentiation_order` | stencil for time-domain path | `5` |
//! | `processing.baseline_method` | `bestfit` or `adaptive` | `bestfit` |
//! | `processing.best_fit_dispersion` | residual-stddev acceptance bound | `0.1` |
//! | `qc.initial_velocity_cm_s` | initial-velocity bound | `0.1` |
//! | `qc.residual_velocity_cm_s` | residual-velocity bound | `0.1` |
//! | `qc.residual_displacement_cm` | residual-displacement bound | `0.1` |
//! | `qc.window_fraction` | QC window as fraction of record | `0.1` |
//! | `qc.min_window_samples` | QC window floor | `100` |
//! | `spectra.damping_ratios` | comma-separated ratios | `0.00,0.02,0.05,0.10,0.20` |
//! | `spectra.full_table` | emit all 91 periods | `true` |

use crate::types::{ProcError, ProcResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Configuration key constants.
pub mod keys {
    pub const DESPIKE_INPUT: &str = "processing.despike";
    pub const DESPIKE_NUM_STD: &str = "processing.despike_num_std";
    pub const ONSET_METHOD: &str = "processing.onset_method";
    pub const ONSET_BUFFER_SEC: &str = "processing.onset_buffer_sec";
    pub const TARGET_SPS: &str = "processing.target_sps";
    pub const DECIMATE_AFTER_RESAMPLE: &str = "processing.decimate_after_resample";
    pub const FILTER_DOMAIN: &str = "processing.filter_domain";
    pub const FILTER_ORDER: &str = "processing.filter_order";
    pub const TAPER_LENGTH_SEC: &str = "processing.taper_length_sec";
    pub const INTEGRATION_METHOD: &str = "processing.integration_method";
    pub const DIFFERENTIATION_ORDER: &str = "processing.differentiation_order";
    pub const BASELINE_METHOD: &str = "processing.baseline_method";
    pub const BEST_FIT_DISPERSION: &str = "processing.best_fit_dispersion";
    pub const QC_INITIAL_VELOCITY: &str = "qc.initial_velocity_cm_s";
    pub const QC_RESIDUAL_VELOCITY: &str = "qc.residual_velocity_cm_s";
    pub const QC_RESIDUAL_DISPLACEMENT: &str = "qc.residual_displacement_cm";
    pub const QC_WINDOW_FRACTION: &str = "qc.window_fraction";
    pub const QC_MIN_WINDOW_SAMPLES: &str = "qc.min_window_samples";
    pub const SPECTRA_DAMPING_RATIOS: &str = "spectra.damping_ratios";
    pub const SPECTRA_FULL_TABLE: &str = "spectra.full_table";
}

/// Event-onset detection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnsetMethod {
    /// Akaike-Information-Criterion characteristic function.
    Aic,
    /// Precomputed recursive-filter (damped oscillator) discriminant.
    Filter,
}

/// Band-pass filter application domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterDomain {
    Time,
    Frequency,
}

/// Integration/differentiation path for stage 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrationMethod {
    Fft,
    Time,
}

/// Baseline-correction strategy for stage 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaselineMethod {
    /// One polynomial fit over the whole application window.
    BestFit,
    /// Segmented (pre-event / event / post-event) adaptive search.
    Adaptive,
}

/// Flat key -> string configuration context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    entries: HashMap<String, String>,
}

impl Config {
    /// Create an empty configuration; every getter yields its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-decoded key -> value map.
    pub fn from_map(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Set a single entry (test and driver convenience).
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_owned(), value.into());
    }

    /// Raw string value, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Float value; missing key yields the default, unparsable yields `None`.
    pub fn get_f64(&self, key: &str, default: f64) -> Option<f64> {
        match self.get(key) {
            None => Some(default),
            Some(s) => s.trim().parse().ok(),
        }
    }

    /// Float value with silent fallback to the default for missing keys;
    /// unparsable values warn and fall back as well.
    pub fn get_f64_or(&self, key: &str, default: f64) -> f64 {
        match self.get_f64(key, default) {
            Some(v) => v,
            None => {
                warn!(key, "unparsable numeric configuration value, using default");
                default
            }
        }
    }

    /// Integer value with fallback to the default.
    pub fn get_usize_or(&self, key: &str, default: usize) -> usize {
        match self.get(key) {
            None => default,
            Some(s) => s.trim().parse().unwrap_or_else(|_| {
                warn!(key, "unparsable integer configuration value, using default");
                default
            }),
        }
    }

    /// Boolean value: `true`/`yes`/`on`/`1` are true, anything else false.
    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            None => default,
            Some(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "on" | "1"),
        }
    }

    /// Onset-detection method selection. Unknown values are a processing
    /// error (invalid configuration aborts the current channel).
    pub fn onset_method(&self) -> ProcResult<OnsetMethod> {
        match self.get(keys::ONSET_METHOD).map(str::trim) {
            None => Ok(OnsetMethod::Aic),
            Some(s) if s.eq_ignore_ascii_case("aic") => Ok(OnsetMethod::Aic),
            Some(s) if s.eq_ignore_ascii_case("filter") || s.eq_ignore_ascii_case("pwd") => {
                Ok(OnsetMethod::Filter)
            }
            Some(s) => Err(ProcError::Processing(format!(
                "unknown onset method '{s}'"
            ))),
        }
    }

    /// Band-pass application domain.
    pub fn filter_domain(&self) -> ProcResult<FilterDomain> {
        match self.get(keys::FILTER_DOMAIN).map(str::trim) {
            None => Ok(FilterDomain::Frequency),
            Some(s) if s.eq_ignore_ascii_case("time") => Ok(FilterDomain::Time),
            Some(s) if s.eq_ignore_ascii_case("frequency") => Ok(FilterDomain::Frequency),
            Some(s) => Err(ProcError::Processing(format!(
                "unknown filter domain '{s}'"
            ))),
        }
    }

    /// Stage-2 integration path.
    pub fn integration_method(&self) -> ProcResult<IntegrationMethod> {
        match self.get(keys::INTEGRATION_METHOD).map(str::trim) {
            None => Ok(IntegrationMethod::Fft),
            Some(s) if s.eq_ignore_ascii_case("fft") => Ok(IntegrationMethod::Fft),
            Some(s) if s.eq_ignore_ascii_case("time") => Ok(IntegrationMethod::Time),
            Some(s) => Err(ProcError::Processing(format!(
                "unknown integration method '{s}'"
            ))),
        }
    }

    /// Baseline-correction strategy.
    pub fn baseline_method(&self) -> ProcResult<BaselineMethod> {
        match self.get(keys::BASELINE_METHOD).map(str::trim) {
            None => Ok(BaselineMethod::BestFit),
            Some(s) if s.eq_ignore_ascii_case("bestfit") || s.eq_ignore_ascii_case("best_fit") => {
                Ok(BaselineMethod::BestFit)
            }
            Some(s) if s.eq_ignore_ascii_case("adaptive") || s.eq_ignore_ascii_case("abc") => {
                Ok(BaselineMethod::Adaptive)
            }
            Some(s) => Err(ProcError::Processing(format!(
                "unknown baseline method '{s}'"
            ))),
        }
    }

    /// Damping ratios for stage 3, parsed from a comma-separated list.
    /// Unparsable entries are skipped with a warning.
    pub fn damping_ratios(&self) -> Vec<f64> {
        let raw = self
            .get(keys::SPECTRA_DAMPING_RATIOS)
            .unwrap_or("0.00,0.02,0.05,0.10,0.20");
        let mut out = Vec::new();
        for tok in raw.split(',') {
            match tok.trim().parse::<f64>() {
                Ok(v) if v >= 0.0 && v < 1.0 => out.push(v),
                _ => warn!(token = tok, "skipping unparsable damping ratio"),
            }
        }
        if out.is_empty() {
            out.push(0.05);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_on_empty_config() {
        let cfg = Config::new();
        assert_eq!(cfg.get_f64_or(keys::TARGET_SPS, 200.0), 200.0);
        assert!(!cfg.get_bool_or(keys::DESPIKE_INPUT, false));
        assert_eq!(cfg.onset_method().unwrap(), OnsetMethod::Aic);
        assert_eq!(cfg.filter_domain().unwrap(), FilterDomain::Frequency);
        assert_eq!(cfg.integration_method().unwrap(), IntegrationMethod::Fft);
        assert_eq!(cfg.baseline_method().unwrap(), BaselineMethod::BestFit);
    }

    #[test]
    fn test_typed_getters() {
        let mut cfg = Config::new();
        cfg.set(keys::TARGET_SPS, "100");
        cfg.set(keys::DESPIKE_INPUT, "Yes");
        cfg.set(keys::FILTER_ORDER, "6");
        assert_eq!(cfg.get_f64_or(keys::TARGET_SPS, 200.0), 100.0);
        assert!(cfg.get_bool_or(keys::DESPIKE_INPUT, false));
        assert_eq!(cfg.get_usize_or(keys::FILTER_ORDER, 4), 6);
    }

    #[test]
    fn test_unparsable_number_is_none() {
        let mut cfg = Config::new();
        cfg.set(keys::QC_INITIAL_VELOCITY, "abc");
        assert!(cfg.get_f64(keys::QC_INITIAL_VELOCITY, 0.1).is_none());
        // Missing key is the default, not a failure.
        assert_eq!(cfg.get_f64(keys::QC_RESIDUAL_VELOCITY, 0.1), Some(0.1));
    }

    #[test]
    fn test_unknown_method_is_processing_error() {
        let mut cfg = Config::new();
        cfg.set(keys::ONSET_METHOD, "magic");
        assert!(cfg.onset_method().is_err());
    }

    #[test]
    fn test_onset_method_aliases() {
        let mut cfg = Config::new();
        cfg.set(keys::ONSET_METHOD, "PwD");
        assert_eq!(cfg.onset_method().unwrap(), OnsetMethod::Filter);
    }

    #[test]
    fn test_damping_ratio_parsing() {
        let mut cfg = Config::new();
        cfg.set(keys::SPECTRA_DAMPING_RATIOS, "0.05, x, 0.10");
        assert_eq!(cfg.damping_ratios(), vec![0.05, 0.10]);

        cfg.set(keys::SPECTRA_DAMPING_RATIOS, "junk");
        assert_eq!(cfg.damping_ratios(), vec![0.05]);
    }
}
