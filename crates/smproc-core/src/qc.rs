//! # Quality Control
//!
//! Window-mean checks on corrected velocity and displacement. A record
//! that starts or ends with a drifting velocity, or ends with a
//! displacement offset, failed its baseline correction no matter how
//! clean the acceleration looks.
//!
//! Thresholds come from the configuration; a present-but-unparsable
//! threshold disables QC for the run (logged) rather than failing every
//! channel.

use crate::array_ops;
use crate::config::{keys, Config};

pub const DEFAULT_INITIAL_VELOCITY_CM_S: f64 = 0.1;
pub const DEFAULT_RESIDUAL_VELOCITY_CM_S: f64 = 0.1;
pub const DEFAULT_RESIDUAL_DISPLACEMENT_CM: f64 = 0.1;
pub const DEFAULT_WINDOW_FRACTION: f64 = 0.1;
pub const DEFAULT_MIN_WINDOW_SAMPLES: usize = 100;

/// Outcome of a single QC check: pass/fail plus the measured values that
/// were compared against the bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QcOutcome {
    pub passed: bool,
    /// |mean| over the leading window (velocity check only; 0 otherwise).
    pub initial: f64,
    /// |mean| over the trailing window.
    pub residual: f64,
}

/// Velocity / displacement residual checks with configured thresholds.
#[derive(Debug, Clone)]
pub struct QcChecker {
    initial_velocity: f64,
    residual_velocity: f64,
    residual_displacement: f64,
    window_fraction: f64,
    min_window: usize,
    valid: bool,
}

impl QcChecker {
    pub fn new(config: &Config) -> Self {
        let iv = config.get_f64(keys::QC_INITIAL_VELOCITY, DEFAULT_INITIAL_VELOCITY_CM_S);
        let rv = config.get_f64(keys::QC_RESIDUAL_VELOCITY, DEFAULT_RESIDUAL_VELOCITY_CM_S);
        let rd = config.get_f64(
            keys::QC_RESIDUAL_DISPLACEMENT,
            DEFAULT_RESIDUAL_DISPLACEMENT_CM,
        );
        let valid = iv.is_some() && rv.is_some() && rd.is_some();
        if !valid {
            tracing::warn!("unparsable QC threshold, QC checks disabled for this run");
        }
        Self {
            initial_velocity: iv.unwrap_or(DEFAULT_INITIAL_VELOCITY_CM_S),
            residual_velocity: rv.unwrap_or(DEFAULT_RESIDUAL_VELOCITY_CM_S),
            residual_displacement: rd.unwrap_or(DEFAULT_RESIDUAL_DISPLACEMENT_CM),
            window_fraction: config.get_f64_or(keys::QC_WINDOW_FRACTION, DEFAULT_WINDOW_FRACTION),
            min_window: config.get_usize_or(keys::QC_MIN_WINDOW_SAMPLES, DEFAULT_MIN_WINDOW_SAMPLES),
            valid,
        }
    }

    /// False when any configured threshold was present but unparsable.
    pub fn validate_qc_values(&self) -> bool {
        self.valid
    }

    /// Window length in samples: at least `min_window`, otherwise
    /// `fraction` of the record duration, never longer than the record.
    pub fn find_window(&self, sps: f64, len: usize) -> usize {
        let duration = len as f64 / sps.max(1e-12);
        let from_fraction = (self.window_fraction * duration * sps) as usize;
        from_fraction.max(self.min_window).min(len)
    }

    /// Leading- and trailing-window mean check on corrected velocity.
    pub fn qc_velocity(&self, velocity: &[f64], sps: f64) -> QcOutcome {
        if velocity.is_empty() {
            return QcOutcome {
                passed: false,
                initial: 0.0,
                residual: 0.0,
            };
        }
        let w = self.find_window(sps, velocity.len());
        let initial = array_ops::mean(&velocity[..w]).abs();
        let residual = array_ops::mean(&velocity[velocity.len() - w..]).abs();
        let passed = !self.valid
            || (initial <= self.initial_velocity && residual <= self.residual_velocity);
        QcOutcome {
            passed,
            initial,
            residual,
        }
    }

    /// Trailing-window mean check on corrected displacement.
    pub fn qc_displacement(&self, displacement: &[f64], sps: f64) -> QcOutcome {
        if displacement.is_empty() {
            return QcOutcome {
                passed: false,
                initial: 0.0,
                residual: 0.0,
            };
        }
        let w = self.find_window(sps, displacement.len());
        let residual = array_ops::mean(&displacement[displacement.len() - w..]).abs();
        let passed = !self.valid || residual <= self.residual_displacement;
        QcOutcome {
            passed,
            initial: 0.0,
            residual,
        }
    }
}
