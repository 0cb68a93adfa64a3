//! Core types for strong-motion record processing
//!
//! This module defines the fundamental types shared across the processing
//! chain: sample aliases, physical data units with their numeric codes,
//! the stage-2 status enumeration, and the crate-wide error type.
//!
//! ## Processing stages
//!
//! A strong-motion record moves through four conventional stages:
//!
//! ```text
//! V0: raw digitizer counts          (as recorded)
//! V1: uncorrected acceleration      (counts -> cm/s², mean removed)
//! V2: corrected accel/vel/disp      (filtered, integrated, baseline-corrected)
//! V3: response spectra              (only when V2 status permits)
//! ```
//!
//! The `V2Status` value produced by stage 2 gates stage 3 and output
//! routing; it is a closed set and is matched exhaustively at every
//! decision point.

use serde::{Deserialize, Serialize};

/// A single real-valued sample (counts or physical units).
pub type Sample = f64;

/// Result type for processing operations.
pub type ProcResult<T> = Result<T, ProcError>;

/// Conversion from g to cm/s² (gal).
pub const GRAVITY_CM_S2: f64 = 980.665;

/// Extreme-magnitude sentinel returned by numeric primitives for
/// "not computable" (e.g. standard deviation of fewer than 2 samples).
pub const SENTINEL_EXTREME: f64 = f64::MAX;

/// Physical units of a channel trace, with the numeric unit codes used
/// by the fixed-field record format layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataUnits {
    /// Raw digitizer counts (code 50)
    Counts,
    /// Acceleration in g (code 2)
    G,
    /// Acceleration in cm/s² (code 4)
    CmPerSecSq,
    /// Velocity in cm/s (code 5)
    CmPerSec,
    /// Displacement in cm (code 6)
    Cm,
}

impl DataUnits {
    /// Numeric unit code written into the record header.
    pub fn code(self) -> u32 {
        match self {
            DataUnits::Counts => 50,
            DataUnits::G => 2,
            DataUnits::CmPerSecSq => 4,
            DataUnits::CmPerSec => 5,
            DataUnits::Cm => 6,
        }
    }

    /// Human-readable unit name for processing-log entries.
    pub fn name(self) -> &'static str {
        match self {
            DataUnits::Counts => "counts",
            DataUnits::G => "g",
            DataUnits::CmPerSecSq => "cm/sec2",
            DataUnits::CmPerSec => "cm/sec",
            DataUnits::Cm => "cm",
        }
    }
}

/// Outcome of stage-2 processing.
///
/// Downstream stage-3 processing and product emission are gated on this
/// value: `Good` and `FailQc` still emit acceleration/velocity/displacement
/// products (only `Good` proceeds to spectra); the remaining states route
/// the channel to the trouble location with no V2 products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum V2Status {
    /// Processing succeeded and quality control passed.
    Good,
    /// Products were computed but quality control failed.
    FailQc,
    /// No event onset could be located in the trace.
    NoEvent,
    /// Adaptive baseline correction found no acceptable fit.
    NoAbc,
    /// Calibration constants were invalid; stage 1 could not run.
    FailInit,
}

impl V2Status {
    /// Whether V2 products (acceleration, velocity, displacement) are emitted.
    pub fn emits_products(self) -> bool {
        matches!(self, V2Status::Good | V2Status::FailQc)
    }

    /// Whether stage 3 (response spectra) runs.
    pub fn runs_v3(self) -> bool {
        matches!(self, V2Status::Good)
    }
}

impl std::fmt::Display for V2Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            V2Status::Good => "GOOD",
            V2Status::FailQc => "FAILQC",
            V2Status::NoEvent => "NOEVENT",
            V2Status::NoAbc => "NOABC",
            V2Status::FailInit => "FAILINIT",
        };
        f.write_str(s)
    }
}

/// Errors raised by the processing core.
///
/// Only two categories are ever raised: a format error propagated from the
/// (external) record format layer, and a processing error for invalid
/// calibration or configuration. Both abort the current channel only; the
/// batch driver continues with the next unit of work. Low-level numeric
/// functions never raise; they return sentinel values which the stage
/// orchestrators interpret.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProcError {
    #[error("format error: {0}")]
    Format(String),

    #[error("processing error: {0}")]
    Processing(String),
}
