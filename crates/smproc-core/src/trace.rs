//! # Channel Traces and the Processing Log
//!
//! A `ChannelTrace` is an ordered sequence of real-valued samples plus the
//! scalar metadata a stage needs to interpret them. Traces are immutable
//! once produced: each stage builds a new trace rather than mutating its
//! input, so the V1 product survives unchanged next to the V2 products.
//!
//! The `ProcessLog` is the append-only list of human-readable step records
//! (onset time, resampling, despiking, baseline-correction parameters) that
//! the serialization layer embeds as comments. It is threaded through the
//! stage calls by value and returned inside each stage result; entries are
//! never reordered or truncated and a running count is maintained.

use crate::array_ops;
use crate::types::DataUnits;
use serde::{Deserialize, Serialize};

/// Header scalars consumed from the (external) record format layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelHeader {
    /// Station-network-channel-location identifier.
    pub sncl: String,
    /// Sample interval in seconds.
    pub dt: f64,
    /// Record start time, opaque to the core.
    pub start_time: String,
    /// Least-significant-bit value in microvolts per count.
    pub lsb_uv: f64,
    /// Instrument sensitivity in volts per g.
    pub sensitivity_v_per_g: f64,
    /// Nominal sample rate in samples per second.
    pub nominal_sps: f64,
    /// Moment magnitude, or the sentinel when absent.
    pub moment_mag: f64,
    /// Local magnitude, or the sentinel.
    pub local_mag: f64,
    /// Surface-wave magnitude, or the sentinel.
    pub surface_mag: f64,
    /// Any other magnitude estimate, or the sentinel.
    pub other_mag: f64,
    /// The no-value sentinel the format layer uses for missing reals.
    pub no_value: f64,
}

impl ChannelHeader {
    /// Minimal header for a channel with no magnitude information.
    pub fn new(sncl: impl Into<String>, dt: f64, lsb_uv: f64, sensitivity_v_per_g: f64) -> Self {
        let no_value = -999.0;
        Self {
            sncl: sncl.into(),
            dt,
            start_time: String::new(),
            lsb_uv,
            sensitivity_v_per_g,
            nominal_sps: if dt > 0.0 { 1.0 / dt } else { 0.0 },
            moment_mag: no_value,
            local_mag: no_value,
            surface_mag: no_value,
            other_mag: no_value,
            no_value,
        }
    }
}

/// One physical-unit time series produced by a processing stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelTrace {
    /// Station-network-channel-location identifier.
    pub sncl: String,
    /// Sample interval in seconds.
    pub dt: f64,
    /// Physical units of the samples.
    pub units: DataUnits,
    /// The samples themselves.
    pub samples: Vec<f64>,
}

impl ChannelTrace {
    pub fn new(sncl: impl Into<String>, dt: f64, units: DataUnits, samples: Vec<f64>) -> Self {
        Self {
            sncl: sncl.into(),
            dt,
            units,
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Record duration in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 * self.dt
    }

    /// Peak sample by absolute value: `(index, value, time)`.
    pub fn peak(&self) -> Option<(usize, f64, f64)> {
        array_ops::find_peak(&self.samples).map(|(i, v)| (i, v, i as f64 * self.dt))
    }

    /// Arithmetic mean of the samples.
    pub fn mean(&self) -> f64 {
        array_ops::mean(&self.samples)
    }
}

/// Append-only ordered list of human-readable processing step records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessLog {
    entries: Vec<String>,
}

impl ProcessLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one step record. Entries are never reordered or removed.
    pub fn add(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    /// Running count of step records.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// The records, in append order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}
