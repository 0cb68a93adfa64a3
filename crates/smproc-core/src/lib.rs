//! # Strong-Motion Processing Core
//!
//! This crate converts raw digitized strong-motion accelerograms (integer
//! counts) into physically meaningful acceleration, velocity, and
//! displacement time series plus derived engineering parameters, following
//! the four-stage convention: raw counts (V0) → uncorrected acceleration
//! (V1) → corrected acceleration/velocity/displacement (V2) → response
//! spectra (V3).
//!
//! ## Overview
//!
//! The numerical chain implemented here covers:
//!
//! - **Calibration & despiking**: counts-to-cm/s² conversion, histogram
//!   modal spike repair
//! - **Event-onset detection**: AIC characteristic function or a damped
//!   oscillator energy discriminant
//! - **Filter-corner selection**: station overrides, magnitude tables,
//!   noise-spectrum intersection
//! - **Band-pass filtering**: Butterworth, time- or frequency-domain
//! - **Integration & resampling**: FFT or trapezoidal paths
//! - **Baseline correction**: best-fit polynomial or segmented adaptive
//! - **Quality control**: velocity/displacement window-mean residuals
//! - **Response spectra**: precomputed SDOF recursion tables over the
//!   91-period grid
//!
//! ## Stage Flow
//!
//! ```text
//! counts → v1 (calibrate, despike, demean)
//!        → v2 (onset, resample, corners, filter, integrate, baseline, QC)
//!        → v3 (response spectra, named ordinates)   [GOOD status only]
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use smproc_core::config::Config;
//! use smproc_core::station::StationTable;
//! use smproc_core::trace::{ChannelHeader, ProcessLog};
//! use smproc_core::{v1, v2, v3};
//!
//! let header = ChannelHeader::new("NP.1.HNE.01", 0.01, 0.298023, 0.627);
//! let counts: Vec<i32> = vec![0; 4000];
//! let config = Config::new();
//! let stations = StationTable::new();
//!
//! let s1 = v1::v1_process(&counts, &header, &config, ProcessLog::new());
//! let s2 = v2::v2_process(&s1, &header, &config, &stations, s1.log.clone())?;
//! if s2.status.runs_v3() {
//!     let s3 = v3::v3_process(&s2, &config, s2.log.clone())?;
//!     println!("Sa(1.0 s) = {:.3e}", s3.ordinates[1].psa);
//! }
//! # Ok::<(), smproc_core::types::ProcError>(())
//! ```

pub mod array_ops;
pub mod bandpass;
pub mod baseline;
pub mod calculus;
pub mod config;
pub mod despike;
pub mod fft_calc;
pub mod filter_corners;
pub mod onset_aic;
pub mod onset_filter;
pub mod qc;
pub mod resample;
pub mod sdof;
pub mod spectra;
pub mod station;
pub mod trace;
pub mod trend;
pub mod types;
pub mod v1;
pub mod v2;
pub mod v3;

// Re-export main types
pub use bandpass::ButterworthBandPass;
pub use config::{BaselineMethod, Config, FilterDomain, IntegrationMethod, OnsetMethod};
pub use despike::{DespikeResult, Despiker};
pub use fft_calc::FftCalc;
pub use onset_filter::FilterPicker;
pub use qc::{QcChecker, QcOutcome};
pub use resample::Resampler;
pub use spectra::{ResponseSpectrum, SpectrumOrdinate};
pub use station::StationTable;
pub use trace::{ChannelHeader, ChannelTrace, ProcessLog};
pub use types::{DataUnits, ProcError, ProcResult, Sample, V2Status};
pub use v1::{v1_process, V1Result};
pub use v2::{v2_process, V2Result};
pub use v3::{v3_process, V3Result};
