//! # Stage 2 — Corrected Acceleration, Velocity, Displacement
//!
//! The heart of the chain. From an uncorrected acceleration trace:
//! event-onset search, optional resampling, filter-corner selection,
//! band-pass filtering, integration to velocity and displacement,
//! baseline correction, re-integration, and quality control. The stage
//! ends in one of the closed statuses: `Good` and `FailQc` both emit the
//! three product traces; `NoEvent`, `NoAbc`, and `FailInit` emit none.
//!
//! Every step appends an entry to the processing log in execution order.

use crate::baseline;
use crate::bandpass::ButterworthBandPass;
use crate::calculus;
use crate::config::{
    keys, BaselineMethod, Config, FilterDomain, IntegrationMethod, OnsetMethod,
};
use crate::fft_calc::FftCalc;
use crate::filter_corners::{self, MagnitudeKind};
use crate::onset_aic;
use crate::onset_filter::FilterPicker;
use crate::qc::QcChecker;
use crate::resample::{self, Resampler};
use crate::station::StationTable;
use crate::trace::{ChannelHeader, ChannelTrace, ProcessLog};
use crate::types::{DataUnits, ProcResult, V2Status};
use crate::v1::V1Result;
use crate::{array_ops, trend};

pub const DEFAULT_FILTER_ORDER: usize = 4;
pub const DEFAULT_TAPER_LENGTH_SEC: f64 = 2.0;
pub const DEFAULT_BEST_FIT_DISPERSION: f64 = 0.1;
/// Last-resort corners when neither table nor spectrum yields a pair.
pub const FALLBACK_LOW_CORNER: f64 = 0.5;
pub const FALLBACK_HIGH_CORNER: f64 = 20.0;

/// Stage-2 products. The traces are empty unless
/// [`V2Status::emits_products`] holds for `status`.
#[derive(Debug, Clone)]
pub struct V2Result {
    pub status: V2Status,
    pub accel: ChannelTrace,
    pub velocity: ChannelTrace,
    pub displacement: ChannelTrace,
    /// Event onset in samples of the working (possibly resampled) rate.
    pub onset_index: Option<usize>,
    /// Band-pass corners actually applied (Hz).
    pub corners: Option<(f64, f64)>,
    pub log: ProcessLog,
}

impl V2Result {
    fn empty(status: V2Status, header: &ChannelHeader, log: ProcessLog) -> Self {
        let blank = |units| ChannelTrace::new(&header.sncl, header.dt, units, Vec::new());
        Self {
            status,
            accel: blank(DataUnits::CmPerSecSq),
            velocity: blank(DataUnits::CmPerSec),
            displacement: blank(DataUnits::Cm),
            onset_index: None,
            corners: None,
            log,
        }
    }
}

/// Run stage 2 on a stage-1 product.
///
/// `Err` is reserved for invalid configuration; every data-driven
/// outcome is expressed through the returned status.
pub fn v2_process(
    v1: &V1Result,
    header: &ChannelHeader,
    config: &Config,
    stations: &StationTable,
    mut log: ProcessLog,
) -> ProcResult<V2Result> {
    if v1.status != V2Status::Good || v1.trace.is_empty() {
        log.add("stage 2 skipped: stage 1 did not produce a usable trace");
        return Ok(V2Result::empty(V2Status::FailInit, header, log));
    }

    let onset_method = config.onset_method()?;
    let filter_domain = config.filter_domain()?;
    let integration = config.integration_method()?;
    let baseline_method = config.baseline_method()?;

    let mut working = v1.trace.samples.clone();
    let mut dt = v1.trace.dt;
    let mut sps = 1.0 / dt;
    let original_sps = sps;

    // Event onset.
    let buffer_sec = config.get_f64_or(keys::ONSET_BUFFER_SEC, 0.0);
    // The raw pick decides NoEvent; buffering has its own sentinel
    // contract (0 for an over-long buffer) and must not mask a miss.
    let onset = match onset_method {
        OnsetMethod::Aic => {
            let raw = onset_aic::calculate_index(&working, onset_aic::MODE_TO_PEAK);
            if raw < 0 {
                log.add("no event onset found");
                return Ok(V2Result::empty(V2Status::NoEvent, header, log));
            }
            onset_aic::apply_buffer(raw, buffer_sec, dt)
        }
        OnsetMethod::Filter => {
            let picker = FilterPicker::new(dt);
            let raw = picker.find_event_onset(&working);
            if raw < 0 {
                log.add("no event onset found");
                return Ok(V2Result::empty(V2Status::NoEvent, header, log));
            }
            picker.apply_buffer(raw, buffer_sec)
        }
    };
    if onset < 0 {
        // apply_buffer returns -1 only for a non-positive time step.
        return Err(crate::types::ProcError::Processing(
            "invalid sample interval in onset buffering".to_string(),
        ));
    }
    let mut onset = onset as usize;
    log.add(format!(
        "event onset at {:.3} sec (sample {onset})",
        onset as f64 * dt
    ));
    let snr = array_ops::calc_signal_to_noise_ratio(&working, onset);
    if snr >= 0.0 {
        log.add(format!("signal-to-noise ratio {snr:.2}"));
    }

    // Resampling toward the configured working rate.
    let target_sps = config.get_f64_or(keys::TARGET_SPS, 0.0);
    let mut resample_factor = 1usize;
    if target_sps > 0.0 {
        let resampler = Resampler::new(target_sps);
        if resampler.needs_resampling(sps) {
            match resampler.resample_array(&working, sps) {
                Ok(up) => {
                    let (new_rate, factor) = resampler.calc_new_sampling_rate(sps);
                    resample_factor = factor as usize;
                    working = up;
                    onset *= resample_factor;
                    sps = new_rate;
                    dt = 1.0 / sps;
                    log.add(format!(
                        "resampled from {original_sps:.1} to {sps:.1} sps"
                    ));
                }
                Err(e) => {
                    tracing::warn!(sncl = %header.sncl, error = %e, "resampling skipped");
                    log.add(format!("resampling skipped: {e}"));
                }
            }
        }
    }

    // Filter corners: station override, magnitude table, FAS intersection.
    let (low, high) = select_corners(&working, onset, sps, original_sps, header, stations, &mut log);

    // Taper, then band-pass in the configured domain.
    let taper_sec = config.get_f64_or(keys::TAPER_LENGTH_SEC, DEFAULT_TAPER_LENGTH_SEC);
    let taper_samples = ((taper_sec * sps) as usize).min(working.len() / 2);
    if taper_samples > 0 && array_ops::apply_cosine_taper(&mut working, taper_samples, taper_samples)
    {
        log.add(format!("cosine taper of {taper_sec:.1} sec applied"));
    }

    let order = config.get_usize_or(keys::FILTER_ORDER, DEFAULT_FILTER_ORDER);
    let mut filter = ButterworthBandPass::new(low, high, order, sps)?;
    let mut fft = FftCalc::new();
    let accel = match filter_domain {
        FilterDomain::Time => filter.apply_time_domain(&working),
        FilterDomain::Frequency => filter.apply_frequency_domain(&working, &mut fft),
    };
    log.add(format!(
        "band-pass {low:.3}-{high:.2} Hz, order {order}, {} domain",
        match filter_domain {
            FilterDomain::Time => "time",
            FilterDomain::Frequency => "frequency",
        }
    ));

    // First integration to velocity.
    let diff_order = config.get_usize_or(keys::DIFFERENTIATION_ORDER, 5);
    let mut velocity = match integration {
        IntegrationMethod::Fft => fft.integrate(&accel, dt),
        IntegrationMethod::Time => calculus::integrate(&accel, dt, 0.0),
    };
    if velocity.is_empty() {
        return Err(crate::types::ProcError::Processing(
            "integration produced no samples".to_string(),
        ));
    }

    // Baseline correction on velocity.
    let qc = QcChecker::new(config);
    match baseline_method {
        BaselineMethod::BestFit => {
            let dispersion =
                config.get_f64_or(keys::BEST_FIT_DISPERSION, DEFAULT_BEST_FIT_DISPERSION);
            match baseline::best_fit_correction(&mut velocity, dt, dispersion) {
                Some(order) => log.add(format!("baseline: best-fit polynomial, order {order}")),
                None => {
                    trend::remove_linear_trend(&mut velocity, dt);
                    log.add("baseline: dispersion test failed, linear trend removed");
                }
            }
        }
        BaselineMethod::Adaptive => match baseline::adaptive_correction(&velocity, dt, onset, &qc) {
            Some(fit) => {
                log.add(format!(
                    "baseline: adaptive, orders {}/{}/{} with event window {}..{}",
                    fit.pre_order, fit.event_order, fit.post_order, fit.event_start, fit.event_end
                ));
                velocity = fit.corrected;
            }
            None => {
                log.add("baseline: adaptive search found no acceptable fit");
                return Ok(V2Result::empty(V2Status::NoAbc, header, log));
            }
        },
    }

    // Re-derive acceleration and integrate on to displacement.
    let accel = match integration {
        IntegrationMethod::Fft => fft.differentiate(&velocity, dt),
        IntegrationMethod::Time => calculus::differentiate(&velocity, dt, diff_order),
    };
    if accel.is_empty() {
        return Err(crate::types::ProcError::Processing(format!(
            "differentiation produced no samples (order {diff_order})"
        )));
    }
    let displacement = match integration {
        IntegrationMethod::Fft => fft.integrate(&velocity, dt),
        IntegrationMethod::Time => calculus::integrate(&velocity, dt, 0.0),
    };

    // Quality control.
    let vel_qc = qc.qc_velocity(&velocity, sps);
    let disp_qc = qc.qc_displacement(&displacement, sps);
    log.add(format!(
        "QC velocity: initial {:.4e}, residual {:.4e} -> {}",
        vel_qc.initial,
        vel_qc.residual,
        if vel_qc.passed { "pass" } else { "fail" }
    ));
    log.add(format!(
        "QC displacement: residual {:.4e} -> {}",
        disp_qc.residual,
        if disp_qc.passed { "pass" } else { "fail" }
    ));
    let status = if vel_qc.passed && disp_qc.passed {
        V2Status::Good
    } else {
        V2Status::FailQc
    };

    // Optionally decimate the products back to the native rate.
    let mut out_dt = dt;
    let (accel, velocity, displacement) = if resample_factor > 1
        && config.get_bool_or(keys::DECIMATE_AFTER_RESAMPLE, false)
    {
        let a = resample::decimate_array(&accel, resample_factor)?;
        let v = resample::decimate_array(&velocity, resample_factor)?;
        let d = resample::decimate_array(&displacement, resample_factor)?;
        onset /= resample_factor;
        out_dt = 1.0 / original_sps;
        log.add(format!("products decimated back to {original_sps:.1} sps"));
        (a, v, d)
    } else {
        (accel, velocity, displacement)
    };

    Ok(V2Result {
        status,
        accel: ChannelTrace::new(&header.sncl, out_dt, DataUnits::CmPerSecSq, accel),
        velocity: ChannelTrace::new(&header.sncl, out_dt, DataUnits::CmPerSec, velocity),
        displacement: ChannelTrace::new(&header.sncl, out_dt, DataUnits::Cm, displacement),
        onset_index: Some(onset),
        corners: Some((low, high)),
        log,
    })
}

/// Corner-selection fallback chain. Always yields a usable pair; the log
/// records which source won.
fn select_corners(
    working: &[f64],
    onset: usize,
    sps: f64,
    original_sps: f64,
    header: &ChannelHeader,
    stations: &StationTable,
    log: &mut ProcessLog,
) -> (f64, f64) {
    if let Some((low, high)) = stations.lookup(&header.sncl) {
        log.add(format!(
            "filter corners {low:.3}-{high:.2} Hz from station table"
        ));
        return clamp_corners(low, high, sps);
    }

    let (kind, magnitude) = filter_corners::select_magnitude(
        header.moment_mag,
        header.local_mag,
        header.surface_mag,
        header.other_mag,
        header.no_value,
    );
    let thresholds = filter_corners::select_mag_thresholds(kind, magnitude, sps);
    if !matches!(
        thresholds.kind,
        MagnitudeKind::Invalid | MagnitudeKind::LowSps
    ) {
        log.add(format!(
            "filter corners {:.3}-{:.2} Hz from magnitude {magnitude:.1} table",
            thresholds.low, thresholds.high
        ));
        return clamp_corners(thresholds.low, thresholds.high, sps);
    }

    let picks = filter_corners::find_freq_thresholds(working, onset, sps, original_sps);
    if picks[0][0] > 0.0 && picks[1][0] > picks[0][0] {
        log.add(format!(
            "filter corners {:.3}-{:.2} Hz from noise-spectrum intersection",
            picks[0][0], picks[1][0]
        ));
        return clamp_corners(picks[0][0], picks[1][0], sps);
    }

    log.add(format!(
        "filter corners {FALLBACK_LOW_CORNER:.3}-{FALLBACK_HIGH_CORNER:.2} Hz by fallback"
    ));
    clamp_corners(FALLBACK_LOW_CORNER, FALLBACK_HIGH_CORNER, sps)
}

/// Keep a corner pair strictly inside (0, nyquist).
fn clamp_corners(low: f64, high: f64, sps: f64) -> (f64, f64) {
    let nyquist = 0.5 * sps;
    let high = high.min(0.9 * nyquist);
    let low = low.max(0.01).min(0.5 * high);
    (low, high)
}
