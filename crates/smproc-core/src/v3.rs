//! # Stage 3 — Response Spectra
//!
//! The final stage: elastic response spectra of the stage-2 corrected
//! acceleration across the 91-period grid, one spectrum per configured
//! damping ratio, plus the named ordinates at 0.3, 1.0, and 3.0 s.
//! Runs only on a `Good` stage-2 status.

use crate::config::{keys, Config};
use crate::spectra::{self, ResponseSpectrum, SpectrumOrdinate};
use crate::trace::ProcessLog;
use crate::types::{ProcError, ProcResult, V2Status};
use crate::v2::V2Result;

/// Stage-3 product.
#[derive(Debug, Clone)]
pub struct V3Result {
    /// One spectrum per configured damping ratio, in configured order.
    pub spectra: Vec<ResponseSpectrum>,
    /// Ordinates at 0.3 / 1.0 / 3.0 s from the 5%-damping spectrum (or
    /// the first configured spectrum when 5% is absent).
    pub ordinates: Vec<SpectrumOrdinate>,
    /// Whether the full period table is emitted or only the 5%-damping
    /// column.
    pub full_table: bool,
    pub log: ProcessLog,
}

/// Run stage 3. A non-`Good` stage-2 status is a processing error here:
/// the caller is expected to gate on [`V2Status::runs_v3`].
pub fn v3_process(v2: &V2Result, config: &Config, mut log: ProcessLog) -> ProcResult<V3Result> {
    if !v2.status.runs_v3() {
        return Err(ProcError::Processing(format!(
            "stage 3 requires GOOD stage-2 status, got {}",
            v2.status
        )));
    }
    if v2.accel.is_empty() || v2.accel.dt <= 0.0 {
        return Err(ProcError::Processing(
            "stage 3: empty corrected acceleration".to_string(),
        ));
    }

    let full_table = config.get_bool_or(keys::SPECTRA_FULL_TABLE, true);
    let dampings = if full_table {
        config.damping_ratios()
    } else {
        vec![0.05]
    };

    let computed: Vec<ResponseSpectrum> = dampings
        .iter()
        .map(|&d| spectra::response_spectrum(&v2.accel.samples, v2.accel.dt, d))
        .collect();
    log.add(format!(
        "response spectra computed for {} damping ratio(s), {} periods",
        computed.len(),
        spectra::NUM_PERIODS
    ));

    let reference = computed
        .iter()
        .find(|s| (s.damping - 0.05).abs() < 1e-9)
        .or_else(|| computed.first())
        .ok_or_else(|| ProcError::Processing("stage 3: no spectrum computed".to_string()))?;
    let ordinates: Vec<SpectrumOrdinate> = spectra::ORDINATE_PERIODS
        .iter()
        .filter_map(|&p| reference.ordinate_at(p))
        .collect();
    for ord in &ordinates {
        log.add(format!(
            "Sa({:.1} s) = {:.4e} cm/sq.sec",
            ord.period, ord.psa
        ));
    }

    Ok(V3Result {
        spectra: computed,
        ordinates,
        full_table,
        log,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::ChannelTrace;
    use crate::types::DataUnits;
    use std::f64::consts::PI;

    fn good_v2(n: usize, dt: f64) -> V2Result {
        let accel: Vec<f64> = (0..n)
            .map(|i| 50.0 * (2.0 * PI * 1.0 * i as f64 * dt).sin())
            .collect();
        V2Result {
            status: V2Status::Good,
            accel: ChannelTrace::new("NP.1.HNE.01", dt, DataUnits::CmPerSecSq, accel),
            velocity: ChannelTrace::new("NP.1.HNE.01", dt, DataUnits::CmPerSec, Vec::new()),
            displacement: ChannelTrace::new("NP.1.HNE.01", dt, DataUnits::Cm, Vec::new()),
            onset_index: Some(0),
            corners: Some((0.5, 20.0)),
            log: ProcessLog::new(),
        }
    }

    #[test]
    fn test_full_table_has_all_configured_dampings() {
        let result = v3_process(&good_v2(4000, 0.005), &Config::new(), ProcessLog::new()).unwrap();
        assert!(result.full_table);
        assert_eq!(result.spectra.len(), 5);
        for s in &result.spectra {
            assert_eq!(s.sd.len(), spectra::NUM_PERIODS);
        }
        // Named ordinates come from the 5%-damping spectrum.
        assert_eq!(result.ordinates.len(), 3);
        assert!((result.ordinates[0].period - 0.3).abs() < 1e-12);
        assert!((result.ordinates[2].period - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_table_is_five_percent_only() {
        let mut config = Config::new();
        config.set(keys::SPECTRA_FULL_TABLE, "false");
        let result = v3_process(&good_v2(4000, 0.005), &config, ProcessLog::new()).unwrap();
        assert!(!result.full_table);
        assert_eq!(result.spectra.len(), 1);
        assert!((result.spectra[0].damping - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_resonance_shows_up_in_ordinates() {
        // A 1 Hz drive makes Sa(1.0 s) the largest named ordinate.
        let result = v3_process(&good_v2(8000, 0.005), &Config::new(), ProcessLog::new()).unwrap();
        let sa: Vec<f64> = result.ordinates.iter().map(|o| o.psa).collect();
        assert!(sa[1] > sa[0]);
        assert!(sa[1] > sa[2]);
    }

    #[test]
    fn test_non_good_status_is_rejected() {
        let mut v2 = good_v2(1000, 0.005);
        v2.status = V2Status::FailQc;
        assert!(v3_process(&v2, &Config::new(), ProcessLog::new()).is_err());
    }

    #[test]
    fn test_empty_acceleration_is_rejected() {
        let mut v2 = good_v2(1000, 0.005);
        v2.accel.samples.clear();
        assert!(v3_process(&v2, &Config::new(), ProcessLog::new()).is_err());
    }
}
