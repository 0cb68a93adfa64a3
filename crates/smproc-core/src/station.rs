//! # Station Filter-Corner Overrides
//!
//! Some stations have known instrument or site response that makes the
//! default magnitude-based corner tables inappropriate. This module holds a
//! per-station override table keyed by SNCL (station-network-channel-location)
//! identifier, loaded once before any channel is processed and consulted
//! first during stage-2 corner selection.
//!
//! Each line of the source text is `SNCL low high` (whitespace separated).
//! Malformed lines are skipped with a warning, not fatal; corners must be
//! positive with `low < high` or the line is rejected.

use std::collections::HashMap;
use tracing::warn;

/// SNCL-keyed band-pass corner override table.
#[derive(Debug, Clone, Default)]
pub struct StationTable {
    corners: HashMap<String, (f64, f64)>,
}

impl StationTable {
    /// Empty table; every lookup misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a table from decoded text lines, skipping malformed entries.
    pub fn from_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut corners = HashMap::new();
        for line in lines {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let (sncl, low, high) = match (parts.next(), parts.next(), parts.next()) {
                (Some(s), Some(l), Some(h)) => (s, l, h),
                _ => {
                    warn!(line, "skipping short station corner line");
                    continue;
                }
            };
            let (low, high) = match (low.parse::<f64>(), high.parse::<f64>()) {
                (Ok(l), Ok(h)) => (l, h),
                _ => {
                    warn!(line, "skipping unparsable station corner line");
                    continue;
                }
            };
            if !(low > 0.0 && high > low) {
                warn!(sncl, low, high, "skipping invalid station corners");
                continue;
            }
            corners.insert(sncl.to_owned(), (low, high));
        }
        Self { corners }
    }

    /// Corner override for a station, if one was configured.
    pub fn lookup(&self, sncl: &str) -> Option<(f64, f64)> {
        self.corners.get(sncl).copied()
    }

    /// Number of loaded overrides.
    pub fn len(&self) -> usize {
        self.corners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }
}
