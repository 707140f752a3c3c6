use crate::config::EngineConfig;
use crate::models::signal::is_weekend;
use crate::models::{CandidateSignal, DayScope, ExperienceRecord};

/// Hard context filters applied before similarity scoring. Pure function of
/// its inputs; no side effects.
pub struct ContextFilter {
    min_filtered: usize,
    vix_band: f64,
    vix_band_widened: f64,
}

/// Filter output plus whether the VIX band had to be widened to reach a
/// viable sample — surfaced in verdict reason strings.
pub struct FilterResult {
    pub records: Vec<ExperienceRecord>,
    pub widened: bool,
}

impl ContextFilter {
    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self {
            min_filtered: cfg.min_filtered,
            vix_band: cfg.vix_band,
            vix_band_widened: cfg.vix_band_widened,
        }
    }

    /// All hard filters must pass: same side and setup, same day-of-week
    /// class (unless the candidate spans both), VIX regime within band. If
    /// the result is too small to support a confidence estimate, the VIX
    /// band is widened exactly once before giving up — regime rarity alone
    /// should not starve the aggregator.
    pub fn apply(&self, candidate: &CandidateSignal, records: &[ExperienceRecord]) -> FilterResult {
        let narrow = self.pass(candidate, records, self.vix_band);
        if narrow.len() >= self.min_filtered || candidate.vix.is_none() {
            return FilterResult {
                records: narrow,
                widened: false,
            };
        }
        let widened = self.pass(candidate, records, self.vix_band_widened);
        FilterResult {
            records: widened,
            widened: true,
        }
    }

    fn pass(
        &self,
        candidate: &CandidateSignal,
        records: &[ExperienceRecord],
        vix_band: f64,
    ) -> Vec<ExperienceRecord> {
        records
            .iter()
            .filter(|r| r.side == candidate.side && r.setup == candidate.setup)
            .filter(|r| match candidate.day_scope {
                DayScope::Any => true,
                DayScope::SameClass => {
                    is_weekend(r.day_of_week) == is_weekend(candidate.day_of_week)
                }
            })
            .filter(|r| match (candidate.vix, r.vix) {
                (Some(cv), Some(rv)) => (cv - rv).abs() <= vix_band,
                // Unknown regime on either side is not evidence of mismatch;
                // the scorer gives such records zero VIX credit instead.
                _ => true,
            })
            .cloned()
            .collect()
    }
}
