use chrono::{DateTime, Utc};

use crate::config::EngineConfig;
use crate::models::ExperienceRecord;

/// One qualifying match with the weights the aggregator attached to it.
/// Lives only inside a single aggregation pass; never persisted.
#[derive(Debug, Clone)]
pub struct ScoredMatch {
    pub record: ExperienceRecord,
    pub similarity: f64,
    pub recency_weight: f64,
    pub quality_weight: f64,
}

impl ScoredMatch {
    pub fn combined_weight(&self) -> f64 {
        self.recency_weight * self.quality_weight
    }
}

/// Aggregate statistics over a match set.
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// Sample-size-adjusted win-probability estimate.
    pub confidence: f64,
    /// Raw recency- and quality-weighted win rate over the matched sample.
    pub win_rate: f64,
    pub sample_size: usize,
    /// Weighted mean P&L over taken matches (skipped matches have none).
    pub avg_pnl: f64,
    /// Standard error of the weighted win rate; feeds risk classification.
    pub win_rate_std_error: f64,
    /// True when the sample was thin enough to shrink toward the prior.
    pub shrunk: bool,
}

/// Turns qualifying matches into confidence statistics.
///
/// Recency decays linearly from 1.0 at the candidate's signal time down to a
/// floor at the retention horizon — regimes drift, so old confirmations keep
/// counting but not equally. Quality weight is a bounded monotone function of
/// |pnl|: decisive outcomes say more about the edge than near-breakeven ones,
/// and the bound keeps one outlier trade from dominating.
pub struct WeightedAggregator {
    recency_floor: f64,
    retention_days: i64,
    quality_pnl_scale: f64,
    shrink_full_sample: usize,
    neutral_prior: f64,
    min_confidence: f64,
}

impl WeightedAggregator {
    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self {
            recency_floor: cfg.recency_floor,
            retention_days: cfg.retention_days,
            quality_pnl_scale: cfg.quality_pnl_scale,
            shrink_full_sample: cfg.shrink_full_sample,
            neutral_prior: cfg.neutral_prior,
            min_confidence: cfg.min_confidence,
        }
    }

    /// `as_of` is the candidate's signal time, not wall-clock now: evaluation
    /// stays deterministic between appends, so repeated calls with the same
    /// candidate return identical results.
    pub fn aggregate(
        &self,
        as_of: DateTime<Utc>,
        matches: Vec<(ExperienceRecord, f64)>,
    ) -> Aggregation {
        if matches.is_empty() {
            return Aggregation {
                confidence: self.min_confidence,
                win_rate: 0.0,
                sample_size: 0,
                avg_pnl: 0.0,
                win_rate_std_error: 1.0,
                shrunk: true,
            };
        }

        let scored: Vec<ScoredMatch> = matches
            .into_iter()
            .map(|(record, similarity)| {
                let recency_weight = self.recency_weight(as_of, record.signal_time);
                let quality_weight = self.quality_weight(record.pnl);
                ScoredMatch {
                    record,
                    similarity,
                    recency_weight,
                    quality_weight,
                }
            })
            .collect();

        let total_weight: f64 = scored.iter().map(|m| m.combined_weight()).sum();
        let win_weight: f64 = scored
            .iter()
            .filter(|m| m.record.is_win())
            .map(|m| m.combined_weight())
            .sum();
        let win_rate = if total_weight > 0.0 {
            win_weight / total_weight
        } else {
            0.0
        };

        let taken_weight: f64 = scored
            .iter()
            .filter(|m| m.record.took_trade)
            .map(|m| m.combined_weight())
            .sum();
        let pnl_weighted: f64 = scored
            .iter()
            .filter_map(|m| m.record.pnl.map(|pnl| pnl * m.combined_weight()))
            .sum();
        let avg_pnl = if taken_weight > 0.0 {
            pnl_weighted / taken_weight
        } else {
            0.0
        };

        let sample_size = scored.len();
        let (confidence, shrunk) = self.shrink(win_rate, sample_size);

        let win_rate_std_error = (win_rate * (1.0 - win_rate) / sample_size as f64)
            .max(0.0)
            .sqrt();

        Aggregation {
            confidence: round4(confidence),
            win_rate: round4(win_rate),
            sample_size,
            avg_pnl: round4(avg_pnl),
            win_rate_std_error: round4(win_rate_std_error),
            shrunk,
        }
    }

    /// Linear decay from 1.0 at `as_of` to the floor at the retention
    /// horizon, clamped at the floor beyond it.
    fn recency_weight(&self, as_of: DateTime<Utc>, signal_time: DateTime<Utc>) -> f64 {
        let age_days = (as_of - signal_time).num_seconds().max(0) as f64 / 86_400.0;
        let horizon = self.retention_days.max(1) as f64;
        let fraction = (age_days / horizon).min(1.0);
        1.0 - fraction * (1.0 - self.recency_floor)
    }

    /// 1 + |pnl| / (|pnl| + scale): monotone in |pnl|, bounded in [1, 2).
    /// Skipped-signal matches (no pnl) sit at the baseline.
    fn quality_weight(&self, pnl: Option<f64>) -> f64 {
        match pnl {
            Some(pnl) => {
                let mag = pnl.abs();
                1.0 + mag / (mag + self.quality_pnl_scale)
            }
            None => 1.0,
        }
    }

    /// Shrink the raw win rate toward the neutral prior in proportion to how
    /// far the sample falls short of `shrink_full_sample`; floor the result
    /// so degraded verdicts still carry a defined confidence.
    fn shrink(&self, win_rate: f64, sample_size: usize) -> (f64, bool) {
        let release = (sample_size as f64 / self.shrink_full_sample.max(1) as f64).min(1.0);
        let confidence = self.neutral_prior + (win_rate - self.neutral_prior) * release;
        (
            confidence.clamp(self.min_confidence, 1.0),
            sample_size < self.shrink_full_sample,
        )
    }
}

fn round4(x: f64) -> f64 {
    (x * 10000.0).round() / 10000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{base_time, skipped_record, taken_record};

    fn aggregator() -> WeightedAggregator {
        WeightedAggregator::from_config(&EngineConfig::default())
    }

    fn with_sim(records: Vec<ExperienceRecord>) -> Vec<(ExperienceRecord, f64)> {
        records.into_iter().map(|r| (r, 0.9)).collect()
    }

    #[test]
    fn empty_matches_yield_floor_confidence_not_error() {
        let agg = aggregator().aggregate(base_time(), Vec::new());
        assert_eq!(agg.sample_size, 0);
        assert_eq!(agg.win_rate, 0.0);
        assert_eq!(agg.confidence, EngineConfig::default().min_confidence);
    }

    #[test]
    fn recency_decays_linearly_to_floor() {
        let a = aggregator();
        let now = base_time();
        assert_eq!(a.recency_weight(now, now), 1.0);
        let mid = now - chrono::Duration::days(90);
        assert!((a.recency_weight(now, mid) - 0.75).abs() < 1e-9);
        let old = now - chrono::Duration::days(400);
        assert_eq!(a.recency_weight(now, old), 0.5);
    }

    #[test]
    fn quality_weight_is_monotone_and_bounded() {
        let a = aggregator();
        let small = a.quality_weight(Some(1.0));
        let medium = a.quality_weight(Some(50.0));
        let large = a.quality_weight(Some(5000.0));
        assert!(small < medium && medium < large);
        assert!(large < 2.0);
        assert_eq!(a.quality_weight(None), 1.0);
        // Win and loss of equal magnitude weigh the same.
        assert_eq!(a.quality_weight(Some(-75.0)), a.quality_weight(Some(75.0)));
    }

    #[test]
    fn shrinkage_is_monotone_in_sample_size() {
        let a = aggregator();
        let (thin, thin_shrunk) = a.shrink(0.8, 3);
        let (full, full_shrunk) = a.shrink(0.8, 30);
        // Thin sample sits strictly closer to the 0.5 prior.
        assert!((thin - 0.5).abs() < (full - 0.5).abs());
        assert!(thin_shrunk);
        assert!(!full_shrunk);
        assert_eq!(full, 0.8);
    }

    #[test]
    fn equal_weight_sample_reduces_to_plain_win_rate() {
        // 18 matches, 14 wins, identical timestamps and |pnl| -> every
        // combined weight is equal, so the weighted win rate is 14/18.
        let mut records = Vec::new();
        for i in 0..14 {
            records.push(taken_record_at(i, 40.0));
        }
        for i in 14..18 {
            records.push(taken_record_at(i, -40.0));
        }
        let agg = aggregator().aggregate(base_time(), with_sim(records));
        assert_eq!(agg.sample_size, 18);
        assert!((agg.win_rate - 14.0 / 18.0).abs() < 1e-3);
        assert_eq!(agg.confidence, agg.win_rate);
        assert!(!agg.shrunk);
    }

    #[test]
    fn skipped_matches_dilute_win_rate_but_not_avg_pnl() {
        let records = vec![
            taken_record_at(0, 100.0),
            taken_record_at(1, 100.0),
            skipped_record(2),
            skipped_record(3),
        ];
        let agg = aggregator().aggregate(base_time(), with_sim(records));
        assert_eq!(agg.sample_size, 4);
        assert!(agg.win_rate < 1.0);
        // avg pnl over taken matches only
        assert!((agg.avg_pnl - 100.0).abs() < 1e-6);
    }

    #[test]
    fn bigger_magnitude_outcomes_pull_harder() {
        // One large loss vs one small win at equal recency: the loss should
        // pull the weighted win rate below the unweighted 0.5.
        let records = vec![taken_record_at(0, 2.0), taken_record_at(1, -200.0)];
        let agg = aggregator().aggregate(base_time(), with_sim(records));
        assert!(agg.win_rate < 0.5);
    }

    // Same context, identical timestamp, controlled pnl.
    fn taken_record_at(i: usize, pnl: f64) -> ExperienceRecord {
        let mut r = taken_record(i, pnl);
        r.signal_time = base_time();
        r
    }
}
