pub mod aggregate;
pub mod filter;
pub mod pool;
pub mod similarity;

pub use aggregate::{Aggregation, ScoredMatch, WeightedAggregator};
pub use filter::{ContextFilter, FilterResult};
pub use pool::{ExperiencePool, PoolStats};

use std::sync::Arc;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::errors::EngineResult;
use crate::models::{CandidateSignal, ConfidenceReport, ExperienceRecord, RiskLevel, Verdict};
use crate::store::ExperienceStore;

/// Orchestrates one evaluation: filter -> score -> aggregate -> policy.
/// Stateless across calls; the pool is the only shared mutable resource.
///
/// Safety posture is reject-by-default: sparsity, an empty pool, or a failed
/// store load all produce a defined low-confidence skip verdict, never an
/// error and never a "take".
pub struct DecisionEngine {
    config: EngineConfig,
    pool: ExperiencePool,
    filter: ContextFilter,
    aggregator: WeightedAggregator,
}

struct Evaluation {
    aggregation: Aggregation,
    filtered: usize,
    widened: bool,
}

impl DecisionEngine {
    pub fn new(config: EngineConfig, store: Arc<dyn ExperienceStore>) -> Self {
        let pool = ExperiencePool::new(store, config.retention_days);
        let filter = ContextFilter::from_config(&config);
        let aggregator = WeightedAggregator::from_config(&config);
        Self {
            config,
            pool,
            filter,
            aggregator,
        }
    }

    /// Warm the pool from the durable store. Degrades to an empty pool on
    /// store failure; see `ExperiencePool::load`.
    pub async fn load(&self) {
        self.pool.load().await;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn pool_stats(&self) -> PoolStats {
        self.pool.stats().await
    }

    /// Full take/skip decision with risk classification.
    pub async fn should_take_signal(&self, candidate: &CandidateSignal) -> EngineResult<Verdict> {
        candidate.validate()?;
        let eval = self.evaluate(candidate).await;
        let take_trade = eval.aggregation.confidence >= self.config.take_threshold
            && eval.aggregation.sample_size > 0;
        let reason = self.reason(&eval);
        let risk_level = self.classify_risk(&eval.aggregation);

        debug!(
            symbol = %candidate.symbol,
            take = take_trade,
            confidence = eval.aggregation.confidence,
            sample = eval.aggregation.sample_size,
            risk = %risk_level,
            "signal evaluated"
        );

        Ok(Verdict {
            take_trade,
            confidence: eval.aggregation.confidence,
            win_rate: eval.aggregation.win_rate,
            sample_size: eval.aggregation.sample_size,
            avg_pnl: eval.aggregation.avg_pnl,
            reason,
            risk_level,
        })
    }

    /// Same pipeline, statistics-only shape for monitoring callers.
    pub async fn get_confidence(
        &self,
        candidate: &CandidateSignal,
    ) -> EngineResult<ConfidenceReport> {
        candidate.validate()?;
        let eval = self.evaluate(candidate).await;
        let should_take = eval.aggregation.confidence >= self.config.take_threshold
            && eval.aggregation.sample_size > 0;

        Ok(ConfidenceReport {
            confidence: eval.aggregation.confidence,
            win_rate: eval.aggregation.win_rate,
            sample_size: eval.aggregation.sample_size,
            avg_pnl: eval.aggregation.avg_pnl,
            reason: self.reason(&eval),
            should_take,
            action: if should_take { "take" } else { "skip" }.to_string(),
        })
    }

    /// Validate and append a new outcome to the pool and durable store.
    /// Persistence failures surface to the caller so outcomes are never
    /// silently dropped; once this returns Ok, every evaluation that starts
    /// afterwards sees the record.
    pub async fn record_outcome(&self, record: ExperienceRecord) -> EngineResult<u64> {
        let seq = self.pool.append(record).await?;
        info!(seq, "outcome recorded");
        Ok(seq)
    }

    async fn evaluate(&self, candidate: &CandidateSignal) -> Evaluation {
        let snapshot = self.pool.snapshot().await;
        let filtered = self.filter.apply(candidate, &snapshot);
        let filtered_count = filtered.records.len();
        let matches =
            similarity::qualifying_matches(&self.config, candidate, filtered.records);
        let aggregation = self.aggregator.aggregate(candidate.signal_time, matches);
        Evaluation {
            aggregation,
            filtered: filtered_count,
            widened: filtered.widened,
        }
    }

    fn reason(&self, eval: &Evaluation) -> String {
        let agg = &eval.aggregation;
        let mut reason = if agg.sample_size == 0 {
            if eval.filtered == 0 {
                "insufficient evidence: no historical records share this signal context"
                    .to_string()
            } else {
                format!(
                    "insufficient evidence: {} contextual records, none cleared the {:.2} similarity threshold",
                    eval.filtered, self.config.match_threshold
                )
            }
        } else if agg.shrunk {
            format!(
                "thin sample ({} matches): win rate {:.2} shrunk toward {:.2} prior",
                agg.sample_size, agg.win_rate, self.config.neutral_prior
            )
        } else if agg.win_rate >= self.config.neutral_prior {
            format!(
                "strong recency-weighted win rate {:.2} over {} similar signals",
                agg.win_rate, agg.sample_size
            )
        } else {
            format!(
                "similar signals historically underperformed: win rate {:.2} over {} matches",
                agg.win_rate, agg.sample_size
            )
        };
        if eval.widened {
            reason.push_str("; volatility band widened to reach a viable sample");
        }
        reason
    }

    /// Risk of the estimate itself: thin samples are High, large samples with
    /// a tight win-rate standard error are Low.
    fn classify_risk(&self, agg: &Aggregation) -> RiskLevel {
        if agg.sample_size < self.config.shrink_full_sample {
            RiskLevel::High
        } else if agg.sample_size >= 30 && agg.win_rate_std_error <= 0.09 {
            RiskLevel::Low
        } else {
            RiskLevel::Medium
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EngineError;
    use crate::store::MemoryStore;
    use crate::test_helpers::{base_candidate, skipped_record, taken_record};

    fn engine_with(records: Vec<ExperienceRecord>) -> DecisionEngine {
        let store = Arc::new(MemoryStore::with_records(records));
        DecisionEngine::new(EngineConfig::default(), store)
    }

    #[tokio::test]
    async fn empty_pool_gives_skip_verdict_not_error() {
        let engine = engine_with(Vec::new());
        engine.load().await;

        let verdict = engine.should_take_signal(&base_candidate()).await.unwrap();
        assert!(!verdict.take_trade);
        assert_eq!(verdict.sample_size, 0);
        assert_eq!(verdict.risk_level, RiskLevel::High);
        assert!(verdict.reason.contains("insufficient evidence"));
    }

    #[tokio::test]
    async fn strong_history_takes_the_trade() {
        let mut records = Vec::new();
        for i in 0..14 {
            records.push(taken_record(i, 40.0));
        }
        for i in 14..18 {
            records.push(taken_record(i, -40.0));
        }
        let engine = engine_with(records);
        engine.load().await;

        let verdict = engine.should_take_signal(&base_candidate()).await.unwrap();
        assert!(verdict.take_trade);
        assert_eq!(verdict.sample_size, 18);
        assert!(verdict.confidence > 0.5);
        assert!(verdict.win_rate > 0.7);
    }

    #[tokio::test]
    async fn malformed_candidate_is_rejected_before_scoring() {
        let engine = engine_with(Vec::new());
        let mut candidate = base_candidate();
        candidate.rsi = 130.0;
        let err = engine.should_take_signal(&candidate).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn get_confidence_mirrors_decision_as_action_string() {
        let records = (0..12).map(|i| taken_record(i, 25.0)).collect();
        let engine = engine_with(records);
        engine.load().await;

        let report = engine.get_confidence(&base_candidate()).await.unwrap();
        assert!(report.should_take);
        assert_eq!(report.action, "take");
        assert_eq!(report.sample_size, 12);
    }

    #[tokio::test]
    async fn recorded_outcome_is_visible_to_later_evaluations() {
        let engine = engine_with(Vec::new());
        engine.load().await;

        let before = engine.get_confidence(&base_candidate()).await.unwrap();
        assert_eq!(before.sample_size, 0);

        for i in 0..6 {
            engine.record_outcome(taken_record(i, 30.0)).await.unwrap();
        }
        let after = engine.get_confidence(&base_candidate()).await.unwrap();
        assert_eq!(after.sample_size, 6);
    }

    #[tokio::test]
    async fn skipped_history_pushes_toward_skip() {
        // Mostly skipped observations with a couple of losers: the hive
        // learned this context is not worth taking.
        let mut records: Vec<ExperienceRecord> = (0..10).map(skipped_record).collect();
        records.push(taken_record(10, -60.0));
        records.push(taken_record(11, -45.0));
        let engine = engine_with(records);
        engine.load().await;

        let verdict = engine.should_take_signal(&base_candidate()).await.unwrap();
        assert!(!verdict.take_trade);
        assert!(verdict.win_rate < 0.2);
    }
}
