use serde::{Deserialize, Serialize};

/// Immutable engine configuration. Every weight, tolerance, and threshold the
/// scoring pipeline uses lives here as a named field; the engine holds a copy
/// for its lifetime and nothing mutates it after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    // Context filter
    /// Minimum records surviving the hard filters before the VIX band is
    /// widened once.
    pub min_filtered: usize,
    /// VIX band around the candidate's VIX (absolute points).
    pub vix_band: f64,
    /// Widened VIX band used for the single retry.
    pub vix_band_widened: f64,

    // Similarity scorer (feature weights sum to 1.0)
    pub rsi_weight: f64,
    pub rsi_tolerance: f64,
    pub time_of_day_weight: f64,
    pub time_of_day_tolerance_minutes: f64,
    pub vwap_weight: f64,
    pub vwap_tolerance: f64,
    pub vix_weight: f64,
    pub vix_tolerance: f64,
    /// A record counts as a match only above this total similarity.
    pub match_threshold: f64,

    // Weighted aggregator
    /// Oldest retained match decays to this recency weight.
    pub recency_floor: f64,
    /// |pnl| scale for the bounded quality weight: 1 + |pnl|/(|pnl| + scale).
    pub quality_pnl_scale: f64,
    /// Sample size at which shrinkage toward the neutral prior fully releases.
    pub shrink_full_sample: usize,
    /// Neutral prior the win rate is shrunk toward on thin samples.
    pub neutral_prior: f64,
    /// Confidence never reported below this.
    pub min_confidence: f64,

    // Decision policy
    /// Take the trade iff confidence >= this. Supplied by the operator, not
    /// hardcoded in the pipeline.
    pub take_threshold: f64,

    // Pool retention
    /// Records older than this are pruned from the in-memory pool. The
    /// durable store keeps everything.
    pub retention_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_filtered: 5,
            vix_band: 5.0,
            vix_band_widened: 10.0,
            rsi_weight: 0.35,
            rsi_tolerance: 5.0,
            time_of_day_weight: 0.20,
            time_of_day_tolerance_minutes: 30.0,
            vwap_weight: 0.25,
            vwap_tolerance: 0.25,
            vix_weight: 0.20,
            vix_tolerance: 5.0,
            match_threshold: 0.60,
            recency_floor: 0.5,
            quality_pnl_scale: 50.0,
            shrink_full_sample: 10,
            neutral_prior: 0.5,
            min_confidence: 0.05,
            take_threshold: 0.60,
            retention_days: 180,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let env_f64 = |key: &str, default: f64| -> f64 {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };
        let env_usize = |key: &str, default: usize| -> usize {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };
        let env_i64 = |key: &str, default: i64| -> i64 {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };

        let d = Self::default();
        Self {
            min_filtered: env_usize("MIN_FILTERED", d.min_filtered),
            vix_band: env_f64("VIX_BAND", d.vix_band),
            vix_band_widened: env_f64("VIX_BAND_WIDENED", d.vix_band_widened),
            rsi_weight: env_f64("RSI_WEIGHT", d.rsi_weight),
            rsi_tolerance: env_f64("RSI_TOLERANCE", d.rsi_tolerance),
            time_of_day_weight: env_f64("TOD_WEIGHT", d.time_of_day_weight),
            time_of_day_tolerance_minutes: env_f64(
                "TOD_TOLERANCE_MINUTES",
                d.time_of_day_tolerance_minutes,
            ),
            vwap_weight: env_f64("VWAP_WEIGHT", d.vwap_weight),
            vwap_tolerance: env_f64("VWAP_TOLERANCE", d.vwap_tolerance),
            vix_weight: env_f64("VIX_WEIGHT", d.vix_weight),
            vix_tolerance: env_f64("VIX_TOLERANCE", d.vix_tolerance),
            match_threshold: env_f64("MATCH_THRESHOLD", d.match_threshold),
            recency_floor: env_f64("RECENCY_FLOOR", d.recency_floor),
            quality_pnl_scale: env_f64("QUALITY_PNL_SCALE", d.quality_pnl_scale),
            shrink_full_sample: env_usize("SHRINK_FULL_SAMPLE", d.shrink_full_sample),
            neutral_prior: env_f64("NEUTRAL_PRIOR", d.neutral_prior),
            min_confidence: env_f64("MIN_CONFIDENCE", d.min_confidence),
            take_threshold: env_f64("TAKE_THRESHOLD", d.take_threshold),
            retention_days: env_i64("RETENTION_DAYS", d.retention_days),
        }
    }
}
