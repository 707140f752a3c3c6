use serde::{Deserialize, Serialize};
use std::fmt;

/// How trustworthy the confidence estimate itself is, judged from sample size
/// and win-rate variance. This is risk of the estimate, not of the trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        write!(f, "{s}")
    }
}

/// Full take/skip decision for one candidate signal. Produced fresh per call
/// and never cached — candidate features are continuous-valued, not
/// repeatable keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub take_trade: bool,
    pub confidence: f64,
    pub win_rate: f64,
    pub sample_size: usize,
    pub avg_pnl: f64,
    pub reason: String,
    pub risk_level: RiskLevel,
}

/// Informational variant of the same evaluation, for monitoring callers that
/// want the statistics plus the recommendation but no risk classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceReport {
    pub confidence: f64,
    pub win_rate: f64,
    pub sample_size: usize,
    pub avg_pnl: f64,
    pub reason: String,
    pub should_take: bool,
    /// "take" or "skip"; mirrors `should_take` for string-typed consumers.
    pub action: String,
}
