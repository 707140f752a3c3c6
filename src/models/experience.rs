use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::models::signal::{Direction, SetupKind};

/// Execution-quality detail, present only on taken trades (filled in at
/// trade close, immutable afterwards).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionQuality {
    pub order_type: String,
    pub entry_slippage: f64,
    pub partial_fill: bool,
    pub fill_ratio: f64,
    pub exit_reason: String,
    /// True when the trade ran to its natural target/stop rather than being
    /// cut short by a time limit.
    pub ran_to_completion: bool,
}

/// One historical trade-signal observation contributed to the shared pool.
/// Skipped signals (`took_trade = false`) are real observations too — they
/// teach the engine what not to take — and carry no outcome fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceRecord {
    /// Assigned by the pool cache at append time; 0 before assignment.
    #[serde(default)]
    pub seq: u64,

    // Identity
    /// Opaque caller/license tag from the identity layer.
    pub source: String,
    pub symbol: String,
    pub signal_time: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,

    // Signal context — set at write time, never mutated
    pub side: Direction,
    pub setup: SetupKind,
    pub rsi: f64,
    pub vwap_distance: f64,
    pub atr: f64,
    pub volume_ratio: f64,
    #[serde(default)]
    pub vix: Option<f64>,
    /// 0 = Monday .. 6 = Sunday.
    pub day_of_week: u8,
    pub hour_of_day: u8,

    // Outcome
    pub took_trade: bool,
    #[serde(default)]
    pub pnl: Option<f64>,
    #[serde(default)]
    pub duration_secs: Option<f64>,
    #[serde(default)]
    pub execution: Option<ExecutionQuality>,
}

impl ExperienceRecord {
    pub fn minute_of_day(&self) -> f64 {
        (self.signal_time.hour() * 60 + self.signal_time.minute()) as f64
    }

    pub fn is_win(&self) -> bool {
        self.took_trade && self.pnl.map(|p| p > 0.0).unwrap_or(false)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.source.trim().is_empty() {
            return Err(EngineError::Validation("source is empty".into()));
        }
        if self.symbol.trim().is_empty() {
            return Err(EngineError::Validation("symbol is empty".into()));
        }
        if !(0.0..=100.0).contains(&self.rsi) {
            return Err(EngineError::Validation(format!(
                "rsi {} outside [0, 100]",
                self.rsi
            )));
        }
        if self.day_of_week > 6 {
            return Err(EngineError::Validation(format!(
                "day_of_week {} outside 0-6",
                self.day_of_week
            )));
        }
        if self.hour_of_day > 23 {
            return Err(EngineError::Validation(format!(
                "hour_of_day {} outside 0-23",
                self.hour_of_day
            )));
        }
        if !self.took_trade {
            // Skipped-signal invariant: no outcome data of any kind.
            if self.pnl.is_some() {
                return Err(EngineError::Validation(
                    "skipped signal carries a pnl".into(),
                ));
            }
            if self.duration_secs.is_some() {
                return Err(EngineError::Validation(
                    "skipped signal carries a duration".into(),
                ));
            }
            if self.execution.is_some() {
                return Err(EngineError::Validation(
                    "skipped signal carries execution quality".into(),
                ));
            }
        }
        if let Some(pnl) = self.pnl {
            if !pnl.is_finite() {
                return Err(EngineError::Validation("pnl is not finite".into()));
            }
        }
        if let Some(vix) = self.vix {
            if !vix.is_finite() || vix < 0.0 {
                return Err(EngineError::Validation(format!("vix {vix} is invalid")));
            }
        }
        Ok(())
    }
}
