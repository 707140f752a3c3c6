use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

/// Setup classification the signal source tags its signals with. Filtering is
/// exact on this category; a bounce never matches a breakout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetupKind {
    Bounce,
    Breakout,
    Reversal,
    Continuation,
}

impl fmt::Display for SetupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SetupKind::Bounce => "bounce",
            SetupKind::Breakout => "breakout",
            SetupKind::Reversal => "reversal",
            SetupKind::Continuation => "continuation",
        };
        write!(f, "{s}")
    }
}

/// Day-of-week matching scope for the context filter. `SameClass` keeps
/// weekday history for weekday signals and weekend history for weekend
/// signals; `Any` is for signals the caller says span both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DayScope {
    #[default]
    SameClass,
    Any,
}

/// The live signal under evaluation. Carries the same context fields an
/// experience record does, no outcome fields, and exists only for the
/// duration of one evaluation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSignal {
    pub symbol: String,
    pub signal_time: DateTime<Utc>,
    pub side: Direction,
    pub setup: SetupKind,
    pub rsi: f64,
    pub vwap_distance: f64,
    pub atr: f64,
    pub volume_ratio: f64,
    #[serde(default)]
    pub vix: Option<f64>,
    /// 0 = Monday .. 6 = Sunday (chrono `num_days_from_monday`).
    pub day_of_week: u8,
    pub hour_of_day: u8,
    #[serde(default)]
    pub day_scope: DayScope,
}

/// Saturday/Sunday vs the rest; used by the context filter's day bucket.
pub(crate) fn is_weekend(day_of_week: u8) -> bool {
    day_of_week >= 5
}

impl CandidateSignal {
    /// Minute within the trading day, taken from the signal timestamp so
    /// time-of-day similarity works at sub-hour resolution.
    pub fn minute_of_day(&self) -> f64 {
        (self.signal_time.hour() * 60 + self.signal_time.minute()) as f64
    }

    pub fn validate(&self) -> EngineResult<()> {
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
        for (name, v) in [
            ("rsi", self.rsi),
            ("vwap_distance", self.vwap_distance),
            ("atr", self.atr),
            ("volume_ratio", self.volume_ratio),
        ] {
            if !v.is_finite() {
                return Err(EngineError::Validation(format!("{name} is not finite")));
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
