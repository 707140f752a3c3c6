use chrono::{DateTime, Datelike, Duration, Utc};

use crate::models::{CandidateSignal, DayScope, Direction, ExperienceRecord, SetupKind};

/// Reference instant: 14:30 UTC on the most recent Wednesday. Kept close to
/// now so records built from it survive the pool's retention horizon.
pub fn base_time() -> DateTime<Utc> {
    let now = Utc::now();
    let days_back = (now.weekday().num_days_from_monday() as i64 + 7 - 2) % 7;
    (now - Duration::days(days_back))
        .date_naive()
        .and_hms_opt(14, 30, 0)
        .unwrap()
        .and_utc()
}

/// A long bounce candidate on the reference Wednesday afternoon.
pub fn base_candidate() -> CandidateSignal {
    CandidateSignal {
        symbol: "SPY".to_string(),
        signal_time: base_time(),
        side: Direction::Long,
        setup: SetupKind::Bounce,
        rsi: 55.0,
        vwap_distance: 0.8,
        atr: 1.2,
        volume_ratio: 1.5,
        vix: Some(19.0),
        day_of_week: 2,
        hour_of_day: 14,
        day_scope: DayScope::SameClass,
    }
}

/// A taken trade with the base candidate's context, `i` days older, with the
/// given pnl. Same minute-of-day so time-of-day similarity stays at full
/// credit.
pub fn taken_record(i: usize, pnl: f64) -> ExperienceRecord {
    let signal_time = base_time() - Duration::days(i as i64);
    ExperienceRecord {
        seq: 0,
        source: format!("client-{}", i % 7),
        symbol: "SPY".to_string(),
        signal_time,
        recorded_at: signal_time + Duration::minutes(45),
        side: Direction::Long,
        setup: SetupKind::Bounce,
        rsi: 55.0,
        vwap_distance: 0.8,
        atr: 1.2,
        volume_ratio: 1.5,
        vix: Some(19.0),
        day_of_week: 2,
        hour_of_day: 14,
        took_trade: true,
        pnl: Some(pnl),
        duration_secs: Some(1800.0),
        execution: None,
    }
}

/// A skipped-signal observation with the base candidate's context, `i` days
/// older. Carries no outcome fields, per the skipped-record invariant.
pub fn skipped_record(i: usize) -> ExperienceRecord {
    let mut r = taken_record(i, 0.0);
    r.took_trade = false;
    r.pnl = None;
    r.duration_secs = None;
    r.execution = None;
    r
}

/// A taken record sharing every context feature with `candidate`.
pub fn candidate_to_record(candidate: &CandidateSignal) -> ExperienceRecord {
    ExperienceRecord {
        seq: 0,
        source: "tester".to_string(),
        symbol: candidate.symbol.clone(),
        signal_time: candidate.signal_time,
        recorded_at: candidate.signal_time + Duration::minutes(45),
        side: candidate.side,
        setup: candidate.setup,
        rsi: candidate.rsi,
        vwap_distance: candidate.vwap_distance,
        atr: candidate.atr,
        volume_ratio: candidate.volume_ratio,
        vix: candidate.vix,
        day_of_week: candidate.day_of_week,
        hour_of_day: candidate.hour_of_day,
        took_trade: true,
        pnl: Some(10.0),
        duration_secs: Some(900.0),
        execution: None,
    }
}
