use chrono::{DateTime, Datelike, Duration, Utc};

use hive_signal_engine::models::{
    CandidateSignal, DayScope, Direction, ExperienceRecord, SetupKind,
};

/// Reference instant: 14:30 UTC on the most recent Wednesday, so built
/// records sit inside the pool's retention horizon.
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

/// A taken trade matching the base candidate's context, `i` days older.
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

/// A skipped-signal observation matching the base candidate's context.
pub fn skipped_record(i: usize) -> ExperienceRecord {
    let mut r = taken_record(i, 0.0);
    r.took_trade = false;
    r.pnl = None;
    r.duration_secs = None;
    r.execution = None;
    r
}
