use crate::config::EngineConfig;
use crate::models::{CandidateSignal, ExperienceRecord};

const MINUTES_PER_DAY: f64 = 1440.0;

/// Weighted partial-credit similarity in [0, 1] between a candidate and one
/// historical record.
///
/// Each feature contributes `weight × credit` where credit is 1.0 inside the
/// tolerance window and decays linearly to 0.0 at twice the window. Additive
/// credit (rather than a hard AND of per-feature thresholds) lets a record
/// that is very close on three of four features still qualify, which keeps a
/// finite pool from going pathologically sparse. A feature missing on either
/// side contributes zero credit but never disqualifies the record outright.
pub fn similarity(cfg: &EngineConfig, candidate: &CandidateSignal, record: &ExperienceRecord) -> f64 {
    let rsi = feature_credit((candidate.rsi - record.rsi).abs(), cfg.rsi_tolerance);

    let tod = feature_credit(
        circular_minutes(candidate.minute_of_day(), record.minute_of_day()),
        cfg.time_of_day_tolerance_minutes,
    );

    let vwap = feature_credit(
        (candidate.vwap_distance - record.vwap_distance).abs(),
        cfg.vwap_tolerance,
    );

    let vix = match (candidate.vix, record.vix) {
        (Some(cv), Some(rv)) => feature_credit((cv - rv).abs(), cfg.vix_tolerance),
        _ => 0.0,
    };

    let total = cfg.rsi_weight * rsi
        + cfg.time_of_day_weight * tod
        + cfg.vwap_weight * vwap
        + cfg.vix_weight * vix;
    total.clamp(0.0, 1.0)
}

/// Qualifying matches: records whose total similarity clears the threshold,
/// paired with their score.
pub fn qualifying_matches(
    cfg: &EngineConfig,
    candidate: &CandidateSignal,
    records: Vec<ExperienceRecord>,
) -> Vec<(ExperienceRecord, f64)> {
    records
        .into_iter()
        .filter_map(|record| {
            let sim = similarity(cfg, candidate, &record);
            (sim >= cfg.match_threshold).then_some((record, sim))
        })
        .collect()
}

/// Full credit inside the tolerance window, linear decay to zero at 2×.
fn feature_credit(distance: f64, tolerance: f64) -> f64 {
    if tolerance <= 0.0 {
        return if distance == 0.0 { 1.0 } else { 0.0 };
    }
    if distance <= tolerance {
        1.0
    } else if distance >= 2.0 * tolerance {
        0.0
    } else {
        (2.0 * tolerance - distance) / tolerance
    }
}

/// Shortest distance around the 1440-minute clock, so 23:50 and 00:10 are
/// twenty minutes apart.
fn circular_minutes(a: f64, b: f64) -> f64 {
    let d = (a - b).abs();
    d.min(MINUTES_PER_DAY - d)
}
