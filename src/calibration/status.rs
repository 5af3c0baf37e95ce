use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::calibration::types::CalibrationModel;

/// Default freshness window for a calibration.
pub const DEFAULT_STALE_AFTER_DAYS: i64 = 7;

/// Health of the stored calibration, derived fresh on every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationStatus {
    Missing,
    Stale,
    Unverified,
    Inconsistent,
    Ok,
}

impl CalibrationStatus {
    pub fn action_needed(self) -> bool {
        self != CalibrationStatus::Ok
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: CalibrationStatus,
    pub action_needed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    pub message: String,
}

/// Classify a record. Checks run in a fixed priority order:
/// missing, stale, unverified, inconsistent, ok. A record matching several
/// conditions reports the first one.
pub fn evaluate(
    model: &CalibrationModel,
    now: DateTime<Utc>,
    stale_after: Duration,
) -> StatusReport {
    if !model.calibrated {
        return report(
            CalibrationStatus::Missing,
            None,
            "No calibration data. Run the 'calibrate' tool.".to_string(),
        );
    }

    let scales = Some((model.scale_x, model.scale_y));

    // A calibrated record without a timestamp cannot be shown to be fresh.
    let age = model.calibrated_at.map(|at| now - at);
    match age {
        Some(age) if age <= stale_after => {}
        Some(age) => {
            return report(
                CalibrationStatus::Stale,
                scales,
                format!("Calibration is {} days old. Consider re-calibrating.", age.num_days()),
            );
        }
        None => {
            return report(
                CalibrationStatus::Stale,
                scales,
                "Calibration has no timestamp. Consider re-calibrating.".to_string(),
            );
        }
    }

    if !model.verified {
        return report(
            CalibrationStatus::Unverified,
            scales,
            "Calibration computed but not verified. Move the pointer to a known landmark \
             and call 'calibrate_verify' with the result."
                .to_string(),
        );
    }

    if !model.consistent {
        return report(
            CalibrationStatus::Inconsistent,
            scales,
            format!(
                "Calibration points disagree (spread: x={}, y={}). \
                 Re-calibrate with better points.",
                fmt_opt(model.spread_x),
                fmt_opt(model.spread_y)
            ),
        );
    }

    report(
        CalibrationStatus::Ok,
        scales,
        format!(
            "Calibration valid. Scale: {}x / {}y",
            fmt_opt(model.scale_x),
            fmt_opt(model.scale_y)
        ),
    )
}

/// Record the outcome of an empirical check. Geometry is left untouched; a
/// failed check stores `verified = false`.
pub fn mark_verified(
    model: &mut CalibrationModel,
    success: bool,
    notes: impl Into<String>,
    now: DateTime<Utc>,
) {
    model.verified = success;
    model.verification_notes = Some(notes.into());
    model.verified_at = Some(now);
}

fn report(
    status: CalibrationStatus,
    scales: Option<(Option<f64>, Option<f64>)>,
    message: String,
) -> StatusReport {
    let (scale_x, scale_y) = scales.unwrap_or((None, None));
    StatusReport {
        status,
        action_needed: status.action_needed(),
        scale_x,
        scale_y,
        message,
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "unknown".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> Duration {
        Duration::days(DEFAULT_STALE_AFTER_DAYS)
    }

    fn model(
        age: Duration,
        verified: bool,
        consistent: bool,
        now: DateTime<Utc>,
    ) -> CalibrationModel {
        CalibrationModel {
            calibrated: true,
            scale_x: Some(1.25),
            scale_y: Some(1.25),
            consistent,
            spread_x: Some(if consistent { 0.0 } else { 0.0392 }),
            spread_y: Some(0.0),
            calibrated_at: Some(now - age),
            verified,
            ..CalibrationModel::default()
        }
    }

    #[test]
    fn empty_record_is_missing() {
        let r = evaluate(&CalibrationModel::default(), Utc::now(), window());
        assert_eq!(r.status, CalibrationStatus::Missing);
        assert!(r.action_needed);
        assert!(r.scale_x.is_none());
    }

    #[test]
    fn fresh_unverified_consistent_is_unverified() {
        let now = Utc::now();
        let r = evaluate(&model(Duration::seconds(5), false, true, now), now, window());
        assert_eq!(r.status, CalibrationStatus::Unverified);
        assert!(r.action_needed);
        assert_eq!(r.scale_x, Some(1.25));
    }

    #[test]
    fn recently_verified_consistent_is_ok() {
        let now = Utc::now();
        let r = evaluate(&model(Duration::minutes(1), true, true, now), now, window());
        assert_eq!(r.status, CalibrationStatus::Ok);
        assert!(!r.action_needed);
        assert!(r.message.contains("1.25"));
    }

    #[test]
    fn eight_days_old_is_stale_whatever_the_flags() {
        let now = Utc::now();
        for verified in [true, false] {
            for consistent in [true, false] {
                let m = model(Duration::days(8), verified, consistent, now);
                let r = evaluate(&m, now, window());
                assert_eq!(r.status, CalibrationStatus::Stale);
                assert!(r.message.contains("8 days"));
            }
        }
    }

    #[test]
    fn exactly_seven_days_is_not_stale() {
        let now = Utc::now();
        let r = evaluate(&model(Duration::days(7), true, true, now), now, window());
        assert_eq!(r.status, CalibrationStatus::Ok);
    }

    #[test]
    fn unverified_wins_over_inconsistent() {
        let now = Utc::now();
        let r = evaluate(&model(Duration::hours(1), false, false, now), now, window());
        assert_eq!(r.status, CalibrationStatus::Unverified);
    }

    #[test]
    fn verified_but_inconsistent_reports_spread() {
        let now = Utc::now();
        let r = evaluate(&model(Duration::hours(1), true, false, now), now, window());
        assert_eq!(r.status, CalibrationStatus::Inconsistent);
        assert!(r.message.contains("x=0.0392"));
    }

    #[test]
    fn missing_timestamp_counts_as_stale() {
        let now = Utc::now();
        let mut m = model(Duration::zero(), true, true, now);
        m.calibrated_at = None;
        assert_eq!(evaluate(&m, now, window()).status, CalibrationStatus::Stale);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let now = Utc::now();
        let m = model(Duration::hours(2), true, true, now);
        assert_eq!(evaluate(&m, now, window()), evaluate(&m, now, window()));
    }

    #[test]
    fn failed_verification_leaves_geometry_and_stays_unverified() {
        let now = Utc::now();
        let mut m = model(Duration::hours(1), true, true, now);
        let before = m.geometry();
        mark_verified(&mut m, false, "cursor landed 12px left of minimize", now);
        assert!(!m.verified);
        assert_eq!(m.verified_at, Some(now));
        assert_eq!(m.verification_notes.as_deref(), Some("cursor landed 12px left of minimize"));
        assert_eq!(m.geometry(), before);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_value(CalibrationStatus::Inconsistent).unwrap();
        assert_eq!(json, "inconsistent");
    }
}
