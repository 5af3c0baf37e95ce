use chrono::{DateTime, Utc};

use crate::calibration::types::{Axis, CalibrationModel, CalibrationPoint};
use crate::errors::{PrecisionError, PrecisionResult};

/// Default relative spread under which sample ratios are considered to agree.
pub const DEFAULT_CONSISTENCY_TOLERANCE: f64 = 0.02;

/// Fitted parameters for one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisFit {
    scale: f64,
    offset: i32,
    spread: f64,
}

/// Fit `physical = logical * scale + offset` per axis from matched samples.
///
/// Scale is the median of the per-point `physical / logical` ratios; points
/// whose logical coordinate is zero on an axis are skipped for that axis only.
/// The result is always unverified. Samples that disagree by more than
/// `tolerance` still produce a model, flagged `consistent = false`.
pub fn estimate(
    points: &[CalibrationPoint],
    tolerance: f64,
    now: DateTime<Utc>,
) -> PrecisionResult<CalibrationModel> {
    if points.len() < 2 {
        return Err(PrecisionError::InsufficientSamples {
            provided: points.len(),
        });
    }

    let x = fit_axis(points, Axis::X)?;
    let y = fit_axis(points, Axis::Y)?;
    let consistent = x.spread < tolerance && y.spread < tolerance;

    if !consistent {
        tracing::warn!(
            spread_x = x.spread,
            spread_y = y.spread,
            tolerance,
            "calibration points disagree"
        );
    }
    tracing::info!(
        scale_x = x.scale,
        scale_y = y.scale,
        offset_x = x.offset,
        offset_y = y.offset,
        points = points.len(),
        "calibration estimated"
    );

    Ok(CalibrationModel {
        calibrated: true,
        scale_x: Some(round_to(x.scale, 6)),
        scale_y: Some(round_to(y.scale, 6)),
        offset_x: x.offset,
        offset_y: y.offset,
        points: points.to_vec(),
        consistent,
        spread_x: Some(round_to(x.spread, 4)),
        spread_y: Some(round_to(y.spread, 4)),
        calibrated_at: Some(now),
        verified: false,
        verified_at: None,
        verification_notes: None,
    })
}

fn fit_axis(points: &[CalibrationPoint], axis: Axis) -> PrecisionResult<AxisFit> {
    let usable: Vec<(f64, f64)> = points
        .iter()
        .map(|p| p.axis(axis))
        .filter(|&(_, logical)| logical != 0)
        .map(|(physical, logical)| (physical as f64, logical as f64))
        .collect();

    if usable.is_empty() {
        return Err(PrecisionError::DegenerateInput {
            axis,
            reason: format!(
                "all {} points have logical_{axis} == 0; \
                 pick landmarks away from the screen origin",
                points.len()
            ),
        });
    }

    let mut ratios: Vec<f64> = usable.iter().map(|&(p, l)| p / l).collect();
    let scale = median(&mut ratios);
    if !(scale.is_finite() && scale > 0.0) {
        return Err(PrecisionError::DegenerateInput {
            axis,
            reason: format!("median physical/logical ratio is {scale}, expected a positive scale"),
        });
    }

    // `ratios` is sorted by `median`.
    let spread = (ratios[ratios.len() - 1] - ratios[0]) / scale;

    // Expected to be ~0 under plain DPI scaling; absorbs rounding noise.
    let mut residuals: Vec<f64> = usable.iter().map(|&(p, l)| p - l * scale).collect();
    let offset = median(&mut residuals).round() as i32;

    Ok(AxisFit { scale, offset, spread })
}

/// Median of a non-empty slice; sorts it in place. Even lengths average the
/// two middle values.
fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
