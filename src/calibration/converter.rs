use crate::calibration::types::{Axis, CalibrationModel, CoordinateSpace, Geometry};
use crate::errors::{PrecisionError, PrecisionResult};

// All conversions round half away from zero (`f64::round`).

pub fn to_logical(
    model: &CalibrationModel,
    physical_x: i32,
    physical_y: i32,
) -> PrecisionResult<(i32, i32)> {
    let g = geometry(model)?;
    let lx = (physical_x as f64 - g.offset_x as f64) / g.scale_x;
    let ly = (physical_y as f64 - g.offset_y as f64) / g.scale_y;
    Ok((to_pixel(Axis::X, lx)?, to_pixel(Axis::Y, ly)?))
}

pub fn to_physical(
    model: &CalibrationModel,
    logical_x: i32,
    logical_y: i32,
) -> PrecisionResult<(i32, i32)> {
    let g = geometry(model)?;
    let px = logical_x as f64 * g.scale_x + g.offset_x as f64;
    let py = logical_y as f64 * g.scale_y + g.offset_y as f64;
    Ok((to_pixel(Axis::X, px)?, to_pixel(Axis::Y, py)?))
}

/// Round to the nearest integer coordinate, refusing values outside `i32`.
fn to_pixel(axis: Axis, value: f64) -> PrecisionResult<i32> {
    let rounded = value.round();
    if rounded.is_finite() && rounded >= i32::MIN as f64 && rounded <= i32::MAX as f64 {
        Ok(rounded as i32)
    } else {
        Err(PrecisionError::CoordinateOutOfRange { axis, value })
    }
}

/// Map `(x, y)` from one space to the other. Identity when the spaces match,
/// which holds even before calibration.
pub fn convert(
    model: &CalibrationModel,
    x: i32,
    y: i32,
    from: CoordinateSpace,
    to: CoordinateSpace,
) -> PrecisionResult<(i32, i32)> {
    match (from, to) {
        (CoordinateSpace::Physical, CoordinateSpace::Logical) => to_logical(model, x, y),
        (CoordinateSpace::Logical, CoordinateSpace::Physical) => to_physical(model, x, y),
        _ => Ok((x, y)),
    }
}

fn geometry(model: &CalibrationModel) -> PrecisionResult<Geometry> {
    model.geometry().ok_or(PrecisionError::NotCalibrated)
}
