use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which axis an error or metric refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => f.write_str("x"),
            Axis::Y => f.write_str("y"),
        }
    }
}

/// Coordinate space a point is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    /// Pixel coordinates consumed by pointer injection.
    Physical,
    /// DPI-scaled coordinates reported by window/cursor APIs.
    Logical,
}

/// One observed correspondence between physical and logical space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub physical_x: i32,
    pub physical_y: i32,
    pub logical_x: i32,
    pub logical_y: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl CalibrationPoint {
    pub fn new(physical: (i32, i32), logical: (i32, i32)) -> Self {
        Self {
            physical_x: physical.0,
            physical_y: physical.1,
            logical_x: logical.0,
            logical_y: logical.1,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// `(physical, logical)` on the given axis.
    pub fn axis(&self, axis: Axis) -> (i32, i32) {
        match axis {
            Axis::X => (self.physical_x, self.logical_x),
            Axis::Y => (self.physical_y, self.logical_y),
        }
    }
}

/// The persisted calibration record. One per installation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationModel {
    pub calibrated: bool,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
    #[serde(default)]
    pub offset_x: i32,
    #[serde(default)]
    pub offset_y: i32,
    #[serde(default)]
    pub points: Vec<CalibrationPoint>,
    #[serde(default = "default_consistent")]
    pub consistent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread_y: Option<f64>,
    #[serde(default)]
    pub calibrated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_notes: Option<String>,
}

fn default_consistent() -> bool {
    true
}

impl Default for CalibrationModel {
    fn default() -> Self {
        Self {
            calibrated: false,
            scale_x: None,
            scale_y: None,
            offset_x: 0,
            offset_y: 0,
            points: Vec::new(),
            consistent: true,
            spread_x: None,
            spread_y: None,
            calibrated_at: None,
            verified: false,
            verified_at: None,
            verification_notes: None,
        }
    }
}

impl CalibrationModel {
    /// Scales and offsets of a calibrated record, if both scales are present.
    pub fn geometry(&self) -> Option<Geometry> {
        if !self.calibrated {
            return None;
        }
        Some(Geometry {
            scale_x: self.scale_x?,
            scale_y: self.scale_y?,
            offset_x: self.offset_x,
            offset_y: self.offset_y,
        })
    }
}

/// The linear part of a calibrated model: `physical = logical * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub scale_x: f64,
    pub scale_y: f64,
    pub offset_x: i32,
    pub offset_y: i32,
}

/// Well-known screen features used to collect matched samples.
#[derive(Debug, Clone, Serialize)]
pub struct Landmark {
    pub name: &'static str,
    pub description: &'static str,
    pub region: &'static str,
}

pub const LANDMARKS: &[Landmark] = &[
    Landmark {
        name: "start_button",
        description: "Windows Start button (bottom-left corner of taskbar)",
        region: "bottom-left",
    },
    Landmark {
        name: "datetime",
        description: "Date/time display (bottom-right corner of taskbar)",
        region: "bottom-right",
    },
    Landmark {
        name: "minimize",
        description: "Minimize button of any open window \
                      (upper-right area, leftmost of min/max/close)",
        region: "upper-right",
    },
];
