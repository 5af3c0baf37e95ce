//! DPI calibration between physical (pointer-injection) and logical
//! (DPI-scaled) screen coordinates.
//!
//! Relationship per axis: `physical = logical * scale + offset`.

pub mod converter;
pub mod engine;
pub mod estimator;
pub mod status;
pub mod store;
pub mod types;

pub use engine::{CalibrationEngine, CalibrationPolicy};
pub use status::{CalibrationStatus, StatusReport};
pub use store::{CalibrationStore, JsonFileStore, MemoryStore};
pub use types::{Axis, CalibrationModel, CalibrationPoint, CoordinateSpace};
