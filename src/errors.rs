use std::path::PathBuf;

use thiserror::Error;

use crate::calibration::types::Axis;

#[derive(Debug, Error)]
pub enum PrecisionError {
    #[error("Need at least 2 calibration points, got {provided}")]
    InsufficientSamples { provided: usize },

    #[error("Cannot compute {axis} scale: {reason}")]
    DegenerateInput { axis: Axis, reason: String },

    #[error("Not calibrated — run the 'calibrate' tool first")]
    NotCalibrated,

    #[error("Converted {axis} coordinate {value} does not fit in a 32-bit integer")]
    CoordinateOutOfRange { axis: Axis, value: f64 },

    #[error("Calibration storage unavailable at {}: {source}", path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed calibration record at {}: {reason}", path.display())]
    MalformedRecord { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl serde::Serialize for PrecisionError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

pub type PrecisionResult<T> = Result<T, PrecisionError>;
