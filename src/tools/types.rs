use serde::{Deserialize, Serialize};

use crate::calibration::types::{CalibrationPoint, CoordinateSpace};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    #[serde(rename = "type")]
    pub def_type: String,
    pub function: FunctionDef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// One request read by the stdio driver.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ToolReply {
    Ok { ok: bool, result: serde_json::Value },
    Err { ok: bool, error: String },
}

impl ToolReply {
    pub fn success(result: serde_json::Value) -> Self {
        ToolReply::Ok { ok: true, result }
    }

    pub fn failure(error: impl ToString) -> Self {
        ToolReply::Err {
            ok: false,
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalibrateArgs {
    pub points: Vec<CalibrationPoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyArgs {
    pub success: bool,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConvertArgs {
    pub x: i32,
    pub y: i32,
    pub from_system: CoordinateSpace,
    pub to_system: CoordinateSpace,
}
