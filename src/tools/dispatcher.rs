use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::calibration::types::{CoordinateSpace, LANDMARKS};
use crate::calibration::{CalibrationEngine, CalibrationStore};
use crate::errors::{PrecisionError, PrecisionResult};
use crate::tools::definitions::load_builtin_tools;
use crate::tools::types::{CalibrateArgs, ConvertArgs, VerifyArgs};

pub const TOOL_NAMES: [&str; 7] = [
    "calibrate",
    "calibrate_verify",
    "get_calibration",
    "convert_coordinates",
    "calibration_status",
    "list_landmarks",
    "list_tools",
];

const NEXT_STEP: &str = "Calibration computed. To verify: move the pointer to a known landmark \
     (e.g. minimize button of a window), confirm the cursor landed correctly, then call \
     'calibrate_verify' with the result.";

/// Route a tool call to the calibration engine and shape its JSON reply.
pub fn dispatch<S: CalibrationStore>(
    engine: &CalibrationEngine<S>,
    name: &str,
    arguments: Value,
) -> PrecisionResult<Value> {
    tracing::debug!(tool = name, "dispatching tool call");
    match name {
        "calibrate" => {
            let args: CalibrateArgs = parse_args(name, arguments)?;
            let model = engine.estimate(&args.points)?;
            Ok(json!({
                "status": "calibrated",
                "scale_x": model.scale_x,
                "scale_y": model.scale_y,
                "offset_x": model.offset_x,
                "offset_y": model.offset_y,
                "consistent": model.consistent,
                "spread_x": model.spread_x,
                "spread_y": model.spread_y,
                "points_used": args.points.len(),
                "next_step": NEXT_STEP,
            }))
        }
        "calibrate_verify" => {
            let args: VerifyArgs = parse_args(name, arguments)?;
            let model = engine.verify(args.success, &args.notes)?;
            let status = if args.success { "verified" } else { "failed" };
            let mut message = format!("Calibration {status}.");
            if !args.notes.is_empty() {
                message.push_str(&format!(" Notes: {}", args.notes));
            }
            Ok(json!({
                "status": status,
                "message": message,
                "scale_x": model.scale_x,
                "scale_y": model.scale_y,
            }))
        }
        "get_calibration" => Ok(serde_json::to_value(engine.state()?)?),
        "convert_coordinates" => {
            let args: ConvertArgs = parse_args(name, arguments)?;
            let (x, y) = engine.convert(args.x, args.y, args.from_system, args.to_system)?;
            Ok(match (args.from_system, args.to_system) {
                (CoordinateSpace::Physical, CoordinateSpace::Logical) => json!({
                    "physical_x": args.x,
                    "physical_y": args.y,
                    "logical_x": x,
                    "logical_y": y,
                }),
                (CoordinateSpace::Logical, CoordinateSpace::Physical) => json!({
                    "logical_x": args.x,
                    "logical_y": args.y,
                    "physical_x": x,
                    "physical_y": y,
                }),
                _ => json!({ "x": x, "y": y, "note": "Same system, no conversion needed" }),
            })
        }
        "calibration_status" => Ok(serde_json::to_value(engine.status()?)?),
        "list_landmarks" => Ok(json!({ "landmarks": LANDMARKS })),
        "list_tools" => Ok(json!({ "tools": load_builtin_tools()? })),
        other => Err(PrecisionError::UnknownTool(other.to_string())),
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> PrecisionResult<T> {
    serde_json::from_value(arguments).map_err(|e| PrecisionError::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{CalibrationPolicy, MemoryStore};

    fn engine() -> CalibrationEngine<MemoryStore> {
        CalibrationEngine::new(MemoryStore::new(), CalibrationPolicy::default())
    }

    fn calibrate(e: &CalibrationEngine<MemoryStore>) -> Value {
        dispatch(
            e,
            "calibrate",
            json!({ "points": [
                {
                    "physical_x": 60, "physical_y": 2130,
                    "logical_x": 48, "logical_y": 1704,
                    "label": "start_button"
                },
                {
                    "physical_x": 2500, "physical_y": 2130,
                    "logical_x": 2000, "logical_y": 1704,
                    "label": "datetime"
                }
            ]}),
        )
        .unwrap()
    }

    #[test]
    fn calibrate_reports_model() {
        let e = engine();
        let reply = calibrate(&e);
        assert_eq!(reply["status"], "calibrated");
        assert_eq!(reply["scale_x"], 1.25);
        assert_eq!(reply["points_used"], 2);
        assert_eq!(reply["consistent"], true);
    }

    #[test]
    fn convert_reply_names_both_spaces() {
        let e = engine();
        calibrate(&e);
        let reply = dispatch(
            &e,
            "convert_coordinates",
            json!({ "x": 125, "y": 250, "from_system": "physical", "to_system": "logical" }),
        )
        .unwrap();
        assert_eq!(reply["logical_x"], 100);
        assert_eq!(reply["logical_y"], 200);
    }

    #[test]
    fn same_space_conversion_needs_no_calibration() {
        let reply = dispatch(
            &engine(),
            "convert_coordinates",
            json!({ "x": 5, "y": 6, "from_system": "logical", "to_system": "logical" }),
        )
        .unwrap();
        assert_eq!(reply["note"], "Same system, no conversion needed");
    }

    #[test]
    fn failed_verification_reply() {
        let e = engine();
        calibrate(&e);
        let reply = dispatch(
            &e,
            "calibrate_verify",
            json!({ "success": false, "notes": "missed" }),
        )
        .unwrap();
        assert_eq!(reply["status"], "failed");
        assert_eq!(reply["message"], "Calibration failed. Notes: missed");
        let status = dispatch(&e, "calibration_status", Value::Null).unwrap();
        assert_eq!(status["status"], "unverified");
        assert_eq!(status["action_needed"], true);
    }

    #[test]
    fn missing_status_omits_scales() {
        let status = dispatch(&engine(), "calibration_status", Value::Null).unwrap();
        assert_eq!(status["status"], "missing");
        assert!(status.get("scale_x").is_none());
    }

    #[test]
    fn bad_arguments_and_unknown_tools() {
        let e = engine();
        let err = dispatch(&e, "calibrate", json!({ "points": "nope" })).unwrap_err();
        assert!(matches!(err, PrecisionError::InvalidArguments { .. }));
        let err = dispatch(&e, "find_window", json!({})).unwrap_err();
        assert!(matches!(err, PrecisionError::UnknownTool(_)));
    }

    #[test]
    fn landmarks_are_listed() {
        let reply = dispatch(&engine(), "list_landmarks", Value::Null).unwrap();
        assert_eq!(reply["landmarks"][0]["name"], "start_button");
    }

    #[test]
    fn tool_schema_is_exposed() {
        let reply = dispatch(&engine(), "list_tools", Value::Null).unwrap();
        let names: Vec<&str> = reply["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["function"]["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, TOOL_NAMES);
        assert_eq!(
            reply["tools"][3]["function"]["parameters"]["required"],
            json!(["x", "y", "from_system", "to_system"])
        );
    }
}
