use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::calibration::types::CalibrationModel;
use crate::errors::{PrecisionError, PrecisionResult};

/// Durable storage for the single calibration record.
///
/// `load` never fails because no record exists yet; it returns the empty
/// default instead. `save` replaces the whole record so readers never see a
/// partial write. Load-then-save is not atomic as a pair.
pub trait CalibrationStore: Send + Sync {
    fn load(&self) -> PrecisionResult<CalibrationModel>;
    fn save(&self, model: &CalibrationModel) -> PrecisionResult<()>;
}

/// JSON document on the local filesystem.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, source: std::io::Error) -> PrecisionError {
        PrecisionError::StorageUnavailable {
            path: self.path.clone(),
            source,
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> PrecisionError {
        PrecisionError::MalformedRecord {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "calibration.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CalibrationStore for JsonFileStore {
    fn load(&self) -> PrecisionResult<CalibrationModel> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    path = %self.path.display(),
                    "no calibration record, using empty default"
                );
                return Ok(CalibrationModel::default());
            }
            Err(e) => return Err(self.unavailable(e)),
        };
        let model: CalibrationModel =
            serde_json::from_str(&content).map_err(|e| self.malformed(e.to_string()))?;
        validate(&model).map_err(|reason| self.malformed(reason))?;
        Ok(model)
    }

    fn save(&self, model: &CalibrationModel) -> PrecisionResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.unavailable(e))?;
            }
        }
        let json = serde_json::to_string_pretty(model)?;

        // Write a sibling file and rename it over the target so a concurrent
        // reader sees either the old record or the new one.
        let tmp = self.temp_path();
        let write = || -> std::io::Result<()> {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            std::fs::rename(&tmp, &self.path)
        };
        if let Err(e) = write() {
            let _ = std::fs::remove_file(&tmp);
            return Err(self.unavailable(e));
        }
        tracing::debug!(
            path = %self.path.display(),
            calibrated = model.calibrated,
            "calibration record saved"
        );
        Ok(())
    }
}

/// Process-local store, used when embedding the engine without a disk.
#[derive(Default)]
pub struct MemoryStore {
    record: Mutex<Option<CalibrationModel>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CalibrationStore for MemoryStore {
    fn load(&self) -> PrecisionResult<CalibrationModel> {
        let guard = self.record.lock().unwrap_or_else(|p| p.into_inner());
        Ok(guard.clone().unwrap_or_default())
    }

    fn save(&self, model: &CalibrationModel) -> PrecisionResult<()> {
        let mut guard = self.record.lock().unwrap_or_else(|p| p.into_inner());
        *guard = Some(model.clone());
        Ok(())
    }
}

/// Reject records whose geometry cannot be trusted.
fn validate(model: &CalibrationModel) -> Result<(), String> {
    if !model.calibrated {
        return Ok(());
    }
    for (axis, scale) in [("x", model.scale_x), ("y", model.scale_y)] {
        match scale {
            None => return Err(format!("calibrated record has no scale_{axis}")),
            Some(s) if !(s.is_finite() && s > 0.0) => {
                return Err(format!("scale_{axis} must be positive, got {s}"));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::types::CalibrationPoint;
    use tempfile::TempDir;

    fn calibrated_model() -> CalibrationModel {
        CalibrationModel {
            calibrated: true,
            scale_x: Some(1.5),
            scale_y: Some(1.5),
            points: vec![CalibrationPoint::new((150, 300), (100, 200)).with_label("minimize")],
            calibrated_at: Some(chrono::Utc::now()),
            ..CalibrationModel::default()
        }
    }

    #[test]
    fn missing_file_loads_empty_default() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("calibration.json"));
        assert_eq!(store.load().unwrap(), CalibrationModel::default());
    }

    #[test]
    fn save_creates_parent_dirs_and_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("nested").join("calibration.json");
        let store = JsonFileStore::new(path);
        let model = calibrated_model();
        store.save(&model).unwrap();
        assert_eq!(store.load().unwrap(), model);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn save_overwrites_previous_record() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("calibration.json"));
        store.save(&calibrated_model()).unwrap();
        let mut second = calibrated_model();
        second.scale_x = Some(2.0);
        store.save(&second).unwrap();
        assert_eq!(store.load().unwrap().scale_x, Some(2.0));
    }

    #[test]
    fn garbage_record_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("calibration.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, PrecisionError::MalformedRecord { .. }));
    }

    #[test]
    fn non_positive_scale_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("calibration.json");
        std::fs::write(
            &path,
            r#"{"calibrated": true, "scale_x": -1.0, "scale_y": 1.0, "calibrated_at": null}"#,
        )
        .unwrap();
        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("scale_x"));
    }

    #[test]
    fn calibrated_without_scale_is_malformed() {
        let mut model = calibrated_model();
        model.scale_y = None;
        assert!(validate(&model).unwrap_err().contains("scale_y"));
    }

    #[test]
    fn unreadable_location_is_storage_unavailable() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be.
        let path = dir.path().join("calibration.json");
        std::fs::create_dir_all(&path).unwrap();
        let err = JsonFileStore::new(&path).save(&calibrated_model()).unwrap_err();
        assert!(matches!(err, PrecisionError::StorageUnavailable { .. }));
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert!(!store.load().unwrap().calibrated);
        store.save(&calibrated_model()).unwrap();
        assert!(store.load().unwrap().calibrated);
    }
}
