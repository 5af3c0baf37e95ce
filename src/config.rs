use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{PrecisionError, PrecisionResult};

/// Environment variable that overrides the calibration state file location.
pub const STATE_FILE_ENV: &str = "PRECISION_DESKTOP_STATE_FILE";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub calibration: CalibrationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Where the calibration record lives. Falls back to the per-user data dir.
    #[serde(default)]
    pub state_file: Option<PathBuf>,
    /// Calibrations older than this are reported stale.
    #[serde(default = "default_stale_after_days")]
    pub stale_after_days: i64,
    /// Maximum relative ratio spread per axis for a consistent calibration.
    #[serde(default = "default_consistency_tolerance")]
    pub consistency_tolerance: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            state_file: None,
            stale_after_days: default_stale_after_days(),
            consistency_tolerance: default_consistency_tolerance(),
        }
    }
}

fn default_stale_after_days() -> i64 {
    7
}

fn default_consistency_tolerance() -> f64 {
    0.02
}

impl CalibrationConfig {
    /// The staleness window, rejecting values chrono cannot represent.
    pub fn stale_after(&self) -> PrecisionResult<chrono::Duration> {
        if self.stale_after_days <= 0 {
            return Err(PrecisionError::Config(format!(
                "stale_after_days must be positive, got {}",
                self.stale_after_days
            )));
        }
        chrono::Duration::try_days(self.stale_after_days).ok_or_else(|| {
            PrecisionError::Config(format!(
                "stale_after_days is out of range, got {}",
                self.stale_after_days
            ))
        })
    }

    /// Resolve the state file: env override, then config, then the data dir.
    pub fn resolve_state_file(&self) -> PathBuf {
        if let Ok(path) = std::env::var(STATE_FILE_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }
        if let Some(path) = &self.state_file {
            return path.clone();
        }
        default_state_file()
    }
}

/// Returns `%LOCALAPPDATA%\PrecisionDesktop\state\calibration.json` on Windows,
/// `~/.local/share/PrecisionDesktop/state/calibration.json` on Linux,
/// falling back to `./state/calibration.json`.
pub fn default_state_file() -> PathBuf {
    let base = dirs::data_local_dir()
        .map(|d| d.join("PrecisionDesktop"))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("state").join("calibration.json")
}

fn resolve_config_path() -> PrecisionResult<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(candidate);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(candidate);
    }

    Err(PrecisionError::Config(
        "config.toml not found next to executable or in working directory".into(),
    ))
}

/// Load `config.toml`, or defaults when no config file exists.
pub fn load_config() -> PrecisionResult<AppConfig> {
    let path = match resolve_config_path() {
        Ok(path) => path,
        Err(PrecisionError::Config(msg)) => {
            tracing::info!(reason = %msg, "using default config");
            return Ok(AppConfig::default());
        }
        Err(e) => return Err(e),
    };
    let content = std::fs::read_to_string(&path)?;
    let config = parse_config(&content)?;
    tracing::info!(
        path = %path.display(),
        stale_after_days = config.calibration.stale_after_days,
        "config loaded"
    );
    Ok(config)
}

pub fn parse_config(content: &str) -> PrecisionResult<AppConfig> {
    let config: AppConfig = toml::from_str(content)?;
    let cal = &config.calibration;
    cal.stale_after()?;
    if !(cal.consistency_tolerance.is_finite() && cal.consistency_tolerance > 0.0) {
        return Err(PrecisionError::Config(format!(
            "consistency_tolerance must be a positive number, got {}",
            cal.consistency_tolerance
        )));
    }
    Ok(config)
}
