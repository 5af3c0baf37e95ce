use chrono::{DateTime, Duration, Utc};

use crate::calibration::converter;
use crate::calibration::estimator::{self, DEFAULT_CONSISTENCY_TOLERANCE};
use crate::calibration::status::{self, StatusReport, DEFAULT_STALE_AFTER_DAYS};
use crate::calibration::store::{CalibrationStore, JsonFileStore};
use crate::calibration::types::{CalibrationModel, CalibrationPoint, CoordinateSpace};
use crate::config::CalibrationConfig;
use crate::errors::{PrecisionError, PrecisionResult};

/// Thresholds applied by estimation and status classification.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationPolicy {
    pub stale_after: Duration,
    pub consistency_tolerance: f64,
}

impl Default for CalibrationPolicy {
    fn default() -> Self {
        Self {
            stale_after: Duration::days(DEFAULT_STALE_AFTER_DAYS),
            consistency_tolerance: DEFAULT_CONSISTENCY_TOLERANCE,
        }
    }
}

impl TryFrom<&CalibrationConfig> for CalibrationPolicy {
    type Error = PrecisionError;

    fn try_from(cfg: &CalibrationConfig) -> PrecisionResult<Self> {
        Ok(Self {
            stale_after: cfg.stale_after()?,
            consistency_tolerance: cfg.consistency_tolerance,
        })
    }
}

/// Entry point for the four calibration operations. Every call reloads the
/// record from the store; nothing is cached between calls.
pub struct CalibrationEngine<S: CalibrationStore> {
    store: S,
    policy: CalibrationPolicy,
}

impl CalibrationEngine<JsonFileStore> {
    pub fn from_config(cfg: &CalibrationConfig) -> PrecisionResult<Self> {
        let policy = CalibrationPolicy::try_from(cfg)?;
        let path = cfg.resolve_state_file();
        tracing::info!(path = %path.display(), "calibration state file");
        Ok(Self::new(JsonFileStore::new(path), policy))
    }
}

impl<S: CalibrationStore> CalibrationEngine<S> {
    pub fn new(store: S, policy: CalibrationPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fit a new model and persist it, replacing the previous record.
    /// On error nothing is written.
    pub fn estimate(&self, points: &[CalibrationPoint]) -> PrecisionResult<CalibrationModel> {
        self.estimate_at(points, Utc::now())
    }

    pub fn estimate_at(
        &self,
        points: &[CalibrationPoint],
        now: DateTime<Utc>,
    ) -> PrecisionResult<CalibrationModel> {
        let model = estimator::estimate(points, self.policy.consistency_tolerance, now)?;
        self.store.save(&model)?;
        Ok(model)
    }

    pub fn convert(
        &self,
        x: i32,
        y: i32,
        from: CoordinateSpace,
        to: CoordinateSpace,
    ) -> PrecisionResult<(i32, i32)> {
        if from == to {
            return Ok((x, y));
        }
        let model = self.store.load()?;
        converter::convert(&model, x, y, from, to)
    }

    /// Record a verification attempt without touching the geometry.
    pub fn verify(&self, success: bool, notes: &str) -> PrecisionResult<CalibrationModel> {
        self.verify_at(success, notes, Utc::now())
    }

    pub fn verify_at(
        &self,
        success: bool,
        notes: &str,
        now: DateTime<Utc>,
    ) -> PrecisionResult<CalibrationModel> {
        let mut model = self.store.load()?;
        status::mark_verified(&mut model, success, notes, now);
        self.store.save(&model)?;
        tracing::info!(success, calibrated = model.calibrated, "calibration verification recorded");
        Ok(model)
    }

    pub fn status(&self) -> PrecisionResult<StatusReport> {
        self.status_at(Utc::now())
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> PrecisionResult<StatusReport> {
        let model = self.store.load()?;
        Ok(status::evaluate(&model, now, self.policy.stale_after))
    }

    /// The raw stored record.
    pub fn state(&self) -> PrecisionResult<CalibrationModel> {
        self.store.load()
    }
}
