//! Serializable calibration and feature bundles.

use lfcal_core::{CalibrationTarget, CheckerObservations, LfCameraModel, LfSize, PoseSet};
use lfcal_optim::{ErrorStats, RefineOutput, RefinementPass};
use serde::{Deserialize, Serialize};

/// Camera model, per-image poses and refinement history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub camera: LfCameraModel,
    pub poses: PoseSet,
    pub lf_size: LfSize,
    /// Free-form information carried through unchanged.
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub refinement: Vec<RefinementProvenance>,
}

impl CalibrationRecord {
    pub fn new(camera: LfCameraModel, poses: PoseSet, lf_size: LfSize) -> Self {
        Self {
            camera,
            poses,
            lf_size,
            metadata: serde_json::Value::Null,
            refinement: Vec::new(),
        }
    }
}

/// Detected checkerboard corners and the target they belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub observations: CheckerObservations,
    pub target: CalibrationTarget,
    /// Corner grid `[cols, rows]` of a complete detection.
    pub expected_checker_size: [usize; 2],
}

/// Outcome of one refinement pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementProvenance {
    pub pass: RefinementPass,
    pub start: ErrorStats,
    pub finish: ErrorStats,
    pub evaluations: usize,
    pub converged: bool,
    pub termination: String,
    /// Unix timestamp (seconds) when the pass finished.
    pub timestamp: u64,
}

impl RefinementProvenance {
    pub fn new(pass: RefinementPass, output: &RefineOutput, timestamp: u64) -> Self {
        Self {
            pass,
            start: output.start,
            finish: output.finish,
            evaluations: output.report.evaluations,
            converged: output.report.converged,
            termination: output.report.termination.clone(),
            timestamp,
        }
    }
}
