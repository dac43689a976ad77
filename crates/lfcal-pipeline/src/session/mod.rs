//! Multi-pass refinement session.
//!
//! A [`RefinementSession`] owns the calibration being refined and the
//! features it is refined against. Each pass replaces the camera and poses
//! with the refined ones and appends both a [`LogEntry`] and a
//! [`RefinementProvenance`] record.

mod types;

pub use types::{current_timestamp, LogEntry};

use anyhow::{Context, Result};
use lfcal_core::RayModel;
use lfcal_optim::{refine, LmBackend, RefineConfig, RefineInput, RefinementPass, SolveOptions};
use serde::{Deserialize, Serialize};

use crate::records::{CalibrationRecord, FeatureRecord, RefinementProvenance};
use crate::store::CalibrationStore;

/// Settings shared by all passes of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sub-apertures excluded at each edge of the `(i, j)` grid.
    pub border: usize,
    pub ray_model: RayModel,
    pub solve: SolveOptions,
    /// Passes run in order by [`RefinementSession::run_passes`].
    pub passes: Vec<RefinementPass>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            border: 1,
            ray_model: RayModel::default(),
            solve: SolveOptions::default(),
            passes: vec![RefinementPass::WithoutDistortion, RefinementPass::WithDistortion],
        }
    }
}

/// Calibration under refinement together with its features and history.
#[derive(Debug, Clone)]
pub struct RefinementSession {
    pub config: SessionConfig,
    features: FeatureRecord,
    calibration: CalibrationRecord,
    log: Vec<LogEntry>,
}

impl RefinementSession {
    pub fn new(
        calibration: CalibrationRecord,
        features: FeatureRecord,
        config: SessionConfig,
    ) -> Self {
        Self {
            config,
            features,
            calibration,
            log: Vec::new(),
        }
    }

    /// Load the calibration and features from `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if either record cannot be loaded.
    pub fn from_store(store: &impl CalibrationStore, config: SessionConfig) -> Result<Self> {
        let calibration = store
            .load_calibration()
            .context("loading initial calibration")?;
        let features = store.load_features().context("loading features")?;
        Ok(Self::new(calibration, features, config))
    }

    /// Run a single refinement pass and adopt its result.
    ///
    /// On failure the calibration is left untouched and a failure entry is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns the refinement error with the pass name as context.
    pub fn step_refine(&mut self, pass: RefinementPass) -> Result<()> {
        let operation = operation_name(pass);
        let config = RefineConfig {
            lf_size: self.calibration.lf_size,
            border: self.config.border,
            expected_checker_size: self.features.expected_checker_size,
            pass,
            solve: self.config.solve,
        };
        let input = RefineInput {
            camera: &self.calibration.camera,
            poses: &self.calibration.poses,
            observations: &self.features.observations,
            target: &self.features.target,
        };

        let output = match refine(&input, &config, self.config.ray_model.build(), &LmBackend) {
            Ok(output) => output,
            Err(err) => {
                log::error!("{operation} failed: {err}");
                self.log.push(LogEntry::failure(operation, err.to_string()));
                return Err(err).with_context(|| format!("{operation} failed"));
            }
        };

        self.log.push(LogEntry::success_with_notes(
            operation,
            format!(
                "RMSE {:.6e} -> {:.6e} ({} evaluations)",
                output.start.rmse, output.finish.rmse, output.report.evaluations
            ),
        ));
        self.calibration
            .refinement
            .push(RefinementProvenance::new(pass, &output, current_timestamp()));
        self.calibration.camera = output.camera;
        self.calibration.poses = output.poses;
        Ok(())
    }

    /// Run every configured pass in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing pass.
    pub fn run_passes(&mut self) -> Result<()> {
        let passes = self.config.passes.clone();
        for pass in passes {
            self.step_refine(pass)?;
        }
        Ok(())
    }

    /// Persist the current calibration.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the record.
    pub fn save(&self, store: &impl CalibrationStore) -> Result<()> {
        store
            .store_calibration(&self.calibration)
            .context("storing refined calibration")
    }

    pub fn calibration(&self) -> &CalibrationRecord {
        &self.calibration
    }

    pub fn features(&self) -> &FeatureRecord {
        &self.features
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }
}

fn operation_name(pass: RefinementPass) -> &'static str {
    match pass {
        RefinementPass::WithoutDistortion => "refine_without_distortion",
        RefinementPass::WithDistortion => "refine_with_distortion",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_runs_both_passes() {
        let config = SessionConfig::default();
        assert_eq!(config.border, 1);
        assert_eq!(
            config.passes,
            vec![RefinementPass::WithoutDistortion, RefinementPass::WithDistortion]
        );
    }

    #[test]
    fn partial_config_json_fills_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"passes":["with_distortion"]}"#).unwrap();
        assert_eq!(config.border, 1);
        assert_eq!(config.passes, vec![RefinementPass::WithDistortion]);
        assert_eq!(config.ray_model, RayModel::FreeIntrinH);
    }
}
