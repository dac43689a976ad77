//! Loading and storing calibration records.

use crate::records::{CalibrationRecord, FeatureRecord};
use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Source of the initial calibration and features, and sink of the refined one.
pub trait CalibrationStore {
    fn load_calibration(&self) -> Result<CalibrationRecord>;
    fn load_features(&self) -> Result<FeatureRecord>;
    fn store_calibration(&self, record: &CalibrationRecord) -> Result<()>;
}

/// Records kept as JSON files; the refined calibration overwrites the input one.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    pub calibration_path: PathBuf,
    pub features_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(calibration_path: impl Into<PathBuf>, features_path: impl Into<PathBuf>) -> Self {
        Self {
            calibration_path: calibration_path.into(),
            features_path: features_path.into(),
        }
    }

    /// Write `features` to [`JsonFileStore::features_path`].
    pub fn store_features(&self, features: &FeatureRecord) -> Result<()> {
        write_json(&self.features_path, features)
    }
}

impl CalibrationStore for JsonFileStore {
    fn load_calibration(&self) -> Result<CalibrationRecord> {
        read_json(&self.calibration_path)
    }

    fn load_features(&self) -> Result<FeatureRecord> {
        read_json(&self.features_path)
    }

    fn store_calibration(&self, record: &CalibrationRecord) -> Result<()> {
        write_json(&self.calibration_path, record)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    log::debug!("wrote {}", path.display());
    Ok(())
}
