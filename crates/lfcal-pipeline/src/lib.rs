//! Calibration records, persistence and multi-pass refinement sessions.
//!
//! A [`RefinementSession`] loads an initial calibration and the detected
//! corner features, runs one or more refinement passes and keeps an
//! operation log. Records are persisted through a [`CalibrationStore`];
//! [`JsonFileStore`] keeps them as pretty-printed JSON files.
//!
//! ```no_run
//! use lfcal_pipeline::{JsonFileStore, RefinementSession, SessionConfig};
//! # fn main() -> anyhow::Result<()> {
//! let store = JsonFileStore::new("CalInfo.json", "Features.json");
//! let mut session = RefinementSession::from_store(&store, SessionConfig::default())?;
//! session.run_passes()?;
//! session.save(&store)?;
//! # Ok(())
//! # }
//! ```

pub mod records;
pub mod session;
pub mod store;

pub use records::{CalibrationRecord, FeatureRecord, RefinementProvenance};
pub use session::{current_timestamp, LogEntry, RefinementSession, SessionConfig};
pub use store::{CalibrationStore, JsonFileStore};
