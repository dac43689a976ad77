//! Core math and geometry primitives for light-field camera calibration.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec3`, `Mat5`, ...),
//! - the plenoptic camera model (5×5 intrinsic matrix + direction distortion)
//!   and pluggable ray models ([`ObsToRay`]),
//! - observation, target and pose containers,
//! - deterministic synthetic scenes for tests.
//!
//! Ray model:
//! `[s, t, u, v] = distortion(H · [i, j, k, l, 1])`, a ray through `(s, t, 0)`
//! along `(u, v, 1)` in the camera frame.

/// Linear algebra type aliases and geometric primitives.
pub mod math;
/// Camera model, ray models and recentering.
pub mod models;
/// Deterministic synthetic data.
pub mod synthetic;
/// Observation, target and pose containers.
pub mod types;

pub use math::*;
pub use models::*;
pub use types::*;
