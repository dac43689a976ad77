//! Deterministic synthetic data generation helpers.
//!
//! Small building blocks for constructing synthetic light-field calibration
//! problems used in tests:
//! - a reference lenslet camera,
//! - pose generators that keep the target in view,
//! - exact corner observations for every sub-aperture image,
//! - deterministic pseudo-random noise.
//!
//! Everything is seeded explicitly and ordered stably.
//!
//! # Example
//!
//! ```no_run
//! use lfcal_core::{synthetic::lightfield, CalibrationTarget, FreeIntrinH, LfSize};
//!
//! let size = LfSize::new(5, 5, 100, 100);
//! let camera = lightfield::reference_camera(&size);
//! let target = CalibrationTarget::checkerboard(4, 3, 0.01);
//! let poses = lightfield::poses_facing_target(&target, 3, 0.3, 0.1, 0.1);
//! let obs = lightfield::observe_target(&FreeIntrinH, &camera, &size, &target, &poses).unwrap();
//! assert_eq!(obs.num_poses(), 3);
//! ```

pub mod lightfield;
pub mod noise;
