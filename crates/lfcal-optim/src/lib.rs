//! Non-linear refinement of light-field camera calibrations.
//!
//! This crate provides:
//! - a flat-vector codec for named parameter blocks ([`codec`]),
//! - free-parameter selection and camera/pose transcoding ([`params`]),
//! - Jacobian sparsity and grouped finite differences ([`sparsity`],
//!   [`jacobian_fd`]),
//! - a bounded Levenberg-Marquardt backend ([`LmBackend`]),
//! - the point-to-ray refinement problem ([`problems::lf_refine`]).
//!
//! # Example
//!
//! ```no_run
//! use lfcal_core::{synthetic::lightfield, CalibrationTarget, FreeIntrinH, LfSize};
//! use lfcal_optim::{refine, LmBackend, RefineConfig, RefineInput};
//!
//! let lf_size = LfSize::new(5, 5, 100, 100);
//! let target = CalibrationTarget::checkerboard(4, 3, 0.01);
//! let camera = lightfield::reference_camera(&lf_size);
//! let poses = lightfield::poses_facing_target(&target, 3, 0.3, 0.1, 0.2);
//! let observations =
//!     lightfield::observe_target(&FreeIntrinH, &camera, &lf_size, &target, &poses).unwrap();
//!
//! let config = RefineConfig { lf_size, expected_checker_size: [4, 3], ..Default::default() };
//! let input = RefineInput { camera: &camera, poses: &poses, observations: &observations, target: &target };
//! let out = refine(&input, &config, FreeIntrinH, &LmBackend).unwrap();
//! println!("RMSE {} -> {}", out.start.rmse, out.finish.rmse);
//! ```

pub mod backend_lm;
pub mod codec;
pub mod error;
pub mod jacobian_fd;
pub mod params;
pub mod problems;
pub mod sparsity;
mod traits;

pub use crate::backend_lm::LmBackend;
pub use crate::error::{CodecError, RefineError};
pub use crate::params::RefinementPass;
pub use crate::problems::lf_refine::{
    refine, ErrorStats, RefineConfig, RefineInput, RefineOutput,
};
pub use crate::traits::{NllsProblem, NllsSolverBackend, SolveOptions, SolveReport};
