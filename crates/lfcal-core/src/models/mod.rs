//! Light-field camera model building blocks.
//!
//! A plenoptic camera is described by a 5×5 homogeneous intrinsic matrix `H`
//! mapping a sample index `[i, j, k, l, 1]` to a ray `[s, t, u, v, 1]`,
//! optionally followed by a radial distortion of the ray direction `(u, v)`:
//!
//! `ray = distortion(H · [i, j, k, l, 1])`
//!
//! The ray passes through `(s, t, 0)` with direction `(u, v, 1)` in the camera
//! frame. How observations become rays is pluggable through [`ObsToRay`].

mod camera;
mod config;
mod distortion;
mod intrinsics;
mod ray;

pub use camera::*;
pub use config::*;
pub use distortion::*;
pub use intrinsics::*;
pub use ray::*;
