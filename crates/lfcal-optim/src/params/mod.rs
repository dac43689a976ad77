//! Free-parameter selection and camera/pose transcoding.
//!
//! The optimization vector is the concatenation of three blocks:
//!
//! - [`POSES_BLOCK`]: N×6 pose matrix, one row per image (scope: that pose),
//! - [`INTRINSICS_BLOCK`]: the 8 free intrinsic entries (scope: shared),
//! - [`DISTORTION_BLOCK`]: 0 or 5 distortion coefficients (scope: shared).
//!
//! [`encode`] builds the vector, its layout, the per-parameter
//! [`ParamScope`] and the bounds; [`decode`] maps a vector back to poses and
//! a recentered camera model.

mod free_params;
mod transcode;

pub use free_params::{FreeParameters, RefinementPass};
pub use transcode::{
    decode, encode, EncodedModel, ModelCodec, ParamScope, DISTORTION_BLOCK, INTRINSICS_BLOCK,
    POSES_BLOCK,
};
